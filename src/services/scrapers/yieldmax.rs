use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::Html;
use tracing::info;

use super::{browser::PageRenderer, read_header_table, row_from_columns, DistributionSource};
use crate::{services::errors::ScrapeError, storage::models::dividend::DividendRow};

const TABLE_CSS: &str = "#table_11";

pub struct YieldMax {
    renderer: Arc<dyn PageRenderer>,
}

impl YieldMax {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        YieldMax { renderer }
    }
}

pub fn parse_distribution_page(html: &str) -> Result<Vec<DividendRow>, ScrapeError> {
    let document = Html::parse_document(html);
    let rows = read_header_table(&document, TABLE_CSS)?;
    Ok(rows.iter().map(|columns| row_from_columns(columns)).collect())
}

#[async_trait]
impl DistributionSource for YieldMax {
    fn name(&self) -> &'static str {
        "yieldmax"
    }

    async fn fetch_distributions(
        &self,
        symbol: &str,
        _since: Option<NaiveDate>,
    ) -> Result<Vec<DividendRow>, ScrapeError> {
        let url = format!(
            "https://www.yieldmaxetfs.com/our-etfs/{}/",
            symbol.to_lowercase()
        );
        info!("Scraping {} from {}", symbol.to_uppercase(), url);
        let html = self.renderer.render(symbol, &url, TABLE_CSS).await?;
        parse_distribution_page(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_distribution_rows_by_header() {
        let page = r#"
            <table id="table_11">
              <thead><tr><th>Distribution per Share</th><th>Declared Date</th><th>Ex Date</th><th>Record Date</th><th>Payable Date</th></tr></thead>
              <tbody>
                <tr><td>$0.4420</td><td>01/03/2024</td><td>01/04/2024</td><td>01/04/2024</td><td>01/05/2024</td></tr>
                <tr><td></td></tr>
              </tbody>
            </table>"#;
        let rows = parse_distribution_page(page).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ex_date.as_deref(), Some("01/04/2024"));
        assert_eq!(rows[0].amount.as_deref(), Some("$0.4420"));
    }

    #[test]
    fn page_without_table_fails() {
        assert!(parse_distribution_page("<div>Loading…</div>").is_err());
    }
}
