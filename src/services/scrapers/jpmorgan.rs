use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::Html;
use tracing::{info, warn};

use super::{browser::PageRenderer, read_header_table, row_from_columns, DistributionSource};
use crate::{services::errors::ScrapeError, storage::models::dividend::DividendRow};

const TABLE_CSS: &str = "#card-component-dividendSchedule table";

// product pages are keyed by share class, not by ticker
const PRODUCT_PAGES: [(&str, &str); 1] = [(
    "JEPI",
    "https://am.jpmorgan.com/us/en/asset-management/adv/products/jpmorgan-equity-premium-income-etf-etf-shares-46641q332",
)];

pub struct JpMorgan {
    renderer: Arc<dyn PageRenderer>,
}

impl JpMorgan {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        JpMorgan { renderer }
    }
}

pub fn product_page(symbol: &str) -> Option<&'static str> {
    PRODUCT_PAGES
        .iter()
        .find(|(ticker, _)| ticker.eq_ignore_ascii_case(symbol.trim()))
        .map(|(_, url)| *url)
}

pub fn parse_dividend_schedule(html: &str) -> Result<Vec<DividendRow>, ScrapeError> {
    let document = Html::parse_document(html);
    let rows = read_header_table(&document, TABLE_CSS)?;
    Ok(rows.iter().map(|columns| row_from_columns(columns)).collect())
}

#[async_trait]
impl DistributionSource for JpMorgan {
    fn name(&self) -> &'static str {
        "jpmorgan"
    }

    async fn fetch_distributions(
        &self,
        symbol: &str,
        _since: Option<NaiveDate>,
    ) -> Result<Vec<DividendRow>, ScrapeError> {
        let Some(page) = product_page(symbol) else {
            warn!("No JPMorgan product page known for {}", symbol);
            return Err(ScrapeError::Fetch(format!(
                "no JPMorgan product page for {}",
                symbol
            )));
        };
        let url = format!("{}#/dividends", page);
        info!("Scraping {} from {}", symbol.to_uppercase(), url);
        let html = self.renderer.render(symbol, &url, TABLE_CSS).await?;
        parse_dividend_schedule(&html)
    }
}
