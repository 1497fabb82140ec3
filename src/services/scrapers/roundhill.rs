use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use tracing::info;

use super::{browser::PageRenderer, cell_text, selector, DistributionSource};
use crate::{services::errors::ScrapeError, storage::models::dividend::DividendRow};

const TABLE_CSS: &str = "table.distri-table";
const HEADINGS: [&str; 2] = ["Distribution History", "Weekly Distributions"];

pub struct Roundhill {
    renderer: Arc<dyn PageRenderer>,
}

impl Roundhill {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Roundhill { renderer }
    }
}

/// The distribution table is the first `table.distri-table` after the heading; fund pages
/// carry other tables with the same class.
pub fn parse_distribution_page(html: &str) -> Result<Vec<DividendRow>, ScrapeError> {
    let document = Html::parse_document(html);
    let heading_selector = selector("h3")?;
    let table_selector = selector(TABLE_CSS)?;

    let heading = HEADINGS
        .iter()
        .find_map(|title| {
            document
                .select(&heading_selector)
                .find(|heading| cell_text(*heading) == *title)
        })
        .ok_or_else(|| ScrapeError::Parse("no distribution heading".to_string()))?;

    let table = document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != heading.id())
        .filter_map(ElementRef::wrap)
        .find(|element| table_selector.matches(element))
        .ok_or_else(|| ScrapeError::Parse("no distribution table after heading".to_string()))?;

    let cell_selector = selector("td")?;
    let rows = table
        .select(&selector("tbody tr")?)
        .map(|row| row.select(&cell_selector).map(cell_text).collect::<Vec<_>>())
        // Declaration, Ex Date, Record Date, Pay Date, Amount Paid
        .filter(|cells| cells.len() == 5)
        .map(|cells| DividendRow {
            ex_date: Some(cells[1].clone()),
            amount: Some(cells[4].clone()),
            price_before: None,
            price_on_date: None,
        })
        .collect();

    Ok(rows)
}

#[async_trait]
impl DistributionSource for Roundhill {
    fn name(&self) -> &'static str {
        "roundhill"
    }

    async fn fetch_distributions(
        &self,
        symbol: &str,
        _since: Option<NaiveDate>,
    ) -> Result<Vec<DividendRow>, ScrapeError> {
        let url = format!(
            "https://www.roundhillinvestments.com/etf/{}/",
            symbol.to_lowercase()
        );
        info!("Scraping {} from {}", symbol.to_uppercase(), url);
        let html = self.renderer.render(symbol, &url, TABLE_CSS).await?;
        parse_distribution_page(&html)
    }
}
