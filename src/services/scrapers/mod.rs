pub mod browser;
pub mod jpmorgan;
pub mod roundhill;
pub mod yieldmax;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::{
    services::{errors::ScrapeError, market_data::FinancialDataProvider},
    storage::models::{
        dividend::{DividendRecord, DividendRow},
        nav::SourceKind,
    },
};
use browser::PageRenderer;

/// Anything that can list a ticker's distributions in the normalized row shape.
#[async_trait]
pub trait DistributionSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// `since` is a hint; sources that can only return the full table ignore it.
    async fn fetch_distributions(
        &self,
        symbol: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DividendRow>, ScrapeError>;
}

pub struct YahooDistributions {
    provider: Arc<dyn FinancialDataProvider>,
}

impl YahooDistributions {
    pub fn new(provider: Arc<dyn FinancialDataProvider>) -> Self {
        YahooDistributions { provider }
    }
}

#[async_trait]
impl DistributionSource for YahooDistributions {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_distributions(
        &self,
        symbol: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DividendRow>, ScrapeError> {
        let events = self.provider.fetch_dividends(symbol, since).await?;
        Ok(events
            .into_iter()
            .map(|event| {
                DividendRow::from(DividendRecord {
                    ex_date: event.ex_date,
                    amount: event.amount,
                    price_before: None,
                    price_on_date: None,
                })
            })
            .collect())
    }
}

/// One source per kind, shared across all tickers of a run.
pub struct SourceRegistry {
    yahoo: YahooDistributions,
    roundhill: roundhill::Roundhill,
    yieldmax: yieldmax::YieldMax,
    jpmorgan: jpmorgan::JpMorgan,
}

impl SourceRegistry {
    pub fn new(
        provider: Arc<dyn FinancialDataProvider>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        SourceRegistry {
            yahoo: YahooDistributions::new(provider),
            roundhill: roundhill::Roundhill::new(renderer.clone()),
            yieldmax: yieldmax::YieldMax::new(renderer.clone()),
            jpmorgan: jpmorgan::JpMorgan::new(renderer),
        }
    }

    pub fn source_for(&self, kind: SourceKind) -> &dyn DistributionSource {
        match kind {
            SourceKind::Yahoo => &self.yahoo,
            SourceKind::Roundhill => &self.roundhill,
            SourceKind::Yieldmax => &self.yieldmax,
            SourceKind::Jpmorgan => &self.jpmorgan,
        }
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::Parse(format!("invalid selector '{}': {}", css, e)))
}

pub(crate) fn cell_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads a table with a header row into (header, cells) pairs per body row. Rows whose cell
/// count doesn't match the header are dropped.
pub(crate) fn read_header_table(
    document: &Html,
    table_css: &str,
) -> Result<Vec<Vec<(String, String)>>, ScrapeError> {
    let table = document
        .select(&selector(table_css)?)
        .next()
        .ok_or_else(|| ScrapeError::Parse(format!("no table matching '{}'", table_css)))?;

    let headers: Vec<String> = table.select(&selector("thead tr th")?).map(cell_text).collect();
    if headers.is_empty() {
        return Err(ScrapeError::Parse(format!("table '{}' has no header", table_css)));
    }

    let cell_selector = selector("td")?;
    let rows = table
        .select(&selector("tbody tr")?)
        .map(|row| row.select(&cell_selector).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| cells.len() == headers.len())
        .map(|cells| headers.iter().cloned().zip(cells).collect())
        .collect();

    Ok(rows)
}

fn is_ex_date_header(header: &str) -> bool {
    let header = header.to_lowercase();
    header.starts_with("ex") && header.contains("date")
}

fn is_amount_header(header: &str) -> bool {
    let header = header.to_lowercase();
    !header.contains("date")
        && ["amount", "per share", "distribution", "dividend", "rate"]
            .iter()
            .any(|needle| header.contains(needle))
}

/// Picks the ex-date and amount columns out of a header-keyed row.
pub(crate) fn row_from_columns(columns: &[(String, String)]) -> DividendRow {
    let find = |predicate: fn(&str) -> bool| {
        columns
            .iter()
            .find(|(header, _)| predicate(header))
            .map(|(_, value)| value.clone())
    };

    DividendRow {
        ex_date: find(is_ex_date_header),
        amount: find(is_amount_header),
        price_before: None,
        price_on_date: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        <table id="dist">
          <thead><tr><th>Ex-Dividend Date</th><th>Record Date</th><th>Pay Date</th><th>Distribution per Share</th></tr></thead>
          <tbody>
            <tr><td>01/05/2024</td><td>01/05/2024</td><td>01/08/2024</td><td> $0.1500 </td></tr>
            <tr><td colspan="4">No further distributions</td></tr>
            <tr><td>12/29/2023</td><td>12/29/2023</td><td>01/02/2024</td><td>$0.1420</td></tr>
          </tbody>
        </table>"#;

    #[test]
    fn header_tables_zip_headers_with_cells() {
        let document = Html::parse_document(TABLE);
        let rows = read_header_table(&document, "#dist").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][3], ("Distribution per Share".to_string(), "$0.1500".to_string()));
    }

    #[test]
    fn columns_are_found_by_header_name() {
        let document = Html::parse_document(TABLE);
        let rows = read_header_table(&document, "#dist").unwrap();
        let row = row_from_columns(&rows[1]);

        assert_eq!(row.ex_date.as_deref(), Some("12/29/2023"));
        assert_eq!(row.amount.as_deref(), Some("$0.1420"));
        assert_eq!(row.price_before, None);
    }

    #[test]
    fn missing_table_is_a_parse_error() {
        let document = Html::parse_document("<p>maintenance</p>");
        assert!(matches!(
            read_header_table(&document, "#dist"),
            Err(ScrapeError::Parse(_))
        ));
    }
}
