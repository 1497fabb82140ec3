pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::errors::ScrapeError;

/// Raw market statistics for one ticker. Formatting for display happens when the
/// `TickerInfo` snapshot is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSnapshot {
    pub long_name: Option<String>,
    pub fifty_two_week_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub volume: Option<u64>,
    pub average_volume: Option<u64>,
    pub nav: Option<f64>,
    pub trailing_yield: Option<f64>,
    pub ytd_return: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividendEvent {
    pub ex_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: Decimal,
}

#[async_trait]
pub trait FinancialDataProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, ScrapeError>;

    /// Dividend events with an ex-date on or after `since`, or the full history.
    async fn fetch_dividends(
        &self,
        symbol: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DividendEvent>, ScrapeError>;

    /// Daily closes between `from` and `to`, both inclusive, oldest first.
    async fn fetch_closing_prices(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyClose>, ScrapeError>;
}
