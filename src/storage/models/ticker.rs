use serde::{Deserialize, Serialize};

use super::dividend::{DividendRecord, DividendRow};

/// Issuer and market snapshot, already formatted for display at fetch time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TickerInfo {
    #[serde(alias = "Symbol")]
    pub symbol: String,
    #[serde(alias = "name", alias = "Name")]
    pub long_name: String,
    #[serde(alias = "Company")]
    pub company: String,
    #[serde(alias = "Frequency")]
    pub frequency: String,
    #[serde(alias = "Group")]
    pub group: String,
    #[serde(alias = "Update", alias = "updated")]
    pub last_updated: String,
    #[serde(rename = "fiftyTwoWeekRange", alias = "52Week")]
    pub fifty_two_week_range: String,
    #[serde(alias = "Volume")]
    pub volume: String,
    #[serde(alias = "AvgVolume")]
    pub average_volume: String,
    #[serde(alias = "NAV")]
    pub nav: String,
    #[serde(rename = "yield", alias = "Yield")]
    pub trailing_yield: String,
    #[serde(alias = "YTD")]
    pub ytd_return: String,
}

/// What a ticker file holds when read back, with history rows left unvalidated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredTickerRecord {
    pub ticker_info: Option<TickerInfo>,
    #[serde(alias = "dividends", alias = "history")]
    pub dividend_history: Vec<DividendRow>,
}

/// The canonical per-ticker file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerRecord {
    pub ticker_info: Option<TickerInfo>,
    pub dividend_history: Vec<DividendRecord>,
}
