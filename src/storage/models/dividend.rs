use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::services::{
    errors::ScrapeError,
    parsers::{
        format_amount, format_ex_date, format_optional_price, parse_amount, parse_ex_date,
        parse_optional_price,
    },
};

/// A dividend row as it appears on disk or on a scraped page, before validation.
///
/// Every field is optional and kept as text so a single bad row never prevents the rest of
/// a history from loading. Older ticker files used the issuer's column names and carried an
/// internal `timestamp`, both of which are still accepted here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendRow {
    #[serde(
        default,
        alias = "Ex Date",
        alias = "Ex-Date",
        alias = "ex_date",
        deserialize_with = "lenient_string"
    )]
    pub ex_date: Option<String>,
    #[serde(
        default,
        alias = "Amount Paid",
        alias = "Amount",
        alias = "dividend",
        deserialize_with = "lenient_string"
    )]
    pub amount: Option<String>,
    #[serde(default, alias = "price_before", deserialize_with = "lenient_string")]
    pub price_before: Option<String>,
    #[serde(default, alias = "price_on_date", deserialize_with = "lenient_string")]
    pub price_on_date: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    })
}

/// One distribution event. Prices are `None` until a close could be looked up; on disk that
/// is written as `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DividendRow", into = "DividendRow")]
pub struct DividendRecord {
    pub ex_date: NaiveDate,
    pub amount: Decimal,
    pub price_before: Option<Decimal>,
    pub price_on_date: Option<Decimal>,
}

impl DividendRecord {
    pub fn is_priced(&self) -> bool {
        self.price_before.is_some() && self.price_on_date.is_some()
    }
}

/// Unreadable price text is treated as a missing price so the record survives and can be
/// priced again later.
fn lenient_price(ex_date: NaiveDate, field: &str, raw: Option<&str>) -> Option<Decimal> {
    parse_optional_price(raw).unwrap_or_else(|e| {
        warn!("Unreadable {} on {}: {}", field, ex_date, e);
        None
    })
}

impl TryFrom<&DividendRow> for DividendRecord {
    type Error = ScrapeError;

    fn try_from(row: &DividendRow) -> Result<Self, Self::Error> {
        let ex_date = match row.ex_date.as_deref() {
            Some(raw) => parse_ex_date(raw)?,
            None => return Err(ScrapeError::Format("row has no ex-date".to_string())),
        };
        let amount = match row.amount.as_deref() {
            Some(raw) => parse_amount(raw)?,
            None => return Err(ScrapeError::Format("row has no amount".to_string())),
        };

        Ok(DividendRecord {
            ex_date,
            amount,
            price_before: lenient_price(ex_date, "priceBefore", row.price_before.as_deref()),
            price_on_date: lenient_price(ex_date, "priceOnDate", row.price_on_date.as_deref()),
        })
    }
}

impl TryFrom<DividendRow> for DividendRecord {
    type Error = ScrapeError;

    fn try_from(row: DividendRow) -> Result<Self, Self::Error> {
        DividendRecord::try_from(&row)
    }
}

impl From<DividendRecord> for DividendRow {
    fn from(record: DividendRecord) -> Self {
        DividendRow::from(&record)
    }
}

impl From<&DividendRecord> for DividendRow {
    fn from(record: &DividendRecord) -> Self {
        DividendRow {
            ex_date: Some(format_ex_date(record.ex_date)),
            amount: Some(format_amount(record.amount)),
            price_before: Some(format_optional_price(record.price_before)),
            price_on_date: Some(format_optional_price(record.price_on_date)),
        }
    }
}
