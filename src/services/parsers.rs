use std::{str::FromStr, sync::LazyLock};

use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};
use regex::Regex;
use rust_decimal::{prelude::FromPrimitive, Decimal};

use super::{
    errors::ScrapeError,
    shared::{constants::NOT_AVAILABLE, round_to_decimals},
};

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.\-]").expect("static regex is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex is valid"));

const EX_DATE_FORMAT: &str = "%y. %m. %d";

pub fn format_ex_date(date: NaiveDate) -> String {
    date.format(EX_DATE_FORMAT).to_string()
}

/// Parses every ex-date spelling that has ended up in ticker files over time:
/// `24. 01. 05`, `24. 01. 05.`, `24.01.05`, `2024. 1. 5.`, `2024-01-05`,
/// `2024-01-05T00:00:00`, `01/05/2024`, `Jan 5, 2024` and `January 5, 2024`.
pub fn parse_ex_date(raw: &str) -> Result<NaiveDate, ScrapeError> {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let trimmed = collapsed.trim_end_matches('.').trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        return Err(ScrapeError::Format(format!("missing ex-date '{}'", raw)));
    }

    let normalized = trimmed.replace(". ", ".");
    let date_part = match normalized.split_once('T') {
        Some((date, _)) if date.len() == 10 => date,
        _ => normalized.as_str(),
    };

    // two digit years first, %Y happily reads "24" as the year 24
    let formats = [
        "%y.%m.%d", "%Y.%m.%d", "%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y",
        "%d %b %Y",
    ];
    for format in formats.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            if date.year() >= 1970 {
                return Ok(date);
            }
        }
    }
    Err(ScrapeError::Format(format!("unable to parse ex-date '{}'", raw)))
}

fn parse_money(raw: &str) -> Result<Decimal, ScrapeError> {
    let cleaned = NON_NUMERIC.replace_all(raw.trim(), "");
    Decimal::from_str(&cleaned)
        .map_err(|_| ScrapeError::Format(format!("unable to parse amount '{}'", raw)))
}

pub fn parse_amount(raw: &str) -> Result<Decimal, ScrapeError> {
    let amount = parse_money(raw)?;
    if amount.is_sign_negative() {
        return Err(ScrapeError::Format(format!("negative amount '{}'", raw)));
    }
    Ok(round_to_decimals(amount, 4))
}

pub fn parse_optional_price(raw: Option<&str>) -> Result<Option<Decimal>, ScrapeError> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some(value) if value.is_empty() || value == NOT_AVAILABLE || value == "-" => Ok(None),
        Some(value) => parse_money(value).map(|price| Some(round_to_decimals(price, 2))),
    }
}

pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = round_to_decimals(amount, 4);
    rounded.rescale(4);
    format!("${}", rounded)
}

pub fn format_price(price: Decimal) -> String {
    let mut rounded = round_to_decimals(price, 2);
    rounded.rescale(2);
    format!("${}", rounded)
}

pub fn format_optional_price(price: Option<Decimal>) -> String {
    price
        .map(format_price)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_volume(volume: Option<u64>) -> String {
    match volume {
        Some(volume) => volume.to_formatted_string(&Locale::en),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Renders a fraction (`0.1234`) as a percentage (`12.34%`).
pub fn format_percent(fraction: Option<f64>) -> String {
    match fraction {
        Some(fraction) if fraction.is_finite() => format!("{:.2}%", fraction * 100.0),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_dollars(value: Option<f64>) -> String {
    match value.and_then(Decimal::from_f64) {
        Some(value) => format_price(value),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_range(low: Option<f64>, high: Option<f64>) -> String {
    match (low, high) {
        (Some(_), Some(_)) => format!("{} - {}", format_dollars(low), format_dollars(high)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_legacy_ex_date_spellings() {
        let expected = ymd(2024, 1, 5);
        for raw in [
            "24. 01. 05",
            "24. 01. 05.",
            "24.01.05",
            "2024. 1. 5.",
            "2024-01-05",
            "2024-01-05T00:00:00",
            "01/05/2024",
            "Jan 5, 2024",
            "January 5, 2024",
            "  24.  01. 05 ",
        ] {
            assert_eq!(parse_ex_date(raw).unwrap(), expected, "raw = {:?}", raw);
        }
    }

    #[test]
    fn rejects_garbage_ex_dates() {
        for raw in ["", "N/A", "soon", "24.13.45", "Record Date"] {
            assert!(
                matches!(parse_ex_date(raw), Err(ScrapeError::Format(_))),
                "raw = {:?}",
                raw
            );
        }
    }

    #[test]
    fn ex_date_formats_canonically() {
        assert_eq!(format_ex_date(ymd(2024, 1, 5)), "24. 01. 05");
        assert_eq!(format_ex_date(ymd(2023, 12, 29)), "23. 12. 29");
    }

    #[test]
    fn amounts_keep_four_decimals() {
        assert_eq!(parse_amount("$0.15").unwrap(), dec!(0.15));
        assert_eq!(parse_amount(" $1,234.56789 ").unwrap(), dec!(1234.5679));
        assert_eq!(format_amount(dec!(0.15)), "$0.1500");
        assert_eq!(format_amount(dec!(0.123456)), "$0.1235");
        assert!(parse_amount("N/A").is_err());
        assert!(parse_amount("-$0.10").is_err());
    }

    #[test]
    fn prices_treat_sentinel_as_absent() {
        assert_eq!(parse_optional_price(Some("N/A")).unwrap(), None);
        assert_eq!(parse_optional_price(Some("")).unwrap(), None);
        assert_eq!(parse_optional_price(None).unwrap(), None);
        assert_eq!(parse_optional_price(Some("$10.00")).unwrap(), Some(dec!(10.00)));
        assert!(parse_optional_price(Some("ten bucks")).is_err());
        assert_eq!(format_optional_price(None), "N/A");
        assert_eq!(format_optional_price(Some(dec!(9.9))), "$9.90");
    }

    #[test]
    fn market_statistics_render_for_display() {
        assert_eq!(format_volume(Some(1234567)), "1,234,567");
        assert_eq!(format_volume(None), "N/A");
        assert_eq!(format_percent(Some(0.1234)), "12.34%");
        assert_eq!(format_percent(Some(f64::NAN)), "N/A");
        assert_eq!(format_range(Some(9.8), Some(12.4)), "$9.80 - $12.40");
        assert_eq!(format_range(None, Some(12.4)), "N/A");
    }
}
