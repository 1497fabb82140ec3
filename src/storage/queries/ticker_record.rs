use std::{fs, io::ErrorKind, path::Path};

use serde_json::Value;
use tracing::debug;

use crate::{
    services::errors::ScrapeError,
    storage::{
        models::{
            dividend::DividendRow,
            ticker::{StoredTickerRecord, TickerRecord},
        },
        ticker_file_path, write_json_atomically,
    },
};

pub fn read_ticker_record(
    out_dir: &Path,
    symbol: &str,
) -> Result<Option<StoredTickerRecord>, ScrapeError> {
    let path = ticker_file_path(out_dir, symbol);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No stored history for {} yet", symbol);
            return Ok(None);
        }
        Err(e) => return Err(ScrapeError::Storage(e)),
    };

    parse_stored_record(&contents)
        .map(Some)
        .map_err(|e| ScrapeError::Format(format!("{}: {}", path.display(), e)))
}

/// Accepts the canonical `{tickerInfo, dividendHistory}` object as well as the bare row
/// arrays some early files were written as.
pub fn parse_stored_record(contents: &str) -> Result<StoredTickerRecord, serde_json::Error> {
    match serde_json::from_str::<Value>(contents)? {
        Value::Array(rows) => Ok(StoredTickerRecord {
            ticker_info: None,
            dividend_history: serde_json::from_value::<Vec<DividendRow>>(Value::Array(rows))?,
        }),
        value => serde_json::from_value::<StoredTickerRecord>(value),
    }
}

pub fn write_ticker_record(
    out_dir: &Path,
    symbol: &str,
    record: &TickerRecord,
) -> Result<(), ScrapeError> {
    let path = ticker_file_path(out_dir, symbol);
    write_json_atomically(&path, record)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{
        models::{dividend::DividendRecord, ticker::TickerInfo},
        test_support::scratch_dir,
    };
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = scratch_dir("record-missing");
        assert!(read_ticker_record(&dir, "XDTE").unwrap().is_none());
    }

    #[test]
    fn written_record_reads_back_as_rows() {
        let dir = scratch_dir("record-roundtrip");
        let record = TickerRecord {
            ticker_info: Some(TickerInfo {
                symbol: "XDTE".to_string(),
                nav: "$40.12".to_string(),
                ..Default::default()
            }),
            dividend_history: vec![DividendRecord {
                ex_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                amount: dec!(0.2),
                price_before: Some(dec!(40.1)),
                price_on_date: None,
            }],
        };
        write_ticker_record(&dir, "XDTE", &record).unwrap();

        let stored = read_ticker_record(&dir, "xdte").unwrap().unwrap();
        assert_eq!(stored.ticker_info.unwrap().nav, "$40.12");
        assert_eq!(
            stored.dividend_history,
            vec![DividendRow {
                ex_date: Some("24. 01. 05".to_string()),
                amount: Some("$0.2000".to_string()),
                price_before: Some("$40.10".to_string()),
                price_on_date: Some("N/A".to_string()),
            }]
        );
    }

    #[test]
    fn bare_row_arrays_are_accepted() {
        let stored =
            parse_stored_record(r#"[{"exDate": "24.01.05.", "amount": "$0.15"}]"#).unwrap();
        assert!(stored.ticker_info.is_none());
        assert_eq!(stored.dividend_history.len(), 1);
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let dir = scratch_dir("record-corrupt");
        fs::write(dir.join("jepi.json"), "{ not json").unwrap();
        assert!(matches!(
            read_ticker_record(&dir, "JEPI"),
            Err(ScrapeError::Format(_))
        ));
    }
}
