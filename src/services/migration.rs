use std::{fs, path::Path};

use anyhow::Context;
use serde_json::Value;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::reconciler::reconcile_dividend_history;
use crate::storage::{
    models::ticker::TickerRecord, queries::ticker_record::parse_stored_record,
    write_json_atomically,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MigrationReport {
    pub scanned: usize,
    pub rewritten: usize,
    pub skipped: usize,
    pub failed: usize,
}

const HISTORY_KEYS: [&str; 4] = ["tickerInfo", "dividendHistory", "dividends", "history"];

fn looks_like_ticker_file(value: &Value) -> bool {
    match value {
        Value::Object(map) => HISTORY_KEYS.iter().any(|key| map.contains_key(*key)),
        Value::Array(rows) => rows.iter().any(|row| {
            row.as_object().is_some_and(|row| {
                ["exDate", "Ex Date", "Ex-Date", "ex_date"]
                    .iter()
                    .any(|key| row.contains_key(*key))
            })
        }),
        _ => false,
    }
}

/// The canonical form of `contents`, or `None` if the file already is canonical.
pub fn canonicalize_ticker_file(
    symbol: &str,
    contents: &str,
) -> anyhow::Result<Option<TickerRecord>> {
    let stored = parse_stored_record(contents)?;
    let reconciliation = reconcile_dividend_history(symbol, None, &stored.dividend_history);

    let record = TickerRecord {
        ticker_info: stored.ticker_info,
        dividend_history: reconciliation.merged,
    };
    let canonical = serde_json::to_string_pretty(&record)?;

    Ok((canonical != contents).then_some(record))
}

/// One-time pass that brings every ticker file in `out_dir` to the current schema.
pub fn migrate_ticker_files(out_dir: &Path) -> anyhow::Result<MigrationReport> {
    let mut report = MigrationReport::default();

    for entry in WalkDir::new(out_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
    {
        let path = entry.path();
        let symbol = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        report.scanned += 1;

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Couldn't read {}", path.display()))?;
        let is_ticker_file = serde_json::from_str::<Value>(&contents)
            .map(|value| looks_like_ticker_file(&value))
            .unwrap_or(false);
        if !is_ticker_file {
            info!("Skipping {}, not a ticker file", path.display());
            report.skipped += 1;
            continue;
        }

        match canonicalize_ticker_file(&symbol, &contents) {
            Ok(Some(record)) => {
                write_json_atomically(path, &record)
                    .with_context(|| format!("Couldn't rewrite {}", path.display()))?;
                info!("Migrated {}", path.display());
                report.rewritten += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Couldn't migrate {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{queries::ticker_record::read_ticker_record, test_support::scratch_dir};

    const LEGACY: &str = r#"{
        "tickerInfo": {"Symbol": "XDTE", "Update": "2024-01-05 09:00", "NAV": "$40.12"},
        "dividendHistory": [
            {"exDate": "24. 01. 05.", "amount": "$0.15", "priceBefore": "N/A", "priceOnDate": "N/A", "timestamp": 1704412800},
            {"exDate": "24.01.12", "amount": "$0.16", "priceBefore": "$10.10", "priceOnDate": "$9.95", "timestamp": 1705017600},
            {"exDate": "24. 01. 12.", "amount": "$0.16", "priceBefore": "N/A", "priceOnDate": "N/A"},
            {"exDate": "", "amount": "$0.99"}
        ]
    }"#;

    #[test]
    fn legacy_file_becomes_canonical() {
        let record = canonicalize_ticker_file("XDTE", LEGACY).unwrap().unwrap();
        let canonical = serde_json::to_string_pretty(&record).unwrap();
        let value: Value = serde_json::from_str(&canonical).unwrap();

        let history = value["dividendHistory"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["exDate"], "24. 01. 12");
        assert_eq!(history[0]["priceBefore"], "$10.10");
        assert_eq!(history[1]["amount"], "$0.1500");
        assert!(history[1].get("timestamp").is_none());
        assert_eq!(value["tickerInfo"]["lastUpdated"], "2024-01-05 09:00");
        assert_eq!(value["tickerInfo"]["nav"], "$40.12");

        assert!(canonicalize_ticker_file("XDTE", &canonical).unwrap().is_none());
    }

    #[test]
    fn migrates_directory_and_leaves_other_json_alone() {
        let dir = scratch_dir("migrate");
        fs::write(dir.join("xdte.json"), LEGACY).unwrap();
        fs::write(
            dir.join("qdte.json"),
            r#"[{"Ex Date": "01/05/2024", "Amount Paid": "$0.1500"}]"#,
        )
        .unwrap();
        let nav = r#"{"nav": [{"symbol": "XDTE"}]}"#;
        fs::write(dir.join("nav.json"), nav).unwrap();
        fs::write(dir.join("notes.txt"), "hello").unwrap();

        let report = migrate_ticker_files(&dir).unwrap();
        assert_eq!(
            report,
            MigrationReport {
                scanned: 3,
                rewritten: 2,
                skipped: 1,
                failed: 0,
            }
        );
        assert_eq!(fs::read_to_string(dir.join("nav.json")).unwrap(), nav);

        let qdte = read_ticker_record(&dir, "QDTE").unwrap().unwrap();
        assert_eq!(qdte.dividend_history[0].ex_date.as_deref(), Some("24. 01. 05"));
        assert_eq!(qdte.dividend_history[0].price_before.as_deref(), Some("N/A"));

        let again = migrate_ticker_files(&dir).unwrap();
        assert_eq!(again.rewritten, 0);
    }

    #[test]
    fn unreadable_price_survives_migration() {
        let contents = r#"{"tickerInfo": {"symbol": "XDTE"}, "dividendHistory": [
            {"exDate": "24. 01. 05.", "amount": "$0.15", "priceBefore": "$10.00", "priceOnDate": "-$"}
        ]}"#;
        let record = canonicalize_ticker_file("XDTE", contents).unwrap().unwrap();

        assert_eq!(record.dividend_history.len(), 1);
        assert_eq!(record.dividend_history[0].price_on_date, None);
        assert!(!record.dividend_history[0].is_priced());
    }
}
