use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::storage::models::dividend::{DividendRecord, DividendRow};

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Newest ex-date first, one record per ex-date.
    pub merged: Vec<DividendRecord>,
    pub added: usize,
    pub enriched: usize,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.enriched > 0
    }
}

/// Merges freshly fetched rows into a stored history.
///
/// Stored records still missing their prices are filled in from a fresh record with the same
/// ex-date (amount included, to pick up rounding corrections). Fresh records with an unknown
/// ex-date are added. Records that already have prices are never touched. Rows whose ex-date
/// or amount can't be read are dropped with a warning.
pub fn reconcile_dividend_history(
    symbol: &str,
    existing: Option<&[DividendRow]>,
    fresh: &[DividendRow],
) -> Reconciliation {
    let fresh = validate_rows(symbol, "fresh", fresh);

    let Some(existing) = existing else {
        let added = fresh.len();
        return Reconciliation {
            merged: sort_newest_first(fresh),
            added,
            enriched: 0,
        };
    };
    let mut merged = validate_rows(symbol, "stored", existing);

    let fresh_by_date: HashMap<NaiveDate, &DividendRecord> =
        fresh.iter().map(|record| (record.ex_date, record)).collect();

    let mut enriched = 0;
    for record in merged.iter_mut().filter(|record| !record.is_priced()) {
        match fresh_by_date.get(&record.ex_date) {
            Some(update) if update.is_priced() => {
                debug!("{}: filling in prices for {}", symbol, record.ex_date);
                record.price_before = update.price_before;
                record.price_on_date = update.price_on_date;
                record.amount = update.amount;
                enriched += 1;
            }
            _ => {}
        }
    }

    let known_dates: HashSet<NaiveDate> = merged.iter().map(|record| record.ex_date).collect();
    let mut added = 0;
    for record in fresh {
        if !known_dates.contains(&record.ex_date) {
            debug!("{}: new distribution on {}", symbol, record.ex_date);
            merged.push(record);
            added += 1;
        }
    }

    Reconciliation {
        merged: sort_newest_first(merged),
        added,
        enriched,
    }
}

fn validate_rows(symbol: &str, origin: &str, rows: &[DividendRow]) -> Vec<DividendRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        match DividendRecord::try_from(row) {
            Ok(record) => {
                if seen.insert(record.ex_date) {
                    records.push(record);
                } else {
                    warn!(
                        "{}: ignoring repeated {} row for ex-date {}",
                        symbol, origin, record.ex_date
                    );
                }
            }
            Err(e) => warn!("{}: skipping {} row {:?}: {}", symbol, origin, row, e),
        }
    }
    records
}

fn sort_newest_first(mut records: Vec<DividendRecord>) -> Vec<DividendRecord> {
    records.sort_by(|a, b| b.ex_date.cmp(&a.ex_date));
    records
}
