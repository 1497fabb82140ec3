use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, Utc};
use itertools::Itertools;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::{
    errors::ScrapeError,
    market_data::{DailyClose, FinancialDataProvider, QuoteSnapshot},
    parsers::{format_dollars, format_percent, format_range, format_volume},
    reconciler::reconcile_dividend_history,
    scrapers::SourceRegistry,
    shared::{
        constants::{INCREMENTAL_FETCH_SLACK_DAYS, PRICE_LOOKUP_WINDOW_DAYS},
        env::Settings,
    },
    summary::{RunSummary, TickerOutcome, TickerStatus},
};
use crate::storage::{
    models::{
        dividend::{DividendRecord, DividendRow},
        nav::NavEntry,
        ticker::{TickerInfo, TickerRecord},
    },
    queries::ticker_record::{read_ticker_record, write_ticker_record},
};

/// Keeps external requests at least `delay` apart.
struct RequestPacer {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    fn new(delay: Duration) -> Self {
        RequestPacer {
            delay,
            last_request: Mutex::new(None),
        }
    }

    async fn wait(&self) {
        let remaining = {
            let mut last_request = match self.last_request.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let remaining = last_request
                .map(|last| self.delay.saturating_sub(last.elapsed()))
                .unwrap_or_default();
            *last_request = Some(Instant::now() + remaining);
            remaining
        };
        if !remaining.is_zero() {
            sleep(remaining).await;
        }
    }
}

pub struct DividendUpdater {
    provider: Arc<dyn FinancialDataProvider>,
    sources: SourceRegistry,
    settings: Settings,
    pacer: RequestPacer,
}

impl DividendUpdater {
    pub fn new(
        provider: Arc<dyn FinancialDataProvider>,
        sources: SourceRegistry,
        settings: Settings,
    ) -> Self {
        let pacer = RequestPacer::new(Duration::from_millis(settings.fetch_delay_ms));
        DividendUpdater {
            provider,
            sources,
            settings,
            pacer,
        }
    }

    /// Processes every ticker in order. A failing ticker is logged and recorded, never fatal.
    pub async fn update_all(&self, entries: &[NavEntry]) -> RunSummary {
        let mut summary = RunSummary::default();
        for (index, entry) in entries.iter().enumerate() {
            let symbol = entry.symbol.trim().to_uppercase();
            info!("[{}/{}] {}", index + 1, entries.len(), symbol);

            let status = match self.update_ticker(entry).await {
                Ok(status) => status,
                Err(e) => {
                    error!("{}: {}", symbol, e);
                    TickerStatus::Failed {
                        kind: e.kind(),
                        reason: e.to_string(),
                    }
                }
            };
            summary.record(TickerOutcome {
                symbol,
                source: entry.source,
                status,
            });
        }
        summary
    }

    pub async fn update_ticker(&self, entry: &NavEntry) -> Result<TickerStatus, ScrapeError> {
        let symbol = entry.symbol.trim().to_uppercase();
        let out_dir = &self.settings.out_dir;

        let stored = read_ticker_record(out_dir, &symbol)?;
        let existing_rows = stored.as_ref().map(|record| record.dividend_history.as_slice());

        self.pacer.wait().await;
        let snapshot = self.provider.fetch_quote(&symbol).await?;
        let ticker_info = build_ticker_info(
            entry,
            &symbol,
            &snapshot,
            Utc::now().with_timezone(&self.settings.utc_offset),
        );

        let since = existing_rows.and_then(fetch_window_start);
        let source = self.sources.source_for(entry.source);
        self.pacer.wait().await;
        let fresh_rows = source.fetch_distributions(&symbol, since).await?;
        info!(
            "{}: {} distribution rows from {}",
            symbol,
            fresh_rows.len(),
            source.name()
        );

        let fresh_rows = self
            .price_fresh_rows(&symbol, existing_rows.unwrap_or_default(), fresh_rows)
            .await;

        let reconciliation = reconcile_dividend_history(&symbol, existing_rows, &fresh_rows);
        let changed = reconciliation.changed();
        // migrated bare-array files have no snapshot yet, so they get written once regardless
        let has_snapshot = stored
            .as_ref()
            .is_some_and(|record| record.ticker_info.is_some());
        if has_snapshot && !changed {
            info!("{}: nothing new", symbol);
            return Ok(TickerStatus::Unchanged);
        }

        let records = reconciliation.merged.len();
        let record = TickerRecord {
            ticker_info: Some(ticker_info),
            dividend_history: reconciliation.merged,
        };
        write_ticker_record(out_dir, &symbol, &record)?;

        Ok(match stored {
            None => {
                info!("{}: created with {} distributions", symbol, records);
                TickerStatus::Created { records }
            }
            Some(_) => {
                info!(
                    "{}: {} added, {} priced",
                    symbol, reconciliation.added, reconciliation.enriched
                );
                TickerStatus::Updated {
                    added: reconciliation.added,
                    enriched: reconciliation.enriched,
                }
            }
        })
    }

    /// Looks up closes around the ex-dates of fresh rows that aren't priced yet. A failed
    /// lookup leaves them unpriced for the next run to fill in.
    async fn price_fresh_rows(
        &self,
        symbol: &str,
        existing: &[DividendRow],
        fresh: Vec<DividendRow>,
    ) -> Vec<DividendRow> {
        let priced_dates: HashSet<NaiveDate> = existing
            .iter()
            .filter_map(|row| DividendRecord::try_from(row).ok())
            .filter(|record| record.is_priced())
            .map(|record| record.ex_date)
            .collect();

        let today = Utc::now().with_timezone(&self.settings.utc_offset).date_naive();
        let Some((from, to)) = price_window(&fresh, &priced_dates, today) else {
            return fresh;
        };

        self.pacer.wait().await;
        match self.provider.fetch_closing_prices(symbol, from, to).await {
            Ok(closes) => attach_prices(fresh, &closes),
            Err(e) => {
                warn!("{}: couldn't look up closing prices: {}", symbol, e);
                fresh
            }
        }
    }
}

pub fn build_ticker_info(
    entry: &NavEntry,
    symbol: &str,
    snapshot: &QuoteSnapshot,
    now: DateTime<FixedOffset>,
) -> TickerInfo {
    TickerInfo {
        symbol: symbol.to_string(),
        long_name: snapshot
            .long_name
            .clone()
            .unwrap_or_else(|| symbol.to_string()),
        company: entry.company.clone(),
        frequency: entry.frequency.clone(),
        group: entry.group.clone(),
        last_updated: now.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
        fifty_two_week_range: format_range(
            snapshot.fifty_two_week_low,
            snapshot.fifty_two_week_high,
        ),
        volume: format_volume(snapshot.volume),
        average_volume: format_volume(snapshot.average_volume),
        nav: format_dollars(snapshot.nav),
        trailing_yield: format_percent(snapshot.trailing_yield),
        ytd_return: format_percent(snapshot.ytd_return),
    }
}

/// Where an incremental fetch has to start: a little before the oldest record still waiting
/// for prices, otherwise before the newest record. `None` means fetch everything.
pub fn fetch_window_start(existing: &[DividendRow]) -> Option<NaiveDate> {
    let records = existing
        .iter()
        .filter_map(|row| DividendRecord::try_from(row).ok())
        .collect_vec();

    let anchor = records
        .iter()
        .filter(|record| !record.is_priced())
        .map(|record| record.ex_date)
        .min()
        .or_else(|| records.iter().map(|record| record.ex_date).max())?;

    Some(anchor - ChronoDuration::days(INCREMENTAL_FETCH_SLACK_DAYS))
}

/// Date range of closes needed to price the unpriced rows, capped at `today`.
pub fn price_window(
    fresh: &[DividendRow],
    priced_dates: &HashSet<NaiveDate>,
    today: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let (oldest, newest) = fresh
        .iter()
        .filter_map(|row| DividendRecord::try_from(row).ok())
        .filter(|record| !record.is_priced() && !priced_dates.contains(&record.ex_date))
        .map(|record| record.ex_date)
        .filter(|ex_date| *ex_date <= today)
        .minmax()
        .into_option()?;

    Some((
        oldest - ChronoDuration::days(PRICE_LOOKUP_WINDOW_DAYS),
        newest.min(today),
    ))
}

/// `priceOnDate` is the ex-date close, `priceBefore` the last close before it. Rows only get
/// prices when both exist.
pub fn attach_prices(rows: Vec<DividendRow>, closes: &[DailyClose]) -> Vec<DividendRow> {
    let closes = closes
        .iter()
        .sorted_by_key(|close| close.date)
        .collect_vec();

    rows.into_iter()
        .map(|row| {
            let mut record = match DividendRecord::try_from(&row) {
                Ok(record) if !record.is_priced() => record,
                _ => return row,
            };
            let on_date = closes.iter().find(|close| close.date == record.ex_date);
            let before = closes
                .iter()
                .rev()
                .find(|close| close.date < record.ex_date);

            match (before, on_date) {
                (Some(before), Some(on_date)) => {
                    record.price_before = Some(before.close);
                    record.price_on_date = Some(on_date.close);
                    DividendRow::from(record)
                }
                _ => row,
            }
        })
        .collect()
}
