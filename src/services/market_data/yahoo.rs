use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime};
use reqwest::Client;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{DailyClose, DividendEvent, FinancialDataProvider, QuoteSnapshot};
use crate::services::{errors::ScrapeError, shared::round_to_decimals};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Deserialize, Debug)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct YahooError {
    code: String,
    description: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    regular_market_volume: Option<f64>,
    gmtoffset: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    events: Option<ChartEvents>,
    indicators: Option<ChartIndicators>,
}

#[derive(Deserialize, Debug)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, ChartDividend>,
}

#[derive(Deserialize, Debug)]
struct ChartDividend {
    amount: f64,
    date: i64,
}

#[derive(Deserialize, Debug)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Deserialize, Debug)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResult {
    /// Yahoo stamps bars and events in UTC; shifting by the exchange offset gives the
    /// trading date.
    fn trading_date(&self, timestamp: i64) -> Option<NaiveDate> {
        let offset = self.meta.gmtoffset.unwrap_or(0);
        DateTime::from_timestamp(timestamp + offset, 0).map(|moment| moment.date_naive())
    }

    fn dividend_events(&self) -> Vec<DividendEvent> {
        let mut events: Vec<DividendEvent> = self
            .events
            .iter()
            .flat_map(|events| events.dividends.values())
            .filter_map(|dividend| {
                Some(DividendEvent {
                    ex_date: self.trading_date(dividend.date)?,
                    amount: round_to_decimals(Decimal::from_f64(dividend.amount)?, 4),
                })
            })
            .collect();
        events.sort_by(|a, b| b.ex_date.cmp(&a.ex_date));
        events
    }

    fn daily_closes(&self) -> Vec<DailyClose> {
        let closes = match self.indicators.as_ref().and_then(|i| i.quote.first()) {
            Some(quote) => &quote.close,
            None => return vec![],
        };
        self.timestamp
            .iter()
            .zip(closes.iter())
            .filter_map(|(timestamp, close)| {
                Some(DailyClose {
                    date: self.trading_date(*timestamp)?,
                    close: round_to_decimals(Decimal::from_f64((*close)?)?, 2),
                })
            })
            .collect()
    }
}

fn parse_chart_response(body: &str) -> Result<ChartResult, ScrapeError> {
    let response = serde_json::from_str::<ChartResponse>(body)?;
    if let Some(error) = response.chart.error {
        return Err(ScrapeError::Fetch(format!(
            "Yahoo returned {}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }
    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ScrapeError::Fetch("Yahoo chart response had no result".to_string()))
}

fn raw_f64(value: &Value) -> Option<f64> {
    value["raw"].as_f64().or_else(|| value.as_f64())
}

fn raw_u64(value: &Value) -> Option<u64> {
    raw_f64(value).filter(|v| *v >= 0.0).map(|v| v as u64)
}

/// Fills a snapshot from a quoteSummary payload, leaving fields the fund doesn't report empty.
fn parse_quote_summary(body: &str) -> Result<QuoteSnapshot, ScrapeError> {
    let data: Value = serde_json::from_str(body)?;
    let result = &data["quoteSummary"]["result"][0];
    if result.is_null() {
        return Err(ScrapeError::Fetch(format!(
            "quoteSummary had no result: {}",
            data["quoteSummary"]["error"]
        )));
    }

    let price = &result["price"];
    let detail = &result["summaryDetail"];
    let statistics = &result["defaultKeyStatistics"];

    Ok(QuoteSnapshot {
        long_name: price["longName"]
            .as_str()
            .or_else(|| price["shortName"].as_str())
            .map(str::to_string),
        fifty_two_week_low: raw_f64(&detail["fiftyTwoWeekLow"]),
        fifty_two_week_high: raw_f64(&detail["fiftyTwoWeekHigh"]),
        volume: raw_u64(&detail["volume"]).or_else(|| raw_u64(&price["regularMarketVolume"])),
        average_volume: raw_u64(&detail["averageVolume"]),
        nav: raw_f64(&detail["navPrice"]),
        trailing_yield: raw_f64(&detail["yield"])
            .or_else(|| raw_f64(&detail["trailingAnnualDividendYield"])),
        ytd_return: raw_f64(&statistics["ytdReturn"]),
    })
}

fn snapshot_from_chart_meta(chart: &ChartResult) -> QuoteSnapshot {
    let meta = &chart.meta;
    QuoteSnapshot {
        long_name: meta.long_name.clone().or_else(|| meta.short_name.clone()),
        fifty_two_week_low: meta.fifty_two_week_low,
        fifty_two_week_high: meta.fifty_two_week_high,
        volume: meta
            .regular_market_volume
            .filter(|v| *v >= 0.0)
            .map(|v| v as u64),
        ..Default::default()
    }
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

pub struct YahooFinance {
    client: Client,
}

impl YahooFinance {
    pub fn new(client: Client) -> Self {
        YahooFinance { client }
    }

    async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() && !body.trim_start().starts_with('{') {
            return Err(ScrapeError::Fetch(format!("{} returned {}", url, status)));
        }
        Ok(body)
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        period1: i64,
        period2: i64,
    ) -> Result<ChartResult, ScrapeError> {
        let url = format!(
            "{CHART_URL}/{symbol}?period1={period1}&period2={period2}&interval=1d&events=div"
        );
        debug!("Fetching {}", url);
        let body = self.get_text(&url).await?;
        parse_chart_response(&body)
    }
}

#[async_trait]
impl FinancialDataProvider for YahooFinance {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, ScrapeError> {
        let url = format!(
            "{QUOTE_SUMMARY_URL}/{symbol}?modules=price,summaryDetail,defaultKeyStatistics"
        );
        let summary = self
            .get_text(&url)
            .await
            .and_then(|body| parse_quote_summary(&body));

        match summary {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                // quoteSummary wants a session crumb more often than not, the chart meta
                // still carries name, range and volume
                debug!("quoteSummary unavailable for {}: {}", symbol, e);
                let now = chrono::Utc::now().timestamp();
                let chart = self
                    .fetch_chart(symbol, now - ChronoDuration::days(7).num_seconds(), now)
                    .await?;
                Ok(snapshot_from_chart_meta(&chart))
            }
        }
    }

    async fn fetch_dividends(
        &self,
        symbol: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DividendEvent>, ScrapeError> {
        let period1 = since.map(unix_seconds).unwrap_or(0);
        let period2 = chrono::Utc::now().timestamp();
        let chart = self.fetch_chart(symbol, period1, period2).await?;
        Ok(chart
            .dividend_events()
            .into_iter()
            .filter(|event| since.map_or(true, |since| event.ex_date >= since))
            .collect())
    }

    async fn fetch_closing_prices(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyClose>, ScrapeError> {
        let period1 = unix_seconds(from);
        let period2 = unix_seconds(to + ChronoDuration::days(1));
        let chart = self.fetch_chart(symbol, period1, period2).await?;
        Ok(chart
            .daily_closes()
            .into_iter()
            .filter(|close| close.date >= from && close.date <= to)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // 2024-01-04 and 2024-01-05, 14:30 UTC, exchange at UTC-5
    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "JEPI",
                    "longName": "JPMorgan Equity Premium Income ETF",
                    "fiftyTwoWeekHigh": 58.6,
                    "fiftyTwoWeekLow": 52.1,
                    "regularMarketVolume": 3456789,
                    "gmtoffset": -18000
                },
                "timestamp": [1704378600, 1704465000, 1704724200],
                "events": {
                    "dividends": {
                        "1704465000": {"amount": 0.3741, "date": 1704465000}
                    }
                },
                "indicators": {
                    "quote": [{"close": [55.123, 54.77, null]}]
                }
            }],
            "error": null
        }
    }"#;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn chart_dividends_land_on_exchange_dates() {
        let chart = parse_chart_response(CHART_BODY).unwrap();
        assert_eq!(
            chart.dividend_events(),
            vec![DividendEvent {
                ex_date: ymd(2024, 1, 5),
                amount: dec!(0.3741),
            }]
        );
    }

    #[test]
    fn chart_closes_skip_missing_bars() {
        let chart = parse_chart_response(CHART_BODY).unwrap();
        assert_eq!(
            chart.daily_closes(),
            vec![
                DailyClose {
                    date: ymd(2024, 1, 4),
                    close: dec!(55.12),
                },
                DailyClose {
                    date: ymd(2024, 1, 5),
                    close: dec!(54.77),
                },
            ]
        );
    }

    #[test]
    fn chart_meta_is_a_fallback_snapshot() {
        let chart = parse_chart_response(CHART_BODY).unwrap();
        let snapshot = snapshot_from_chart_meta(&chart);
        assert_eq!(
            snapshot.long_name.as_deref(),
            Some("JPMorgan Equity Premium Income ETF")
        );
        assert_eq!(snapshot.volume, Some(3456789));
        assert_eq!(snapshot.nav, None);
    }

    #[test]
    fn chart_errors_are_fetch_failures() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        match parse_chart_response(body) {
            Err(ScrapeError::Fetch(message)) => assert!(message.contains("delisted")),
            other => panic!("expected fetch error, got {:?}", other),
        }
        assert!(matches!(
            parse_chart_response("<html>rate limited</html>"),
            Err(ScrapeError::Fetch(_))
        ));
    }

    #[test]
    fn quote_summary_reads_raw_values() {
        let body = r#"{"quoteSummary": {"result": [{
            "price": {"longName": "Roundhill Innovation-100 0DTE Covered Call Strategy ETF",
                      "regularMarketVolume": {"raw": 120000, "fmt": "120k"}},
            "summaryDetail": {"navPrice": {"raw": 40.12}, "yield": {"raw": 0.3021},
                              "averageVolume": {"raw": 250000}, "fiftyTwoWeekLow": {"raw": 38.5},
                              "fiftyTwoWeekHigh": {"raw": 45.0}},
            "defaultKeyStatistics": {"ytdReturn": {"raw": 0.0512}}
        }], "error": null}}"#;
        let snapshot = parse_quote_summary(body).unwrap();
        assert_eq!(snapshot.nav, Some(40.12));
        assert_eq!(snapshot.volume, Some(120000));
        assert_eq!(snapshot.average_volume, Some(250000));
        assert_eq!(snapshot.trailing_yield, Some(0.3021));
        assert_eq!(snapshot.ytd_return, Some(0.0512));
        assert_eq!(snapshot.fifty_two_week_high, Some(45.0));
    }

    #[test]
    fn empty_quote_summary_is_an_error() {
        let body = r#"{"quoteSummary": {"result": null, "error": {"code": "Unauthorized"}}}"#;
        assert!(parse_quote_summary(body).is_err());
    }
}
