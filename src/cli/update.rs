use std::{sync::Arc, time::Instant};

use anyhow::Context;
use tracing::{info, warn};

use super::shared::print_summary;
use crate::{
    services::{
        dividends::DividendUpdater,
        files::create_necessary_directories,
        market_data::yahoo::YahooFinance,
        scrapers::{browser::HttpPageRenderer, SourceRegistry},
        shared::{build_http_client, env::Settings},
    },
    storage::{models::nav::NavEntry, queries::nav::read_nav_config},
};

pub struct UpdateArgs {
    pub tickers: Vec<String>,
}

/// Keeps entries whose symbol is in `tickers`, case-insensitively. An empty filter keeps all.
pub fn select_tickers(entries: Vec<NavEntry>, tickers: &[String]) -> Vec<NavEntry> {
    if tickers.is_empty() {
        return entries;
    }
    let wanted: Vec<String> = tickers.iter().map(|t| t.trim().to_uppercase()).collect();
    for ticker in &wanted {
        if !entries
            .iter()
            .any(|entry| entry.symbol.trim().to_uppercase() == *ticker)
        {
            warn!("{} is not in the ticker config, skipping", ticker);
        }
    }
    entries
        .into_iter()
        .filter(|entry| wanted.contains(&entry.symbol.trim().to_uppercase()))
        .collect()
}

pub async fn update(settings: Settings, args: UpdateArgs) -> anyhow::Result<()> {
    create_necessary_directories(&settings).context("Couldn't create output directories")?;

    let entries = read_nav_config(&settings.nav_config_path)?;
    let entries = select_tickers(entries, &args.tickers);
    info!(
        "Updating {} tickers from {}",
        entries.len(),
        settings.nav_config_path.display()
    );

    let client = build_http_client(settings.http_timeout_secs)
        .context("Couldn't build the HTTP client")?;
    let provider = Arc::new(YahooFinance::new(client.clone()));
    let renderer = Arc::new(HttpPageRenderer::new(
        client,
        settings.error_artifact_dir.clone(),
    ));
    let sources = SourceRegistry::new(provider.clone(), renderer);
    let updater = DividendUpdater::new(provider, sources, settings);

    let started = Instant::now();
    let summary = updater.update_all(&entries).await;
    print_summary(&summary, started.elapsed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::nav::SourceKind;

    fn entry(symbol: &str) -> NavEntry {
        NavEntry {
            symbol: symbol.to_string(),
            company: String::new(),
            frequency: String::new(),
            group: String::new(),
            source: SourceKind::Yahoo,
        }
    }

    #[test]
    fn ticker_filter_is_case_insensitive() {
        let entries = vec![entry("XDTE"), entry("qdte"), entry("RDTE")];

        let selected = select_tickers(entries.clone(), &["xdte".to_string(), "QDTE".to_string()]);
        assert_eq!(
            selected.iter().map(|e| e.symbol.as_str()).collect::<Vec<_>>(),
            vec!["XDTE", "qdte"]
        );

        assert_eq!(select_tickers(entries.clone(), &[]), entries);
        assert!(select_tickers(entries, &["JEPI".to_string()]).is_empty());
    }
}
