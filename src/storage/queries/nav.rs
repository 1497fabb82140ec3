use std::{fs, path::Path};

use anyhow::Context;
use itertools::Itertools;
use tracing::warn;

use crate::storage::models::nav::{NavEntry, NavFile};

pub fn read_nav_config(path: &Path) -> anyhow::Result<Vec<NavEntry>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Couldn't read ticker config at {}", path.display()))?;
    let nav_file = serde_json::from_str::<NavFile>(&contents)
        .with_context(|| format!("Ticker config at {} is not valid", path.display()))?;

    let entries = nav_file
        .into_entries()
        .into_iter()
        .filter(|entry| {
            let keep = !entry.symbol.trim().is_empty();
            if !keep {
                warn!("Skipping ticker config entry without a symbol: {:?}", entry);
            }
            keep
        })
        .unique_by(|entry| entry.symbol.trim().to_uppercase())
        .collect_vec();

    Ok(entries)
}
