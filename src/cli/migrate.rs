use owo_colors::OwoColorize;

use crate::services::{migration::migrate_ticker_files, shared::env::Settings};

pub fn migrate(settings: &Settings) -> anyhow::Result<()> {
    println!("Migrating ticker files in {}...", settings.out_dir.display());
    let report = migrate_ticker_files(&settings.out_dir)?;

    println!(
        "Scanned {} files: {} rewritten, {} skipped, {} failed",
        report.scanned,
        report.rewritten.green(),
        report.skipped,
        report.failed.red()
    );
    Ok(())
}
