pub mod migrate;
pub mod shared;
pub mod update;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use migrate::migrate;
use update::{update, UpdateArgs};

use crate::services::shared::env::Settings;

#[derive(Parser, Debug)]
#[command(about = "Keeps per-ticker dividend history files up to date")]
struct Args {
    /// Only process these tickers (repeatable)
    #[arg(long = "ticker", global = true)]
    tickers: Vec<String>,
    /// Ticker config file, overrides NAV_CONFIG_PATH
    #[arg(long, global = true)]
    nav: Option<PathBuf>,
    /// Output directory, overrides DIVIDENDS_OUT_DIR
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    #[clap(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Rewrite existing ticker files in the current schema
    Migrate,
}

pub async fn cli() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::from_env();
    if let Some(nav) = args.nav {
        settings.nav_config_path = nav;
    }
    if let Some(out_dir) = args.out_dir {
        settings.out_dir = out_dir;
    }

    match args.cmd {
        None => {
            update(
                settings,
                UpdateArgs {
                    tickers: args.tickers,
                },
            )
            .await?;
        }
        Some(Command::Migrate) => {
            migrate(&settings)?;
        }
    }
    Ok(())
}
