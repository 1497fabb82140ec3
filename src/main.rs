mod cli;
mod services;
mod storage;

use cli::cli;
use services::shared::{env::check_for_env_variables, logger::init_logger};

async fn run_divscrape() -> anyhow::Result<()> {
    init_logger();
    check_for_env_variables();
    cli().await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    run_divscrape().await?;
    Ok(())
}
