use anyhow::Result;
use dotenv::dotenv;

use learnboard::{config::Config, lbapi};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env first so it can set RUST_LOG
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::debug!("Starting with {config:?}");

    lbapi::run_learnboard(&config).await
        .inspect_err(|err| log::error!("Server error: {err:#}"))
}
