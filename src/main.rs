use anyhow::Result;
use dotenv::dotenv;

use chalstats::config::Config;
use chalstats::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up .env before anything reads the environment
    dotenv().ok();

    // Begin logger
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("Starting with {config:?}");

    server::run_server(config).await
}
