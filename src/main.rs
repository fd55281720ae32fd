use std::sync::Arc;

use clap::Parser;
use statuswatch::{
    MonitorEngine,
    config::{load_config, validate},
};

mod cli;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = load_config()?;
    if let Some(timeout) = cli.timeout {
        config.timeout_seconds = timeout;
    }
    validate(&config)?;

    let engine = Arc::new(MonitorEngine::from_config(&config).await?);

    match cli.command {
        Some(command) => cli::execute(command, engine, config.interval()).await?,
        None => cli::interactive::run(engine, config.interval()).await?,
    }

    Ok(())
}
