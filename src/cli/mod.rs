pub mod display;
pub mod interactive;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use statuswatch::registry::normalize;
use statuswatch::{MonitorEngine, Scheduler};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Probe timeout in seconds, overrides the configuration.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Without a subcommand an interactive prompt is started.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Adds a URL to monitor. `https://` is assumed when no scheme is given.
    Add { url: String },
    /// Removes a monitored URL.
    Remove { url: String },
    /// Lists the monitored URLs.
    List,
    /// Checks every URL once.
    Check,
    /// Checks continuously until Ctrl+C.
    Start {
        /// Minutes between two checks, overrides the configuration.
        #[arg(long, short, value_parser = clap::value_parser!(u64).range(1..))]
        interval_minutes: Option<u64>,
    },
    /// Shows the most recent logged checks.
    History {
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: u32,
    },
}

pub async fn execute(
    command: Commands,
    engine: Arc<MonitorEngine>,
    default_interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = engine.registry();

    match command {
        Commands::Add { url: raw } => match normalize(&raw) {
            None => println!("Please enter a URL"),
            Some(url) => {
                if registry.add(&raw)? {
                    println!("Added URL: {url}");
                } else {
                    println!("URL already exists: {url}");
                }
            }
        },
        Commands::Remove { url: raw } => match registry.remove_matching(&raw)? {
            Some(url) => println!("Removed URL: {url}"),
            None => println!("URL not found: {raw}"),
        },
        Commands::List => display::print_urls(&registry.list()),
        Commands::Check => {
            let report = engine.run_cycle().await;
            display::print_report(&report);
        }
        Commands::Start { interval_minutes } => {
            let interval = interval_minutes
                .map(display::interval_from_minutes)
                .unwrap_or(default_interval);
            run_continuous(engine, interval).await;
        }
        Commands::History { limit } => {
            let entries = engine.store().recent(limit).await?;
            display::print_history(&entries);
        }
    }

    Ok(())
}

/// Monitors in the foreground until Ctrl+C.
async fn run_continuous(engine: Arc<MonitorEngine>, interval: Duration) {
    if engine.registry().is_empty() {
        println!("No URLs to check. Please add URLs first.");
        return;
    }

    let scheduler = Scheduler::new(engine);
    let mut reports = scheduler.subscribe();
    let every = display::describe_interval(interval);

    println!("\nStarting continuous monitoring (checking every {every})...");
    println!("Press Ctrl+C to stop.\n");
    scheduler.start(interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            report = reports.recv() => match report {
                Ok(report) => {
                    display::print_report(&report);
                    println!("\nWaiting {every} until next check...\n");
                }
                Err(RecvError::Lagged(skipped)) => log::warn!("Skipped {skipped} cycle report(s)"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    scheduler.shutdown().await;
    println!("\n\nMonitoring stopped by user.");
}
