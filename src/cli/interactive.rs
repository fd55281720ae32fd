use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use statuswatch::registry::normalize;
use statuswatch::{MonitorEngine, Scheduler, SchedulerState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use super::display;

const DEFAULT_HISTORY: u32 = 20;

#[derive(Debug, PartialEq, Eq)]
pub enum PromptCommand {
    Add(String),
    Remove(String),
    List,
    Check,
    Start(Option<u64>),
    Stop,
    Status,
    History(u32),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Parses one prompt line. Only the keyword is case-insensitive; URLs are kept as typed.
pub fn parse_command(line: &str) -> PromptCommand {
    let line = line.trim();
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };

    match (keyword.to_ascii_lowercase().as_str(), rest) {
        ("", _) => PromptCommand::Empty,
        ("add", url) if !url.is_empty() => PromptCommand::Add(url.to_string()),
        ("remove", url) if !url.is_empty() => PromptCommand::Remove(url.to_string()),
        ("list", "") => PromptCommand::List,
        ("check", "") => PromptCommand::Check,
        ("start", "") => PromptCommand::Start(None),
        ("start", minutes) => match minutes.parse() {
            Ok(minutes) if minutes > 0 => PromptCommand::Start(Some(minutes)),
            _ => PromptCommand::Unknown(line.to_string()),
        },
        ("stop", "") => PromptCommand::Stop,
        ("status", "") => PromptCommand::Status,
        ("history", "") => PromptCommand::History(DEFAULT_HISTORY),
        ("history", limit) => match limit.parse() {
            Ok(limit) => PromptCommand::History(limit),
            Err(_) => PromptCommand::Unknown(line.to_string()),
        },
        ("help", "") => PromptCommand::Help,
        ("quit" | "exit", "") => PromptCommand::Quit,
        _ => PromptCommand::Unknown(line.to_string()),
    }
}

fn print_help() {
    println!("{}", "=".repeat(60));
    println!("Server Status Checker - Interactive Mode");
    println!("{}", "=".repeat(60));
    println!("\nCommands:");
    println!("  add <url>        - Add a URL to monitor");
    println!("  list             - List all URLs");
    println!("  remove <url>     - Remove a URL");
    println!("  check            - Check all URLs once");
    println!("  start [minutes]  - Start continuous monitoring in the background");
    println!("  stop             - Stop continuous monitoring");
    println!("  status           - Show whether monitoring is running");
    println!("  history [n]      - Show the n most recent logged checks");
    println!("  quit             - Exit");
    println!("\n{}\n", "=".repeat(60));
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Prints every cycle report while the prompt keeps accepting commands.
fn spawn_report_printer(
    mut reports: broadcast::Receiver<statuswatch::CycleReport>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match reports.recv().await {
                Ok(report) => {
                    display::print_report(&report);
                    prompt();
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Skipped {skipped} cycle report(s)");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Runs the interactive prompt until `quit`, end of input or Ctrl+C.
pub async fn run(
    engine: Arc<MonitorEngine>,
    default_interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = Scheduler::new(Arc::clone(&engine));
    let printer = spawn_report_printer(scheduler.subscribe());
    let registry = engine.registry();

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            PromptCommand::Empty => {}
            PromptCommand::Add(raw) => match normalize(&raw) {
                None => println!("Please enter a URL"),
                Some(url) => match registry.add(&raw) {
                    Ok(true) => println!("Added URL: {url}"),
                    Ok(false) => println!("URL already exists: {url}"),
                    Err(e) => println!("Error: {e}"),
                },
            },
            PromptCommand::Remove(raw) => match registry.remove_matching(&raw) {
                Ok(Some(url)) => println!("Removed URL: {url}"),
                Ok(None) => println!("URL not found: {raw}"),
                Err(e) => println!("Error: {e}"),
            },
            PromptCommand::List => display::print_urls(&registry.list()),
            PromptCommand::Check => {
                if registry.is_empty() {
                    println!("No URLs to check. Please add URLs first.");
                } else {
                    println!("Checking {} URL(s) in the background...", registry.len());
                    let _ = scheduler.trigger_once();
                }
            }
            PromptCommand::Start(minutes) => {
                let interval = minutes
                    .map(display::interval_from_minutes)
                    .unwrap_or(default_interval);
                if registry.is_empty() {
                    println!("Please add at least one URL first");
                } else if scheduler.start(interval) {
                    println!(
                        "Monitoring started (checking every {})",
                        display::describe_interval(interval)
                    );
                } else {
                    println!("Monitoring is already running");
                }
            }
            PromptCommand::Stop => {
                if scheduler.stop() {
                    println!("Monitoring stopped");
                } else {
                    println!("Monitoring is not running");
                }
            }
            PromptCommand::Status => match scheduler.state() {
                SchedulerState::Running => println!(
                    "Status: Monitoring... ({} cycle(s) so far)",
                    scheduler.cycles_started()
                ),
                SchedulerState::Idle => println!("Status: Stopped"),
            },
            PromptCommand::History(limit) => match engine.store().recent(limit).await {
                Ok(entries) => display::print_history(&entries),
                Err(e) => println!("Error: {e}"),
            },
            PromptCommand::Help => print_help(),
            PromptCommand::Quit => break,
            PromptCommand::Unknown(input) => {
                println!("Unknown command: {input}. Type 'help' for commands or 'quit' to exit.")
            }
        }
    }

    println!("Goodbye!");
    scheduler.shutdown().await;
    printer.abort();
    Ok(())
}
