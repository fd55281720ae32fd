use std::time::Duration;

use statuswatch::{CycleReport, ProbeResult, store::LogEntry};

const MAX_URL_WIDTH: usize = 60;

pub fn to_fixed_width(input: &str, width: usize) -> String {
    use unicode_truncate::UnicodeTruncateStr;

    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

fn url_width<'a>(urls: impl Iterator<Item = &'a str>) -> usize {
    urls.map(str::len).max().unwrap_or(10).min(MAX_URL_WIDTH)
}

fn marker(result: &ProbeResult) -> &'static str {
    if result.is_success() { "✅" } else { "❌" }
}

fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// One console line for a probe result, plus an error line when there is one.
pub fn format_result(result: &ProbeResult, width: usize) -> String {
    let mut line = format!(
        "  {} {} Status: {} | Code: {} | Time: {}",
        marker(result),
        to_fixed_width(&result.url, width),
        result.outcome,
        or_na(result.status_code),
        or_na(result.response_time_seconds.map(|t| format!("{t}s"))),
    );
    if let Some(error) = &result.error_message {
        line.push_str(&format!("\n    Error: {error}"));
    }
    line
}

pub fn print_report(report: &CycleReport) {
    if report.is_empty() {
        println!("No URLs to check. Please add URLs first.");
        return;
    }

    println!(
        "\n[{}] Checked {} URL(s), {} unhealthy",
        report.started_at.format("%Y-%m-%d %H:%M:%S"),
        report.results.len(),
        report.failures()
    );
    let width = url_width(report.results.iter().map(|r| r.url.as_str()));
    for result in &report.results {
        println!("{}", format_result(result, width));
    }
    for url in &report.unlogged {
        println!("  ⚠ Result for {url} could not be written to the log");
    }
}

pub fn print_urls(urls: &[String]) {
    if urls.is_empty() {
        println!("No URLs added yet.");
        return;
    }
    println!("\nMonitored URLs:");
    for (i, url) in urls.iter().enumerate() {
        println!("  {}. {url}", i + 1);
    }
    println!();
}

pub fn print_history(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No checks logged yet.");
        return;
    }
    let width = url_width(entries.iter().map(|e| e.result.url.as_str()));
    for entry in entries {
        println!(
            "[{}]{}",
            entry.result.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format_result(&entry.result, width)
        );
    }
}

/// Minutes as typed by the user, saturating instead of overflowing.
pub fn interval_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// "1 minute(s)" for whole minutes, seconds otherwise.
pub fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs > 0 && secs % 60 == 0 {
        format!("{} minute(s)", secs / 60)
    } else {
        format!("{secs} second(s)")
    }
}
