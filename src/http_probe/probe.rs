use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use reqwest::{Client, StatusCode};
use url::Url;

use super::prelude::*;
use super::report;

/// Timeout applied to a probe when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("statuswatch/", env!("CARGO_PKG_VERSION"));

/// Issues bounded-timeout GET requests and classifies what came back.
///
/// The inner `reqwest::Client` is shared, so cloning a prober is cheap and keeps the
/// connection pool.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    /// Builds a prober with its own HTTP client.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn probe(&self, url: &str) -> ProbeResult {
        probe_url(&self.client, url, self.timeout).await
    }
}

/// Probes a single URL with one GET request.
///
/// Never fails: every transport problem is mapped onto an [`Outcome`].
/// # Arguments
/// * `client` - The HTTP client used to send the request.
/// * `url` - The absolute URL to probe.
/// * `timeout` - Upper bound for the whole request, connect included.
/// # Returns
/// A `ProbeResult` stamped with the local time at which the outcome was known.
pub async fn probe_url(client: &Client, url: &str, timeout: Duration) -> ProbeResult {
    let parsed_url = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            // The request never left, so there is no response time to report.
            log::debug!("Refusing to probe malformed URL {url}: {e}");
            return ProbeResult {
                url: url.to_string(),
                status_code: None,
                response_time_seconds: None,
                outcome: Outcome::Error,
                error_message: Some(format!("Invalid URL: {e}")),
                timestamp: Local::now(),
            };
        }
    };

    let start = Instant::now();
    let response = client.get(parsed_url).timeout(timeout).send().await;
    let response_time_seconds = Some(round_millis(start.elapsed()));

    let (status_code, outcome, error_message) = match response {
        Ok(resp) if resp.status() == StatusCode::OK => {
            (Some(resp.status().as_u16()), Outcome::Success, None)
        }
        Ok(resp) => {
            let code = resp.status().as_u16();
            (Some(code), Outcome::Failed, Some(format!("HTTP {code}")))
        }
        Err(e) => {
            let (outcome, message) = classify_error(&e, timeout);
            log::debug!("Probe of {url} ended in {outcome}: {e}");
            (None, outcome, Some(message))
        }
    };

    ProbeResult {
        url: url.to_string(),
        status_code,
        response_time_seconds,
        outcome,
        error_message,
        timestamp: Local::now(),
    }
}

/// Maps a transport error onto an outcome and its message.
/// Timeouts take priority over connection failures, anything else is a generic error.
fn classify_error(err: &reqwest::Error, timeout: Duration) -> (Outcome, String) {
    if err.is_timeout() {
        (
            Outcome::Timeout,
            format!("Request timeout ({}s)", timeout.as_secs_f64()),
        )
    } else if err.is_connect() || is_connection_io_error(err) {
        (Outcome::ConnectionError, "Connection failed".to_string())
    } else {
        (Outcome::Error, report(err))
    }
}

/// Resets and aborts after the connection was up are still connection failures.
fn is_connection_io_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::BrokenPipe
            );
        }
        current = e.source();
    }
    false
}

fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}
