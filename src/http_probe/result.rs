use std::{fmt, str::FromStr};

use chrono::{DateTime, Local};

/// Classified outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failed,
    Timeout,
    ConnectionError,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed => "failed",
            Outcome::Timeout => "timeout",
            Outcome::ConnectionError => "connection_error",
            Outcome::Error => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Outcome::Success),
            "failed" => Ok(Outcome::Failed),
            "timeout" => Ok(Outcome::Timeout),
            "connection_error" => Ok(Outcome::ConnectionError),
            "error" => Ok(Outcome::Error),
            other => Err(format!("unknown outcome '{other}'")),
        }
    }
}

/// The record produced once per probe attempt.
///
/// `status_code` is set only when an HTTP response came back and `error_message`
/// is set for every outcome other than [`Outcome::Success`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub url: String,
    pub status_code: Option<u16>,
    pub response_time_seconds: Option<f64>,
    pub outcome: Outcome,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_round_trips_through_its_tag() {
        for outcome in [
            Outcome::Success,
            Outcome::Failed,
            Outcome::Timeout,
            Outcome::ConnectionError,
            Outcome::Error,
        ] {
            assert_eq!(outcome.as_str().parse::<Outcome>(), Ok(outcome));
        }
    }

    #[test]
    fn test_outcome_tags_are_snake_case() {
        assert_eq!(Outcome::ConnectionError.as_str(), "connection_error");
        assert_eq!(Outcome::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_result_keeps_local_timestamp() {
        let timestamp = Local::now();
        let result = ProbeResult {
            url: "https://example.com".to_string(),
            status_code: Some(200),
            response_time_seconds: Some(0.1),
            outcome: Outcome::Success,
            error_message: None,
            timestamp,
        };
        assert!(result.is_success());
        assert_eq!(result.clone().timestamp, timestamp);
    }

    #[test]
    fn test_unknown_outcome_tag_is_rejected() {
        assert!("unknown".parse::<Outcome>().is_err());
    }
}
