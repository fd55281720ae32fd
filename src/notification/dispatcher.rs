use std::sync::Arc;
use std::time::Duration;

use super::{NoopNotifier, Notifier, detect_fallback, detect_notifier};
use crate::config::NotificationConfig;
use crate::http_probe::prelude::*;

pub const ALERT_TITLE: &str = "Server Status Alert";

/// What happened to an alert. Informational only, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDelivery {
    /// The outcome was a success, nothing to report.
    Skipped,
    /// Shown by the primary notifier.
    Primary,
    /// The primary notifier failed and the fallback showed it.
    Fallback,
    /// Both transports failed; the alert is lost.
    Dropped,
}

/// Turns unhealthy probe outcomes into user-facing alerts.
#[derive(Clone)]
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    fallback: Arc<dyn Notifier>,
    duration: Duration,
}

impl AlertDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, fallback: Arc<dyn Notifier>, duration: Duration) -> Self {
        Self {
            notifier,
            fallback,
            duration,
        }
    }

    /// Builds a dispatcher on whatever transports this machine offers.
    pub fn from_config(config: &NotificationConfig) -> Self {
        if !config.enabled {
            log::info!("Alerts are disabled");
            return Self::disabled();
        }
        Self::new(detect_notifier(), detect_fallback(), config.duration())
    }

    /// A dispatcher that never shows anything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopNotifier), Arc::new(NoopNotifier), Duration::ZERO)
    }

    /// Raises an alert for a non-success outcome.
    ///
    /// Best effort: failures of both transports are logged and dropped.
    pub async fn notify(
        &self,
        url: &str,
        outcome: Outcome,
        error_message: Option<&str>,
    ) -> AlertDelivery {
        if outcome.is_success() {
            return AlertDelivery::Skipped;
        }

        let body = alert_body(url, error_message);

        let primary_error = match self.notifier.show(ALERT_TITLE, &body, self.duration).await {
            Ok(()) => return AlertDelivery::Primary,
            Err(e) => e,
        };
        log::debug!("Alert for {url} not shown ({primary_error}), trying fallback");

        match self.fallback.show(ALERT_TITLE, &body, self.duration).await {
            Ok(()) => AlertDelivery::Fallback,
            Err(e) => {
                log::debug!("Fallback alert for {url} failed too: {e}");
                AlertDelivery::Dropped
            }
        }
    }

    /// Convenience wrapper for a whole result.
    pub async fn notify_result(&self, result: &ProbeResult) -> AlertDelivery {
        self.notify(&result.url, result.outcome, result.error_message.as_deref())
            .await
    }
}

fn alert_body(url: &str, error_message: Option<&str>) -> String {
    match error_message {
        Some(message) => format!("Server failed: {url}\nError: {message}"),
        None => format!("Server failed: {url}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{MockNotifier, NotificationError};

    fn dispatcher(primary: MockNotifier, fallback: MockNotifier) -> AlertDispatcher {
        AlertDispatcher::new(Arc::new(primary), Arc::new(fallback), Duration::from_secs(10))
    }

    #[test]
    fn test_alert_body() {
        assert_eq!(
            alert_body("https://a.example.com", Some("HTTP 500")),
            "Server failed: https://a.example.com\nError: HTTP 500"
        );
        assert_eq!(
            alert_body("https://a.example.com", None),
            "Server failed: https://a.example.com"
        );
    }

    #[tokio::test]
    async fn test_success_is_not_alerted() {
        let mut primary = MockNotifier::new();
        primary.expect_show().times(0);
        let mut fallback = MockNotifier::new();
        fallback.expect_show().times(0);

        let delivery = dispatcher(primary, fallback)
            .notify("https://a.example.com", Outcome::Success, None)
            .await;
        assert_eq!(delivery, AlertDelivery::Skipped);
    }

    #[tokio::test]
    async fn test_failure_uses_primary_notifier() {
        let mut primary = MockNotifier::new();
        primary
            .expect_show()
            .withf(|title, body, duration| {
                title == ALERT_TITLE
                    && body == "Server failed: https://a.example.com\nError: HTTP 500"
                    && *duration == Duration::from_secs(10)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut fallback = MockNotifier::new();
        fallback.expect_show().times(0);

        let delivery = dispatcher(primary, fallback)
            .notify("https://a.example.com", Outcome::Failed, Some("HTTP 500"))
            .await;
        assert_eq!(delivery, AlertDelivery::Primary);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_once() {
        let mut primary = MockNotifier::new();
        primary
            .expect_show()
            .times(1)
            .returning(|_, _, _| Err(NotificationError::Unavailable));
        let mut fallback = MockNotifier::new();
        fallback.expect_show().times(1).returning(|_, _, _| Ok(()));

        let delivery = dispatcher(primary, fallback)
            .notify("https://a.example.com", Outcome::Timeout, Some("Request timeout (10s)"))
            .await;
        assert_eq!(delivery, AlertDelivery::Fallback);
    }

    #[tokio::test]
    async fn test_both_failures_are_swallowed() {
        let mut primary = MockNotifier::new();
        primary.expect_show().times(1).returning(|_, _, _| {
            Err(NotificationError::Failed {
                program: "notify-send".to_string(),
                status: "exit status: 1".to_string(),
            })
        });
        let mut fallback = MockNotifier::new();
        fallback
            .expect_show()
            .times(1)
            .returning(|_, _, _| Err(NotificationError::Unavailable));

        let delivery = dispatcher(primary, fallback)
            .notify("https://a.example.com", Outcome::ConnectionError, Some("Connection failed"))
            .await;
        assert_eq!(delivery, AlertDelivery::Dropped);
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_drops_alerts() {
        let delivery = AlertDispatcher::disabled()
            .notify("https://a.example.com", Outcome::Error, Some("boom"))
            .await;
        assert_eq!(delivery, AlertDelivery::Dropped);
    }
}
