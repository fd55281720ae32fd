//! # Alerting
//!
//! Local alerts for unhealthy endpoints. The [`Notifier`] trait is the narrow capability
//! the engine talks to. Which implementation backs it is decided once, at construction:
//!
//! - [`DesktopNotifier`]: a toast through the platform's notification command.
//! - [`ModalNotifier`]: a dialog box, used as the fallback transport.
//! - [`NoopNotifier`]: stands in when no transport exists; it always reports
//!   [`NotificationError::Unavailable`].
//!
//! The [`AlertDispatcher`] never sees which variant it holds. It calls the primary
//! notifier, falls back once on failure and swallows whatever is left.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub mod desktop;
pub mod dispatcher;
pub mod error;

pub use desktop::{DesktopNotifier, ModalNotifier};
pub use dispatcher::{AlertDelivery, AlertDispatcher};
pub use error::NotificationError;

/// Something that can put a message in front of the user.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Shows `body` under `title` for roughly `duration`.
    async fn show(
        &self,
        title: &str,
        body: &str,
        duration: Duration,
    ) -> Result<(), NotificationError>;
}

/// Notifier used when no transport is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn show(
        &self,
        _title: &str,
        _body: &str,
        _duration: Duration,
    ) -> Result<(), NotificationError> {
        Err(NotificationError::Unavailable)
    }
}

/// Picks the toast notifier, or the no-op one when the platform has none.
pub fn detect_notifier() -> Arc<dyn Notifier> {
    match DesktopNotifier::detect() {
        Some(notifier) => Arc::new(notifier),
        None => {
            log::warn!("Desktop notifications are unavailable, alerts will use the fallback");
            Arc::new(NoopNotifier)
        }
    }
}

/// Picks the modal fallback, or the no-op one when the platform has none.
pub fn detect_fallback() -> Arc<dyn Notifier> {
    match ModalNotifier::detect() {
        Some(notifier) => Arc::new(notifier),
        None => {
            log::debug!("No modal alert transport found");
            Arc::new(NoopNotifier)
        }
    }
}
