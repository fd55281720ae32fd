//! Error types for the notification capability.

use thiserror::Error;

/// Reasons a notification could not be shown.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No transport exists on this machine.
    #[error("No notification transport is available")]
    Unavailable,

    /// The platform command could not be started.
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The platform command ran but reported a failure.
    #[error("{program} exited with {status}")]
    Failed { program: String, status: String },

    /// The platform command hung.
    #[error("{program} did not finish within {seconds}s")]
    TimedOut { program: String, seconds: u64 },
}
