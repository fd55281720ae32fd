use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

/// Configuration for the status watcher.
/// Every field has a default, so an empty YAML document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path of the flat text file holding one monitored URL per line.
    pub urls_file: PathBuf,

    /// SQLite URL of the result log, e.g. `sqlite://status_log.db`.
    pub database_url: String,

    /// Pause between two scheduled check cycles, in seconds.
    pub interval_seconds: u64,

    /// Upper bound for a single probe, in seconds.
    pub timeout_seconds: u64,

    /// Desktop alert settings.
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// When false no alert is shown at all, not even the fallback dialog.
    pub enabled: bool,

    /// How long a toast stays on screen, in seconds.
    pub duration_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            urls_file: PathBuf::from("urls.txt"),
            database_url: "sqlite://status_log.db".to_string(),
            interval_seconds: 60,
            timeout_seconds: 10,
            notifications: NotificationConfig::default(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_seconds: 10,
        }
    }
}

impl AppConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl NotificationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }
}
