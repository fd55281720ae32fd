use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::AppConfig;

const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value '{value}' for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Load the application configuration from a YAML file and environment variables.
/// The file is taken from the `CONFIG_FILE` environment variable and falls back to
/// `config.yml`; only an explicitly named file has to exist. Environment variables
/// override whatever the file says.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let (path, explicit) = match env::var("CONFIG_FILE") {
        Ok(path) => (PathBuf::from(path), true),
        Err(_) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let yaml = read_config_file(&path, explicit)?;
    let config = build_config(yaml.as_deref(), |key| env::var(key).ok())?;

    log::info!(
        "Using URL list {} and result log {}",
        config.urls_file.display(),
        config.database_url
    );

    Ok(config)
}

fn read_config_file(path: &Path, explicit: bool) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            log::debug!("No {} found, using defaults", path.display());
            Ok(None)
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Builds the configuration from optional YAML text and an environment lookup.
/// # Arguments
/// * `yaml` - Contents of the config file, if there is one.
/// * `lookup` - Resolves an environment variable name to its value.
///
/// # Examples
/// ```
/// use statuswatch::config::build_config;
///
/// let config = build_config(Some("interval_seconds: 120"), |_| None).unwrap();
/// assert_eq!(config.interval_seconds, 120);
/// assert_eq!(config.timeout_seconds, 10);
/// ```
pub fn build_config<F>(yaml: Option<&str>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match yaml {
        Some(text) if !text.trim().is_empty() => serde_yaml::from_str(text)?,
        _ => AppConfig::default(),
    };

    if let Some(urls_file) = lookup("URLS_FILE") {
        config.urls_file = PathBuf::from(urls_file);
    }
    if let Some(database_url) = lookup("DATABASE_URL") {
        config.database_url = database_url;
    }
    if let Some(value) = lookup("CHECK_INTERVAL_SECONDS") {
        config.interval_seconds = parse_env("CHECK_INTERVAL_SECONDS", value)?;
    }
    if let Some(value) = lookup("PROBE_TIMEOUT_SECONDS") {
        config.timeout_seconds = parse_env("PROBE_TIMEOUT_SECONDS", value)?;
    }
    if let Some(value) = lookup("NOTIFICATIONS_ENABLED") {
        config.notifications.enabled = parse_env("NOTIFICATIONS_ENABLED", value)?;
    }

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.interval_seconds == 0 {
        return Err(ConfigError::Zero("interval_seconds"));
    }
    if config.timeout_seconds == 0 {
        return Err(ConfigError::Zero("timeout_seconds"));
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
