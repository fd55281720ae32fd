pub mod app_config;
pub mod model;

pub use app_config::{ConfigError, build_config, load_config, validate};
pub use model::{AppConfig, NotificationConfig};
