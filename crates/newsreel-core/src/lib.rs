pub mod app_config;
pub mod config;
pub mod notify;
pub mod schedule;

pub use app_config::{AppConfig, ArchiveSettings, EndpointSettings, PollSettings};
pub use config::{load_app_config, load_app_config_from_env};
pub use notify::Notices;
pub use schedule::{Schedule, ScheduleError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
