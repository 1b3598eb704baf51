pub mod app_config;
pub mod config;
pub mod records;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::OutputRecord;

use thiserror::Error;

/// Maximum number of records the downstream storage API accepts per request.
pub const MAX_UPLOAD_BATCH_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
