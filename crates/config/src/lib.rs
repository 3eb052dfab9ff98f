//! Configuration for the Maxwell voice assistant
//!
//! Settings are layered: `config/default.yaml`, an optional environment
//! specific file, then `MAXWELL__`-prefixed environment variables.

pub mod prompt;
pub mod settings;

pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use settings::{
    load_settings, LiveConfig, LogConfig, MailConfig, ObservabilityConfig, RunMode, ServerConfig,
    Settings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
