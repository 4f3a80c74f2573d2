//! Error types for the hub core.

use thiserror::Error;

/// Configuration loading and validation errors.
///
/// These are startup errors: the daemon refuses to run on any of them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("{var} is not a valid number: {value}")]
    NotANumber { var: &'static str, value: String },

    #[error("HUB_API_KEY must be set explicitly when HUB_ENV=production")]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
