//! Configuration validation
//!
//! Validates configuration values and ensures consistency

use thiserror::Error;

use crate::Config;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid log level: {0} (must be one of: trace, debug, info, warn, error)")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0} (must be one of: pretty, compact, json)")]
    InvalidLogFormat(String),

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type alias for validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Validate complete configuration
pub fn validate(config: &Config) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_logging(&config.logging) {
        errors.push(e);
    }

    if let Some(format) = &config.log_format
        && let Err(e) = validate_log_format(format)
    {
        errors.push(e);
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validate logging level
pub fn validate_logging(level: &str) -> Result<()> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::InvalidLogLevel(level.to_string())),
    }
}

/// Validate log output format
pub fn validate_log_format(format: &str) -> Result<()> {
    match format.to_lowercase().as_str() {
        "pretty" | "compact" | "json" => Ok(()),
        _ => Err(ValidationError::InvalidLogFormat(format.to_string())),
    }
}
