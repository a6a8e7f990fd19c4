//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port, upload size, capture size)
//! - Check that the log level names a known severity
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::AppConfig;
use crate::observability::Severity;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.port must be between 1 and 65535, got {0}")]
    InvalidPort(u32),

    #[error("uploads.max_file_size_mb must be greater than 0")]
    ZeroUploadSize,

    #[error("server.log_level {0:?} is not one of debug, info, warn, error, fatal")]
    InvalidLogLevel(String),

    #[error("request_logging.max_body_size must be greater than 0")]
    ZeroBodySize,
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !(1..=65535).contains(&config.server.port) {
        errors.push(ValidationError::InvalidPort(config.server.port));
    }

    if config.uploads.max_file_size_mb == 0 {
        errors.push(ValidationError::ZeroUploadSize);
    }

    if config.server.log_level.parse::<Severity>().is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.server.log_level.clone()));
    }

    if config.request_logging.max_body_size == Some(0) {
        errors.push(ValidationError::ZeroBodySize);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
