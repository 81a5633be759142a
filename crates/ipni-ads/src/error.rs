//! Error types for publishing.

use ipni_ads_core::{CodecError, ConfigurationError, CoreError, SigningError, ValidationError};
use ipni_ads_store::StoreError;
use thiserror::Error;

/// Errors that can occur while publishing advertisements.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Building, encoding or signing failed.
    #[error("advertisement error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsed but is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl From<ValidationError> for PublishError {
    fn from(e: ValidationError) -> Self {
        PublishError::Core(e.into())
    }
}

impl From<ConfigurationError> for PublishError {
    fn from(e: ConfigurationError) -> Self {
        PublishError::Core(e.into())
    }
}

impl From<SigningError> for PublishError {
    fn from(e: SigningError) -> Self {
        PublishError::Core(e.into())
    }
}

impl From<CodecError> for PublishError {
    fn from(e: CodecError) -> Self {
        PublishError::Core(e.into())
    }
}

/// Result type for publishing operations.
pub type Result<T> = std::result::Result<T, PublishError>;
