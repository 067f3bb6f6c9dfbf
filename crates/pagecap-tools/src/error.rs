//! Error types for pagecap-tools

use thiserror::Error;

/// Tool error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid tool configuration
    #[error(transparent)]
    Core(#[from] pagecap_core::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
