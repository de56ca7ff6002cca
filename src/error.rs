//! Error type shared by the solver, storage, and binaries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    /// Rounds or grid resolution out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A table file whose header or size does not match what was expected.
    #[error("invalid table file: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, PricingError>;
