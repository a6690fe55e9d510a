//! Error types for portfolio X-ray operations.
//!
//! Every fallible operation in the crate returns [`XRayResult`]. The variants
//! mirror the stages of an analysis run so a host can tell the user which
//! input or which step failed.

use thiserror::Error;

/// Errors raised while building a portfolio or computing its risk profile.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XRayError {
    /// Caller-supplied portfolio data violates a structural invariant.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The market data provider failed outright.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Auto-healing exhausted the ticker set, or the history is too short.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A transformation produced an empty table where rows were required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Analysis configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result alias used throughout the crate.
pub type XRayResult<T> = Result<T, XRayError>;
