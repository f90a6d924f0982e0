//! Crate-wide error taxonomy.
//!
//! Risk denials and sizing rejections are ordinary decision outcomes
//! (`Decision::Denied` / `SizingOutcome::Rejected`), not `PrmError`; they
//! stay observable as plain data for telemetry, not swallowed by `?`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrmError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolated(String),
}

impl PrmError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        PrmError::InvalidInput(msg.into())
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        PrmError::InsufficientData(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        PrmError::InvariantViolated(msg.into())
    }
}
