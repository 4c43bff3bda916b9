//! Error types for the snap/dust core.
//!
//! None of these halt the frame loop.  `MissingData` and `DegenerateInput`
//! are skipped with a status message; `InvalidSession` is logged loudly and
//! answered with a forced reset.

use thiserror::Error;

/// Errors surfaced by the core.
#[derive(Error, Debug)]
pub enum DustError {
    /// No landmarks were available for the requested operation.
    #[error("no landmarks available for {0}")]
    MissingData(&'static str),

    /// Fewer hand landmarks than the evaluator needs.
    #[error("degenerate hand: need {needed} landmarks, got {found}")]
    DegenerateInput { needed: usize, found: usize },

    /// Disintegration mode without a live physics world.
    #[error("disintegrating without an active physics world")]
    InvalidSession,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for DustError {
    fn from(e: toml::de::Error) -> Self {
        DustError::Config(e.to_string())
    }
}

/// Result type for core operations.
pub type DustResult<T> = Result<T, DustError>;
