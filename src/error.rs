//! Error types for registry lookups
//!
//! Every failure inside the navigator, extractor, classifier and sinks is
//! converted into a [`LookupError`] at the component boundary. Raw
//! chromiumoxide, reqwest or sqlx errors never leave their module.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for lookup operations
pub type LookupResult<T> = Result<T, LookupError>;

/// Error types for lookup operations
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The search surface could not be reached or interacted with
    #[error("Navigation failed: {cause}")]
    NavigationFailed { cause: String },

    /// A bounded wait was exceeded
    #[error("Timed out after {waited:?} waiting for {stage}")]
    Timeout { stage: &'static str, waited: Duration },

    /// A document was obtained but nothing usable could be read from it
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// The record sink rejected a write (never fatal for a lookup)
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// Input is not a 10 or 12 digit INN
    #[error("Invalid INN '{0}': expected 10 or 12 digits")]
    InvalidIdentifier(String),

    /// Cancellation token fired while the lookup was running or queued
    #[error("Lookup cancelled")]
    Cancelled,

    /// Requested data is not available for this identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid profile or timing configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl LookupError {
    pub(crate) fn navigation(cause: impl std::fmt::Display) -> Self {
        Self::NavigationFailed {
            cause: cause.to_string(),
        }
    }

    /// Failure kind reported in a [`LookupOutcome`](crate::LookupOutcome)
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NavigationFailed { .. } => FailureKind::NavigationFailed,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::ExtractionFailed(_) => FailureKind::ExtractionFailed,
            Self::InvalidIdentifier(_) => FailureKind::InvalidIdentifier,
            Self::Cancelled => FailureKind::Cancelled,
            Self::PersistenceFailed(_)
            | Self::NotFound(_)
            | Self::Config(_)
            | Self::Unexpected(_) => FailureKind::Unexpected,
        }
    }
}

impl From<anyhow::Error> for LookupError {
    fn from(error: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::Unexpected(format!("{error:#}"))
    }
}

/// Failure category carried by a failed lookup outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NavigationFailed,
    Timeout,
    ExtractionFailed,
    InvalidIdentifier,
    Cancelled,
    Unexpected,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NavigationFailed => "navigation_failed",
            Self::Timeout => "timeout",
            Self::ExtractionFailed => "extraction_failed",
            Self::InvalidIdentifier => "invalid_identifier",
            Self::Cancelled => "cancelled",
            Self::Unexpected => "unexpected",
        };
        f.write_str(label)
    }
}
