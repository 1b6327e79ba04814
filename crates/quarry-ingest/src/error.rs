//! Ingestion error types.

use thiserror::Error;

/// Ingestion error type. Every variant is fatal to the ingestion call that
/// raised it; there are no partial results.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input contains no rows at all.
    #[error("input contains no data")]
    Empty,

    /// The input is not parseable as comma-delimited text.
    #[error("unparseable input: {reason}")]
    Format {
        /// What made the input unparseable
        reason: String,
    },

    /// A size limit was exceeded, with the measured value so callers can
    /// explain the rejection.
    #[error("{what} limit exceeded: {measured} (max {limit})")]
    Capacity {
        /// Which limit tripped
        what: &'static str,
        /// Measured value
        measured: usize,
        /// Configured maximum
        limit: usize,
    },
}

impl IngestError {
    /// Create a format error.
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }
}

/// Specialized Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;
