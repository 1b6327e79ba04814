//! Store error types.

use thiserror::Error;

/// Row store error type.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No row source is registered under the requested name.
    ///
    /// Non-fatal by contract: the evaluator catches this and yields an
    /// empty result so previews never crash.
    #[error("unknown row source '{table}' (available: {})", available.join(", "))]
    UnknownSource {
        /// The name that failed to resolve
        table: String,
        /// Names that would have resolved
        available: Vec<String>,
    },
}

/// Specialized Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
