//! Tabular data ingestion for Quarry.
//!
//! Converts raw delimited text into a typed `(Schema, rows)` pair without
//! any user-supplied schema:
//!
//! 1. Tokenize comma-delimited text (RFC-4180 quoting, embedded newlines,
//!    `""` escapes) through the `csv` crate.
//! 2. Normalize header names into safe, unique column identifiers.
//! 3. Infer a logical type per column from a bounded sample of its values.
//! 4. Coerce every value to its column's type, padding short rows with
//!    nulls and truncating long ones.
//!
//! Ingestion fails closed on capacity: column, row and byte limits are
//! checked while parsing, before memory is committed. Malformed rows are
//! tolerated and tallied, never fatal.
//!
//! # Example
//!
//! ```
//! use quarry_ingest::{ingest, Limits};
//!
//! let text = "name,age\nAlice,25\nBruno,40\n";
//! let ingested = ingest(text, "people", &Limits::default()).unwrap();
//!
//! assert_eq!(ingested.schema.name(), "people");
//! assert_eq!(ingested.rows.len(), 2);
//! ```

pub mod error;
pub mod infer;
pub mod limits;
pub mod normalize;

mod pipeline;

// Re-exports for convenience
pub use error::{IngestError, IngestResult};
pub use limits::Limits;
pub use pipeline::{ingest, IngestStats, Ingested};
