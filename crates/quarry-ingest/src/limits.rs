//! Capacity and inference policy.

/// Size governance and inference thresholds for one ingestion call.
///
/// A plain value type so policy is testable without a config file; the
/// defaults are the product limits.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum number of columns.
    pub max_columns: usize,
    /// Maximum number of data rows.
    pub max_rows: usize,
    /// Maximum estimated in-memory size of the parsed table, in bytes.
    pub max_bytes: usize,
    /// Values longer than this many characters are truncated with a marker.
    pub max_value_len: usize,
    /// Maximum length of a normalized column or table name.
    pub max_name_len: usize,
    /// How many non-null values per column feed type inference.
    pub sample_size: usize,
    /// Fraction of sampled values that must parse as integers for a column
    /// to be inferred INTEGER.
    pub integer_ratio: f64,
    /// Mean sampled length above which a string column is TEXT, not VARCHAR.
    pub text_mean_len: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_columns: 100,
            max_rows: 50_000,
            max_bytes: 50 * 1024 * 1024,
            max_value_len: 10_000,
            max_name_len: 64,
            sample_size: 100,
            integer_ratio: 0.8,
            text_mean_len: 100.0,
        }
    }
}
