//! Per-column type inference and value coercion.
//!
//! Inference samples a bounded prefix of each column's non-null values and
//! tests increasingly general shapes: boolean, integer, timestamp, date,
//! then TEXT/VARCHAR by mean length. Coercion then forces every stored
//! value into the inferred type so the evaluator never sees mixed columns.

use crate::limits::Limits;
use once_cell::sync::Lazy;
use quarry_core::{ColumnType, Value};
use regex::Regex;

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}$").expect("timestamp pattern")
});

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern"));

const TRUTHY: &[&str] = &["true", "yes", "1", "t", "y"];
const FALSY: &[&str] = &["false", "no", "0", "f", "n"];

fn is_boolish(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    TRUTHY.contains(&lower.as_str()) || FALSY.contains(&lower.as_str())
}

fn is_integer(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok()
}

/// Infer the logical type of one column from its sampled non-null values.
/// An all-null column defaults to VARCHAR.
pub fn infer_column_type(sample: &[&str], limits: &Limits) -> ColumnType {
    if sample.is_empty() {
        return ColumnType::Varchar;
    }

    if sample.iter().all(|v| is_boolish(v)) {
        return ColumnType::Boolean;
    }

    let integers = sample.iter().filter(|v| is_integer(v)).count();
    if integers as f64 / sample.len() as f64 >= limits.integer_ratio {
        return ColumnType::Integer;
    }

    if sample.iter().all(|v| TIMESTAMP_RE.is_match(v.trim())) {
        return ColumnType::Timestamp;
    }

    if sample.iter().all(|v| DATE_RE.is_match(v.trim())) {
        return ColumnType::Date;
    }

    let mean_len =
        sample.iter().map(|v| v.chars().count()).sum::<usize>() as f64 / sample.len() as f64;
    if mean_len > limits.text_mean_len {
        ColumnType::Text
    } else {
        ColumnType::Varchar
    }
}

/// Coerce one raw field into its column's type. Returns the value and
/// whether it was truncated. Integer parse failures coerce to `0` so a
/// mostly-numeric column never propagates NaN downstream.
pub fn coerce(raw: &str, column_type: ColumnType, limits: &Limits) -> (Value, bool) {
    if raw.is_empty() {
        return (Value::Null, false);
    }

    match column_type {
        ColumnType::Integer => {
            let n = raw.trim().parse::<i64>().unwrap_or(0);
            (Value::Int(n), false)
        }
        ColumnType::Boolean => {
            let truthy = TRUTHY.contains(&raw.trim().to_lowercase().as_str());
            (Value::Bool(truthy), false)
        }
        ColumnType::Varchar | ColumnType::Text | ColumnType::Date | ColumnType::Timestamp => {
            if raw.chars().count() > limits.max_value_len {
                let mut cut: String = raw.chars().take(limits.max_value_len).collect();
                cut.push('…');
                (Value::Text(cut), true)
            } else {
                (Value::Text(raw.to_string()), false)
            }
        }
    }
}
