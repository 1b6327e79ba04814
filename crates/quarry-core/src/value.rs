//! Scalar values and rows.
//!
//! A [`Row`] maps column names to [`Value`]s. Joined rows additionally carry
//! table-qualified keys (`table.column`), which is why [`lookup`] resolves a
//! column reference in two steps: exact key first, then a qualified suffix
//! match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A typed scalar stored in a row.
///
/// Dates and timestamps are carried as [`Value::Text`] in their canonical
/// string form. [`Value::Float`] only appears as an aggregate result (AVG,
/// or SUM over non-integral data); ingestion never produces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl Value {
    /// True for `Null` and for the empty string, which the evaluator's
    /// `IS NULL` semantics treat as absent.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion: integers, floats, and numeric-looking text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Canonical display text. `Null` renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Text(s) => s.clone(),
            Value::Null => String::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// Floats compare and hash by bit pattern so values can key group buckets.
// Bucket keys come from a single row set, so bitwise equality is exact-value
// equality there.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Int(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Text(s) => s.hash(state),
            Value::Null => {}
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// A single table row. `BTreeMap` keeps key iteration deterministic, which
/// the evaluator relies on for DISTINCT dedup and first-match lookups.
pub type Row = BTreeMap<String, Value>;

/// Resolve a column reference against a row.
///
/// Two-step lookup: the exact key wins; otherwise the first key ending in
/// `.column` (a table-qualified match) is used. Ambiguity between qualified
/// keys is resolved by key order.
pub fn lookup<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    if let Some(v) = row.get(column) {
        return Some(v);
    }
    let suffix = format!(".{column}");
    row.iter()
        .find(|(key, _)| key.ends_with(&suffix))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_null_semantics() {
        assert!(Value::Null.is_null());
        assert!(Value::Text(String::new()).is_null());
        assert!(!Value::Text("x".into()).is_null());
        assert!(!Value::Int(0).is_null());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int(25).as_f64(), Some(25.0));
        assert_eq!(Value::Text(" 2.5 ".into()).as_f64(), Some(2.5));
        assert_eq!(Value::Text("abc".into()).as_f64(), None);
        assert_eq!(Value::Bool(true).as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Int(25).render(), "25");
        assert_eq!(Value::Float(2.5).render(), "2.5");
        assert_eq!(Value::Bool(false).render(), "false");
        assert_eq!(Value::Null.render(), "");
    }

    #[test]
    fn test_lookup_exact_before_qualified() {
        let r = row(&[
            ("id", Value::Int(1)),
            ("users.id", Value::Int(1)),
            ("orders.id", Value::Int(7)),
        ]);
        assert_eq!(lookup(&r, "id"), Some(&Value::Int(1)));
        assert_eq!(lookup(&r, "orders.id"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_lookup_qualified_fallback() {
        let r = row(&[("orders.total", Value::Int(90))]);
        assert_eq!(lookup(&r, "total"), Some(&Value::Int(90)));
        assert_eq!(lookup(&r, "missing"), None);
    }

    #[test]
    fn test_untagged_serialization() {
        assert_eq!(serde_json::to_string(&Value::Int(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&Value::Text("a".into())).unwrap(),
            "\"a\""
        );
    }
}
