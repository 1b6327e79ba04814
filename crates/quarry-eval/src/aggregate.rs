//! Aggregate computation over row buckets.

use quarry_core::{lookup, AggregateFunction, Row, Value};

/// Compute one aggregate over a bucket of rows.
///
/// COUNT counts rows for `*` and non-null values otherwise. The numeric
/// aggregates operate over numeric coercions of the named column, ignoring
/// non-numeric and null values; SUM of nothing is `0`, while AVG/MIN/MAX of
/// nothing is null.
pub fn compute(function: AggregateFunction, column: &str, rows: &[Row]) -> Value {
    match function {
        AggregateFunction::Count => {
            let count = if column == "*" {
                rows.len()
            } else {
                rows.iter()
                    .filter_map(|row| lookup(row, column))
                    .filter(|v| !v.is_null())
                    .count()
            };
            Value::Int(count as i64)
        }
        AggregateFunction::Sum => narrow(numerics(rows, column).sum()),
        AggregateFunction::Avg => {
            let values: Vec<f64> = numerics(rows, column).collect();
            if values.is_empty() {
                Value::Null
            } else {
                Value::Float(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        AggregateFunction::Min => numerics(rows, column)
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.min(v))))
            .map_or(Value::Null, narrow),
        AggregateFunction::Max => numerics(rows, column)
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))))
            .map_or(Value::Null, narrow),
    }
}

fn numerics<'a>(rows: &'a [Row], column: &'a str) -> impl Iterator<Item = f64> + 'a {
    rows.iter()
        .filter_map(move |row| lookup(row, column))
        .filter_map(Value::as_f64)
}

/// Integral results collapse back to `Int` so previews show `45`, not `45.0`.
fn narrow(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Int(value as i64)
    } else {
        Value::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::Value;

    fn rows(values: &[Value]) -> Vec<Row> {
        values
            .iter()
            .map(|v| [("n".to_string(), v.clone())].into_iter().collect())
            .collect()
    }

    #[test]
    fn test_count_star_counts_rows() {
        let bucket = rows(&[Value::Int(1), Value::Null, Value::Int(3)]);
        assert_eq!(
            compute(AggregateFunction::Count, "*", &bucket),
            Value::Int(3)
        );
    }

    #[test]
    fn test_count_column_skips_nulls() {
        let bucket = rows(&[Value::Int(1), Value::Null, Value::Int(3)]);
        assert_eq!(
            compute(AggregateFunction::Count, "n", &bucket),
            Value::Int(2)
        );
    }

    #[test]
    fn test_sum_ignores_non_numeric() {
        let bucket = rows(&[Value::Int(10), Value::Text("x".into()), Value::Int(5)]);
        assert_eq!(compute(AggregateFunction::Sum, "n", &bucket), Value::Int(15));
    }

    #[test]
    fn test_avg_is_float_when_fractional() {
        let bucket = rows(&[Value::Int(1), Value::Int(2)]);
        assert_eq!(
            compute(AggregateFunction::Avg, "n", &bucket),
            Value::Float(1.5)
        );
        assert_eq!(compute(AggregateFunction::Avg, "missing", &bucket), Value::Null);
    }

    #[test]
    fn test_min_max() {
        let bucket = rows(&[Value::Int(7), Value::Int(2), Value::Int(9)]);
        assert_eq!(compute(AggregateFunction::Min, "n", &bucket), Value::Int(2));
        assert_eq!(compute(AggregateFunction::Max, "n", &bucket), Value::Int(9));
    }

    #[test]
    fn test_numeric_text_coerces() {
        let bucket = rows(&[Value::Text("4".into()), Value::Text("2.5".into())]);
        assert_eq!(
            compute(AggregateFunction::Sum, "n", &bucket),
            Value::Float(6.5)
        );
    }
}
