//! The ingestion pipeline: tokenize, normalize, infer, coerce.

use crate::error::{IngestError, IngestResult};
use crate::infer::{coerce, infer_column_type};
use crate::limits::Limits;
use crate::normalize::{dedupe, normalize_header, sanitize_label};
use quarry_core::{ColumnDef, Row, Schema};
use tracing::{debug, warn};

/// A fully ingested table.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub schema: Schema,
    pub rows: Vec<Row>,
    pub stats: IngestStats,
}

/// Diagnostics collected while parsing. Malformed rows are tolerated, not
/// fatal; the tally is surfaced so the UI can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub row_count: usize,
    pub column_count: usize,
    /// Rows with fewer or more fields than the header.
    pub malformed_rows: usize,
    /// Fully empty rows dropped outright.
    pub skipped_empty: usize,
    /// Values cut down to the length limit.
    pub truncated_values: usize,
    /// Estimated in-memory size of the raw field data.
    pub approx_bytes: usize,
}

/// Ingest raw delimited text into a typed table.
///
/// The table label is sanitized into `Schema::name`; namespacing the store
/// key is [`quarry_core::RowStore::insert_ingested`]'s job.
pub fn ingest(text: &str, label: &str, limits: &Limits) -> IngestResult<Ingested> {
    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }
    check_delimiter(text)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| IngestError::format(e.to_string()))?,
        None => return Err(IngestError::Empty),
    };
    if header.len() > limits.max_columns {
        return Err(IngestError::Capacity {
            what: "column",
            measured: header.len(),
            limit: limits.max_columns,
        });
    }

    let names = dedupe(
        header
            .iter()
            .enumerate()
            .map(|(i, raw)| normalize_header(raw, i, limits.max_name_len))
            .collect(),
    );
    let width = names.len();

    let mut stats = IngestStats {
        column_count: width,
        ..IngestStats::default()
    };

    // Collect raw fields, padded or truncated to the header width.
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in records {
        let record = record.map_err(|e| IngestError::format(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            stats.skipped_empty += 1;
            continue;
        }
        if record.len() != width {
            stats.malformed_rows += 1;
        }

        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        fields.resize(width, String::new());

        stats.approx_bytes += fields.iter().map(String::len).sum::<usize>();
        raw_rows.push(fields);

        if raw_rows.len() > limits.max_rows {
            return Err(IngestError::Capacity {
                what: "row",
                measured: raw_rows.len(),
                limit: limits.max_rows,
            });
        }
        if stats.approx_bytes > limits.max_bytes {
            return Err(IngestError::Capacity {
                what: "size",
                measured: stats.approx_bytes,
                limit: limits.max_bytes,
            });
        }
    }
    stats.row_count = raw_rows.len();

    // Infer a type per column from a bounded sample of non-null values.
    let columns: Vec<ColumnDef> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let sample: Vec<&str> = raw_rows
                .iter()
                .map(|row| row[i].as_str())
                .filter(|v| !v.is_empty())
                .take(limits.sample_size)
                .collect();
            let column_type = infer_column_type(&sample, limits);
            let nullable = raw_rows.iter().any(|row| row[i].is_empty());
            ColumnDef::new(name.clone(), column_type, nullable)
        })
        .collect();

    // Coerce every field to its column's inferred type.
    let rows: Vec<Row> = raw_rows
        .iter()
        .map(|fields| {
            columns
                .iter()
                .zip(fields)
                .map(|(col, raw)| {
                    let (value, truncated) = coerce(raw, col.column_type, limits);
                    if truncated {
                        stats.truncated_values += 1;
                    }
                    (col.name.clone(), value)
                })
                .collect()
        })
        .collect();

    if stats.malformed_rows > 0 {
        warn!(
            malformed = stats.malformed_rows,
            "accepted rows with mismatched field counts"
        );
    }

    let schema = Schema::new(sanitize_label(label, limits.max_name_len), columns);
    debug!(
        table = schema.name(),
        rows = stats.row_count,
        columns = stats.column_count,
        bytes = stats.approx_bytes,
        "ingested table"
    );

    Ok(Ingested {
        schema,
        rows,
        stats,
    })
}

/// The delimiter is comma-only: refuse input that is denser in semicolons
/// or tabs than commas instead of guessing.
fn check_delimiter(text: &str) -> IngestResult<()> {
    let commas = text.matches(',').count();
    let semicolons = text.matches(';').count();
    let tabs = text.matches('\t').count();
    if semicolons > commas || tabs > commas {
        return Err(IngestError::format(format!(
            "expected comma-delimited input ({semicolons} semicolons, {tabs} tabs, {commas} commas)"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{ColumnType, Value};

    fn ingest_default(text: &str) -> Ingested {
        ingest(text, "upload", &Limits::default()).unwrap()
    }

    fn column_types(ingested: &Ingested) -> Vec<ColumnType> {
        ingested
            .schema
            .columns()
            .iter()
            .map(|c| c.column_type)
            .collect()
    }

    // =========================================================================
    // Tokenization
    // =========================================================================

    #[test]
    fn test_basic_table() {
        let out = ingest_default("name,age\nAlice,25\nBruno,40\n");
        assert_eq!(out.schema.name(), "upload");
        assert_eq!(
            column_types(&out),
            vec![ColumnType::Varchar, ColumnType::Integer]
        );
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[1].get("age"), Some(&Value::Int(40)));
    }

    #[test]
    fn test_quoted_fields_with_embedded_delimiters_and_newlines() {
        let text = "note,count\n\"hello, world\",1\n\"line one\nline two\",2\n";
        let out = ingest_default(text);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(
            out.rows[0].get("note"),
            Some(&Value::Text("hello, world".into()))
        );
        assert_eq!(
            out.rows[1].get("note"),
            Some(&Value::Text("line one\nline two".into()))
        );
    }

    #[test]
    fn test_doubled_quote_escape() {
        let out = ingest_default("quote,n\n\"she said \"\"hi\"\"\",1\n");
        assert_eq!(
            out.rows[0].get("quote"),
            Some(&Value::Text("she said \"hi\"".into()))
        );
    }

    #[test]
    fn test_mixed_line_terminators() {
        let out = ingest_default("a,b\r\n1,2\r3,4\n5,6");
        assert_eq!(out.rows.len(), 3);
    }

    #[test]
    fn test_semicolon_dense_input_is_rejected() {
        let err = ingest("a;b;c\n1;2;3\n", "x", &Limits::default()).unwrap_err();
        assert!(matches!(err, IngestError::Format { .. }));
    }

    #[test]
    fn test_tab_dense_input_is_rejected() {
        let err = ingest("a\tb\n1\t2\n", "x", &Limits::default()).unwrap_err();
        assert!(matches!(err, IngestError::Format { .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            ingest("   \n", "x", &Limits::default()),
            Err(IngestError::Empty)
        ));
    }

    // =========================================================================
    // Row tolerance
    // =========================================================================

    #[test]
    fn test_short_rows_are_padded_with_null() {
        let out = ingest_default("a,b,c\n1,2\n4,5,6\n");
        assert_eq!(out.stats.malformed_rows, 1);
        assert_eq!(out.rows[0].get("c"), Some(&Value::Null));
        assert!(out.schema.column("c").unwrap().nullable);
    }

    #[test]
    fn test_long_rows_are_truncated() {
        let out = ingest_default("a,b\n1,2,3,4\n");
        assert_eq!(out.stats.malformed_rows, 1);
        assert_eq!(out.rows[0].len(), 2);
    }

    #[test]
    fn test_fully_empty_rows_are_skipped() {
        let out = ingest_default("a,b\n1,2\n,\n3,4\n");
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.stats.skipped_empty, 1);
    }

    // =========================================================================
    // Schema shape
    // =========================================================================

    #[test]
    fn test_headers_are_normalized_and_deduped() {
        let out = ingest_default("First Name,first name,SELECT\nAlice,Ann,x\n");
        let names: Vec<&str> = out
            .schema
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["first_name", "first_name_1", "select_col"]);
    }

    #[test]
    fn test_every_row_has_every_declared_column() {
        let out = ingest_default("a,b,c\n1,2\n1,2,3,4\n,,\n5,,7\n");
        for row in &out.rows {
            assert_eq!(row.len(), out.schema.columns().len());
            for col in out.schema.columns() {
                assert!(row.contains_key(&col.name));
            }
        }
    }

    #[test]
    fn test_reinference_is_idempotent() {
        let text = "flag,n,when,note\nyes,1,2023-01-14,alpha\nno,2,2023-02-02,beta\n,3,2023-03-03,\n";
        let first = ingest_default(text);

        // Render the ingested values back to text and re-infer.
        let limits = Limits::default();
        for col in first.schema.columns() {
            let rendered: Vec<String> = first
                .rows
                .iter()
                .filter_map(|row| row.get(&col.name))
                .filter(|v| !v.is_null())
                .map(|v| v.render())
                .collect();
            let sample: Vec<&str> = rendered.iter().map(String::as_str).collect();
            assert_eq!(
                infer_column_type(&sample, &limits),
                col.column_type,
                "column {}",
                col.name
            );
        }
    }

    // =========================================================================
    // Capacity governance
    // =========================================================================

    #[test]
    fn test_one_hundred_columns_pass() {
        let header: Vec<String> = (0..100).map(|i| format!("c{i}")).collect();
        let row = vec!["1"; 100].join(",");
        let text = format!("{}\n{}\n", header.join(","), row);
        assert!(ingest(&text, "wide", &Limits::default()).is_ok());
    }

    #[test]
    fn test_one_hundred_one_columns_fail() {
        let header: Vec<String> = (0..101).map(|i| format!("c{i}")).collect();
        let text = format!("{}\n", header.join(","));
        let err = ingest(&text, "wide", &Limits::default()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Capacity { what: "column", .. }
        ));
    }

    #[test]
    fn test_row_limit_fails_closed() {
        let mut text = String::from("n,m\n");
        for i in 0..51_000 {
            text.push_str(&format!("{i},1\n"));
        }
        let err = ingest(&text, "tall", &Limits::default()).unwrap_err();
        assert!(matches!(err, IngestError::Capacity { what: "row", .. }));
    }

    #[test]
    fn test_byte_limit_fails_closed() {
        let limits = Limits {
            max_bytes: 64,
            ..Limits::default()
        };
        let text = format!("blob\n{}\n{}\n", "x".repeat(60), "y".repeat(60));
        let err = ingest(&text, "big", &limits).unwrap_err();
        assert!(matches!(err, IngestError::Capacity { what: "size", .. }));
    }

    #[test]
    fn test_value_truncation_is_counted() {
        let limits = Limits {
            max_value_len: 4,
            ..Limits::default()
        };
        let out = ingest("word\nabcdefgh\n", "t", &limits).unwrap();
        assert_eq!(out.stats.truncated_values, 1);
        assert_eq!(out.rows[0].get("word"), Some(&Value::Text("abcd…".into())));
    }
}
