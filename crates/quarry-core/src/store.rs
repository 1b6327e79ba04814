//! In-memory keyed store of row sources.
//!
//! The store holds the built-in sample tables plus any ingested tables,
//! keyed by name. Ingested entries are namespaced with [`INGEST_PREFIX`] so
//! a human-chosen label can never shadow a sample table, and resolution
//! prefers the ingested entry when both exist under the same human name.
//!
//! Writes replace a keyed entry wholesale; there is no partial-write
//! visibility to prevent.

use crate::error::{StoreError, StoreResult};
use crate::sample;
use crate::schema::Schema;
use crate::value::Row;
use std::collections::BTreeMap;

/// Prefix applied to every ingested table's store key.
pub const INGEST_PREFIX: &str = "csv_";

/// A named row source: schema plus materialized rows.
#[derive(Debug, Clone)]
pub struct StoredTable {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

/// Keyed map of row sources for one application session.
#[derive(Debug, Default)]
pub struct RowStore {
    tables: BTreeMap<String, StoredTable>,
}

impl RowStore {
    /// An empty store with no sources at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A store pre-populated with the built-in sample tables.
    pub fn with_samples() -> Self {
        let mut store = Self::empty();
        for (schema, rows) in sample::sample_tables() {
            store.insert(schema, rows);
        }
        store
    }

    /// Insert or replace a source under its schema name.
    pub fn insert(&mut self, schema: Schema, rows: Vec<Row>) {
        self.tables
            .insert(schema.name().to_string(), StoredTable { schema, rows });
    }

    /// Insert or replace an ingested source under its namespaced key.
    /// Returns the key the source is now stored under.
    pub fn insert_ingested(&mut self, schema: Schema, rows: Vec<Row>) -> String {
        let key = format!("{INGEST_PREFIX}{}", schema.name());
        self.tables.insert(key.clone(), StoredTable { schema, rows });
        key
    }

    /// Remove a source by exact key. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.tables.remove(key).is_some()
    }

    /// Drop every ingested source, keeping the sample tables.
    pub fn reset(&mut self) {
        self.tables.retain(|key, _| !key.starts_with(INGEST_PREFIX));
    }

    /// Resolve a table reference. An ingested table takes precedence over a
    /// sample table of the same human name.
    pub fn resolve(&self, table: &str) -> StoreResult<&StoredTable> {
        let ingested = format!("{INGEST_PREFIX}{table}");
        self.tables
            .get(&ingested)
            .or_else(|| self.tables.get(table))
            .ok_or_else(|| StoreError::UnknownSource {
                table: table.to_string(),
                available: self.tables.keys().cloned().collect(),
            })
    }

    /// Fetch a source by exact store key.
    pub fn get(&self, key: &str) -> Option<&StoredTable> {
        self.tables.get(key)
    }

    /// All store keys, in sorted order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }
}
