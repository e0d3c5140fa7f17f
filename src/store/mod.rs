//! Record storage
//!
//! The import engine only talks to storage through [`RecordStore`]. Rows are
//! string-valued column maps, matching the shape of the export descriptor;
//! typed entities convert to and from them (see [`crate::entity`]).

pub mod schema_gen;
pub mod sqlite;

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::schema::TableSchema;

pub use sqlite::SqliteStore;

/// A single record: an optional id plus named string fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub id: Option<i64>,
    pub fields: BTreeMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from raw fields, lifting a numeric `id` field into `Row::id`
    pub fn from_fields(mut fields: BTreeMap<String, String>) -> Self {
        let id = fields.remove("id").and_then(|v| v.trim().parse().ok());
        Self { id, fields }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Field value, or the empty string if absent
    pub fn text(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }

    /// Field parsed as an integer; absent, empty or non-numeric yields `None`
    pub fn integer(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(|v| v.trim().parse().ok())
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }
}

/// Identifier of an imported record.
///
/// Dry runs never allocate real ids, so they hand out random placeholders.
/// Keeping them in a separate variant stops a placeholder from being mistaken
/// for something the store can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum RecordId {
    Persisted(i64),
    Simulated(i64),
}

impl RecordId {
    /// Allocate a random positive placeholder id
    pub fn simulated() -> Self {
        RecordId::Simulated(rand::thread_rng().gen_range(1..=i64::MAX))
    }

    pub fn value(self) -> i64 {
        match self {
            RecordId::Persisted(id) | RecordId::Simulated(id) => id,
        }
    }

    pub fn is_simulated(self) -> bool {
        matches!(self, RecordId::Simulated(_))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Persisted(id) => write!(f, "{}", id),
            RecordId::Simulated(id) => write!(f, "~{}", id),
        }
    }
}

/// Persistent storage for catalog records.
///
/// `key` and `filter` are equality conditions on named columns, combined
/// with AND. Implementations return rows ordered by id.
pub trait RecordStore {
    fn find_one(&self, table: &TableSchema, key: &[(&str, &str)]) -> Result<Option<Row>>;

    fn find_many(&self, table: &TableSchema, filter: &[(&str, &str)]) -> Result<Vec<Row>>;

    fn get(&self, table: &TableSchema, id: i64) -> Result<Option<Row>>;

    /// Insert a row and return its newly allocated id
    fn insert(&mut self, table: &TableSchema, row: &Row) -> Result<i64>;

    /// Overwrite every column of the row with the given id.
    ///
    /// Columns missing from `row` are reset to their defaults.
    fn update(&mut self, table: &TableSchema, id: i64, row: &Row) -> Result<()>;

    fn set_field(&mut self, table: &TableSchema, id: i64, column: &str, value: &str)
        -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields_lifts_numeric_id() {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), " 7 ".to_string());
        fields.insert("name".to_string(), "box".to_string());

        let row = Row::from_fields(fields);
        assert_eq!(row.id, Some(7));
        assert_eq!(row.get("id"), None);
        assert_eq!(row.text("name"), "box");
    }

    #[test]
    fn test_non_numeric_id_is_dropped() {
        let row = Row::from_fields(BTreeMap::from([("id".to_string(), "abc".to_string())]));
        assert_eq!(row.id, None);
    }

    #[test]
    fn test_simulated_ids_are_positive() {
        for _ in 0..100 {
            let id = RecordId::simulated();
            assert!(id.is_simulated());
            assert!(id.value() > 0);
        }
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::Persisted(4).to_string(), "4");
        assert_eq!(RecordId::Simulated(4).to_string(), "~4");
    }
}
