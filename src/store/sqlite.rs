use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use super::schema_gen::{generate_create_table, generate_indexes};
use super::{RecordStore, Row};
use crate::error::Result;
use crate::schema::{Column, ColumnType, TableSchema, ALL_TABLES};

/// SQLite-backed record store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure all tables exist
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.create_tables(ALL_TABLES)?;
        Ok(store)
    }

    /// Create all tables for the given schemas
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        for schema in schemas {
            self.conn.execute(&generate_create_table(schema), [])?;
            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, [])?;
            }
        }
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of rows in a table
    pub fn count(&self, table: &TableSchema) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn select(
        &self,
        table: &TableSchema,
        filter: &[(&str, &str)],
        limit: Option<usize>,
    ) -> Result<Vec<Row>> {
        let (where_sql, params) = where_clause(table, filter)?;
        let columns: Vec<&str> = table.columns.iter().map(|c| c.name).collect();
        let mut sql = format!(
            "SELECT {} FROM {}{} ORDER BY id",
            columns.join(", "),
            table.name,
            where_sql
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |sql_row| {
            let mut row = Row::new();
            for (idx, name) in columns.iter().enumerate() {
                let value = sql_row.get_ref(idx)?;
                if *name == "id" {
                    row.id = sql_row.get(idx)?;
                } else {
                    row.set(*name, value_to_string(value));
                }
            }
            Ok(row)
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl RecordStore for SqliteStore {
    fn find_one(&self, table: &TableSchema, key: &[(&str, &str)]) -> Result<Option<Row>> {
        Ok(self.select(table, key, Some(1))?.into_iter().next())
    }

    fn find_many(&self, table: &TableSchema, filter: &[(&str, &str)]) -> Result<Vec<Row>> {
        self.select(table, filter, None)
    }

    fn get(&self, table: &TableSchema, id: i64) -> Result<Option<Row>> {
        let columns: Vec<&str> = table.data_columns().map(|c| c.name).collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            columns.join(", "),
            table.name
        );
        let row = self
            .conn
            .query_row(&sql, [id], |sql_row| {
                let mut row = Row::new();
                row.id = Some(id);
                for (idx, name) in columns.iter().enumerate() {
                    row.set(*name, value_to_string(sql_row.get_ref(idx)?));
                }
                Ok(row)
            })
            .optional()?;
        Ok(row)
    }

    fn insert(&mut self, table: &TableSchema, row: &Row) -> Result<i64> {
        let columns: Vec<&Column> = table.data_columns().collect();
        let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            names.join(", "),
            placeholders.join(", ")
        );

        log_ignored_fields(table, row);
        let values = columns.iter().map(|col| bind_value(col, row.get(col.name)));
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&mut self, table: &TableSchema, id: i64, row: &Row) -> Result<()> {
        let columns: Vec<&Column> = table.data_columns().collect();
        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| format!("{} = ?{}", col.name, idx + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table.name,
            assignments.join(", "),
            columns.len() + 1
        );

        log_ignored_fields(table, row);
        let mut values: Vec<Value> = columns
            .iter()
            .map(|col| bind_value(col, row.get(col.name)))
            .collect();
        values.push(Value::Integer(id));
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn set_field(
        &mut self,
        table: &TableSchema,
        id: i64,
        column: &str,
        value: &str,
    ) -> Result<()> {
        let col = checked_column(table, column)?;
        let sql = format!("UPDATE {} SET {} = ?1 WHERE id = ?2", table.name, col.name);
        self.conn
            .execute(&sql, [bind_value(col, Some(value)), Value::Integer(id)])?;
        Ok(())
    }
}

fn checked_column<'a>(table: &'a TableSchema, name: &str) -> Result<&'a Column> {
    table
        .column(name)
        .ok_or_else(|| rusqlite::Error::InvalidColumnName(format!("{}.{}", table.name, name)).into())
}

fn where_clause(table: &TableSchema, filter: &[(&str, &str)]) -> Result<(String, Vec<Value>)> {
    if filter.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut conditions = Vec::with_capacity(filter.len());
    let mut params = Vec::with_capacity(filter.len());
    for (idx, (name, value)) in filter.iter().enumerate() {
        let col = checked_column(table, name)?;
        conditions.push(format!("{} = ?{}", col.name, idx + 1));
        params.push(bind_value(col, Some(value)));
    }
    Ok((format!(" WHERE {}", conditions.join(" AND ")), params))
}

/// Convert a descriptor string into the SQL value stored for a column
fn bind_value(col: &Column, value: Option<&str>) -> Value {
    match (col.col_type, value) {
        (_, None) => col
            .default_value()
            .map(|d| Value::Text(d.to_string()))
            .unwrap_or(Value::Null),
        (ColumnType::Integer, Some(v)) if v.trim().is_empty() => Value::Null,
        (ColumnType::Integer, Some(v)) => v
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(v.to_string())),
        (ColumnType::Text, Some(v)) => Value::Text(v.to_string()),
    }
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

fn log_ignored_fields(table: &TableSchema, row: &Row) {
    for name in row.fields.keys() {
        if table.column(name).is_none() {
            debug!(table = table.name, column = %name, "ignoring field without column");
        }
    }
}
