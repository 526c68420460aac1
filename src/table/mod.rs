//! Table sinks receiving the rows produced by the sample function.
//!
//! Rows are keyed by `(partition_key, row_key)`. Writing a row whose key
//! already exists replaces its `id` and `message`, so the table always holds
//! the latest message per key and a redelivery leaves a single row.

pub mod database;

use diesel::prelude::*;
use diesel::sql_types::Text;
use std::sync::Mutex;

use crate::error::AppError;
use crate::models::SampleTableEntity;

pub use database::{Database, DbConnection, Pool, PooledConnection};

/// Destination for sample rows
pub trait TableSink: Send + Sync {
    /// Insert `row`, or overwrite the row stored under the same key.
    fn upsert(&self, row: &SampleTableEntity) -> Result<(), AppError>;
}

/// Validated SQL table identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn parse(name: &str) -> Result<Self, AppError> {
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
        let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid_head && valid_tail && name.len() <= 63 {
            Ok(TableName(name.to_string()))
        } else {
            Err(AppError::Config(format!("Invalid table name: '{}'", name)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
pub fn create_table_sql(table: &TableName) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
            partition_key TEXT NOT NULL,
            row_key TEXT NOT NULL,
            id TEXT NOT NULL,
            message TEXT NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (partition_key, row_key)
        )"#,
        table.as_str()
    )
}

#[cfg(all(feature = "mysql", not(feature = "postgres")))]
pub fn create_table_sql(table: &TableName) -> String {
    // MySQL cannot index TEXT keys without a prefix length
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
            partition_key VARCHAR(255) NOT NULL,
            row_key VARCHAR(255) NOT NULL,
            id VARCHAR(255) NOT NULL,
            message TEXT NOT NULL,
            timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (partition_key, row_key)
        )"#,
        table.as_str()
    )
}

#[cfg(feature = "postgres")]
pub fn upsert_sql(table: &TableName) -> String {
    format!(
        "INSERT INTO {} (partition_key, row_key, id, message) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (partition_key, row_key) DO UPDATE \
         SET id = EXCLUDED.id, message = EXCLUDED.message, timestamp = NOW()",
        table.as_str()
    )
}

#[cfg(all(feature = "mysql", not(feature = "postgres")))]
pub fn upsert_sql(table: &TableName) -> String {
    format!(
        "INSERT INTO {} (partition_key, row_key, id, message) VALUES (?, ?, ?, ?) \
         ON DUPLICATE KEY UPDATE \
         id = VALUES(id), message = VALUES(message), timestamp = CURRENT_TIMESTAMP",
        table.as_str()
    )
}

/// Sink writing rows through a Diesel connection pool
pub struct DieselTable {
    db: Database,
    table: TableName,
    upsert: String,
}

impl DieselTable {
    pub fn new(db: Database, table: TableName) -> Self {
        let upsert = upsert_sql(&table);
        Self { db, table, upsert }
    }

    /// Create the table if it does not exist yet
    pub fn ensure_table(&self) -> Result<(), AppError> {
        tracing::info!("Ensuring table '{}' exists", self.table.as_str());

        let mut conn = self.db.get_connection()?;
        diesel::sql_query(create_table_sql(&self.table)).execute(&mut conn)?;
        Ok(())
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }
}

impl TableSink for DieselTable {
    fn upsert(&self, row: &SampleTableEntity) -> Result<(), AppError> {
        let mut conn = self.db.get_connection()?;

        diesel::sql_query(self.upsert.as_str())
            .bind::<Text, _>(row.partition_key.as_str())
            .bind::<Text, _>(row.row_key.as_str())
            .bind::<Text, _>(row.id.as_str())
            .bind::<Text, _>(row.message.as_str())
            .execute(&mut conn)?;

        Ok(())
    }
}

/// In-process sink, used for dry runs and tests
#[derive(Default)]
pub struct MemoryTable {
    rows: Mutex<Vec<SampleTableEntity>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<SampleTableEntity> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SampleTableEntity>> {
        // A panic while holding the lock cannot leave a half-written row
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TableSink for MemoryTable {
    fn upsert(&self, row: &SampleTableEntity) -> Result<(), AppError> {
        let mut rows = self.lock();
        let existing = rows
            .iter_mut()
            .find(|r| r.partition_key == row.partition_key && r.row_key == row.row_key);

        match existing {
            Some(stored) => *stored = row.clone(),
            None => rows.push(row.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SampleMessage;

    #[test]
    fn test_table_name_validation() {
        assert!(TableName::parse("aisquick_sample").is_ok());
        assert!(TableName::parse("_t1").is_ok());
        assert!(TableName::parse("").is_err());
        assert!(TableName::parse("1table").is_err());
        assert!(TableName::parse("sample; DROP TABLE x").is_err());
        assert!(TableName::parse("aisquick-sample").is_err());
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_postgres_sql() {
        let table = TableName::parse("aisquick_sample").unwrap();

        let upsert = upsert_sql(&table);
        assert!(upsert.starts_with("INSERT INTO aisquick_sample (partition_key, row_key, id, message)"));
        assert!(upsert.contains("VALUES ($1, $2, $3, $4)"));
        assert!(upsert.contains("ON CONFLICT (partition_key, row_key) DO UPDATE"));
        assert!(upsert.contains("message = EXCLUDED.message"));
        assert!(!upsert.contains("DO NOTHING"));

        let create = create_table_sql(&table);
        assert!(create.contains("CREATE TABLE IF NOT EXISTS aisquick_sample"));
        assert!(create.contains("PRIMARY KEY (partition_key, row_key)"));
    }

    #[cfg(all(feature = "mysql", not(feature = "postgres")))]
    #[test]
    fn test_mysql_sql() {
        let table = TableName::parse("aisquick_sample").unwrap();

        let upsert = upsert_sql(&table);
        assert!(upsert.starts_with("INSERT INTO aisquick_sample (partition_key, row_key, id, message)"));
        assert!(upsert.contains("VALUES (?, ?, ?, ?)"));
        assert!(upsert.contains("ON DUPLICATE KEY UPDATE"));
        assert!(upsert.contains("message = VALUES(message)"));
        assert!(!upsert.contains("IGNORE"));

        let create = create_table_sql(&table);
        assert!(create.contains("CREATE TABLE IF NOT EXISTS aisquick_sample"));
        assert!(create.contains("row_key VARCHAR(255) NOT NULL"));
        assert!(create.contains("PRIMARY KEY (partition_key, row_key)"));
    }

    #[test]
    fn test_memory_table_replaces_row_with_same_key() {
        let table = MemoryTable::new();
        let first = SampleTableEntity::from(&SampleMessage::new("1", "first"));
        let second = SampleTableEntity::from(&SampleMessage::new("1", "second"));
        let other = SampleTableEntity::from(&SampleMessage::new("2", "other"));

        table.upsert(&first).unwrap();
        table.upsert(&other).unwrap();
        table.upsert(&second).unwrap();

        assert_eq!(table.rows(), vec![second, other]);
    }

    #[test]
    fn test_memory_table_exact_redelivery_keeps_one_row() {
        let table = MemoryTable::new();
        let row = SampleTableEntity::from(&SampleMessage::new("1", "same"));

        table.upsert(&row).unwrap();
        table.upsert(&row).unwrap();

        assert_eq!(table.rows(), vec![row]);
    }
}
