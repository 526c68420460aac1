//! Database connection management
//!
//! Diesel connections pooled through r2d2, one pool per sink.

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use std::sync::Arc;
use std::time::Duration;

use crate::config::TableConfig;
use crate::error::AppError;

// Conditional imports based on database backend
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
pub type DbConnection = PgConnection;

#[cfg(all(feature = "mysql", not(feature = "postgres")))]
use diesel::mysql::MysqlConnection;
#[cfg(all(feature = "mysql", not(feature = "postgres")))]
pub type DbConnection = MysqlConnection;

pub type Pool = r2d2::Pool<ConnectionManager<DbConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<DbConnection>>;

/// Database connection pool manager
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool>,
}

impl Database {
    /// Create a connection pool for `config.database_url`
    ///
    /// # Example
    /// ```ignore
    /// let db = Database::new(&TableConfig::default())?;
    /// ```
    pub fn new(config: &TableConfig) -> Result<Self, AppError> {
        let database_url = config.database_url.as_deref().ok_or_else(|| {
            AppError::Config("DATABASE_URL must be set".to_string())
        })?;

        let manager = ConnectionManager::<DbConnection>::new(database_url);

        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_idle))
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .max_lifetime(Some(Duration::from_secs(config.max_lifetime_secs)))
            .build(manager)?;

        Ok(Database {
            pool: Arc::new(pool),
        })
    }

    pub fn get_connection(&self) -> Result<PooledConnection, AppError> {
        Ok(self.pool.get()?)
    }

    /// Test database connectivity
    pub fn test_connection(&self) -> Result<(), AppError> {
        let mut conn = self.get_connection()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }
}
