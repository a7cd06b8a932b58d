//! SQLite connection pool management.

use super::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Connection pool alias; the store currently targets SQLite only.
pub type DbPool = sqlx::SqlitePool;

/// Creates a SQLite connection pool from a database URL.
///
/// `sqlite::memory:` is accepted for tests and local development.
pub async fn create_pool(database_url: &str) -> Result<DbPool, StoreError> {
    if !database_url.starts_with("sqlite:") {
        return Err(StoreError::Configuration(format!(
            "unsupported database URL scheme in {database_url:?}, expected sqlite:"
        )));
    }

    // An in-memory database exists per connection; a pool of one keeps
    // every query on the same database.
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        10
    };

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StoreError::Configuration(format!("invalid database URL: {e}")))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    Ok(pool)
}
