//! Connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies recommended PRAGMAs
//! for local development: WAL journaling, foreign_keys=ON, and a 5000ms busy_timeout.
//!
//! Example:
//! ```no_run
//! use price_sync::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("price_sync_example.db");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```

use diesel::{Connection, PgConnection, RunQueryDsl, SqliteConnection, sql_query};
use tracing::debug;

use crate::db::store::{RecordStore, StoreError};

/// Open a SQLite connection and apply connection-wide PRAGMAs.
///
/// A leading `sqlite://` or `sqlite:` scheme is stripped; the rest is handed to
/// SQLite as a path or `file:` URI.
pub fn connect_sqlite(database_url: &str) -> Result<SqliteConnection, StoreError> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let mut conn = SqliteConnection::establish(path)?;

    // Better read concurrency + nicer dev ergonomics
    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    Ok(conn)
}

/// Open a PostgreSQL connection.
pub fn connect_postgres(database_url: &str) -> Result<PgConnection, StoreError> {
    Ok(PgConnection::establish(database_url)?)
}

/// Open the record store named by `database_url`.
///
/// URLs that start with "postgres://" or "postgresql://" go to PostgreSQL; everything
/// else is treated as SQLite.
pub fn connect(database_url: &str) -> Result<Box<dyn RecordStore>, StoreError> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        debug!("opening postgres record store");
        Ok(Box::new(connect_postgres(database_url)?))
    } else {
        debug!("opening sqlite record store");
        Ok(Box::new(connect_sqlite(database_url)?))
    }
}
