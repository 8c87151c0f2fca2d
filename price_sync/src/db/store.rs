//! The `airdrops` record store.
//!
//! Reads are one snapshot query (`token_symbol IS NOT NULL`, ascending id,
//! optional limit). Writes replace the `metadata` column of each updated row
//! and all run inside a single transaction, so a run either commits every
//! update or none of them.
//!
//! PostgreSQL keeps metadata as `jsonb`; SQLite keeps it as JSON text. Both
//! sides exchange it as text here so one row type serves both backends.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::{PgConnection, SqliteConnection, sql_query};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{MetadataUpdate, Record};

/// Errors raised by a record store. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not open the database.
    #[error("database connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    /// A query or the transaction failed.
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    /// A row's metadata column holds text that is not JSON.
    #[error("record {id} has corrupt metadata: {source}")]
    CorruptMetadata {
        /// Offending row.
        id: i64,
        /// Parse failure.
        source: serde_json::Error,
    },

    /// Merged metadata could not be serialized.
    #[error("failed to serialize metadata for record {id}: {source}")]
    Serialize {
        /// Row being written.
        id: i64,
        /// Serialization failure.
        source: serde_json::Error,
    },
}

/// Persistence seam for the sync job.
pub trait RecordStore {
    /// Rows with a token symbol, ordered by id, at most `limit` of them.
    /// A limit of 0 means no limit.
    fn load_candidates(&mut self, limit: Option<u32>) -> Result<Vec<Record>, StoreError>;

    /// Write every update in one transaction and return the number of rows touched.
    fn apply_updates(&mut self, updates: &[MetadataUpdate]) -> Result<usize, StoreError>;
}

#[derive(QueryableByName)]
struct RecordRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Text)]
    project_key: String,
    #[diesel(sql_type = Text)]
    project_name: String,
    #[diesel(sql_type = Nullable<Text>)]
    token_symbol: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    metadata: Option<String>,
}

impl TryFrom<RecordRow> for Record {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let metadata = row
            .metadata
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|source| StoreError::CorruptMetadata { id: row.id, source })?;
        Ok(Record {
            id: row.id,
            project_key: row.project_key,
            project_name: row.project_name,
            token_symbol: row.token_symbol,
            metadata,
        })
    }
}

fn to_records(rows: Vec<RecordRow>) -> Result<Vec<Record>, StoreError> {
    let records = rows
        .into_iter()
        .map(Record::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = records.len(), "loaded candidate records");
    Ok(records)
}

fn serialized(update: &MetadataUpdate) -> Result<String, StoreError> {
    serde_json::to_string(&update.metadata).map_err(|source| StoreError::Serialize {
        id: update.id,
        source,
    })
}

// 0 means "no limit", like an unset limit.
fn row_limit(limit: Option<u32>) -> Option<i64> {
    limit.filter(|n| *n > 0).map(i64::from)
}

fn note_missing_row(id: i64, affected: usize) {
    if affected == 0 {
        warn!(id, "record disappeared before its metadata could be written");
    }
}

impl RecordStore for SqliteConnection {
    fn load_candidates(&mut self, limit: Option<u32>) -> Result<Vec<Record>, StoreError> {
        // a negative LIMIT means "no limit" in SQLite
        let rows: Vec<RecordRow> = sql_query(
            "SELECT id, project_key, project_name, token_symbol, metadata
             FROM airdrops
             WHERE token_symbol IS NOT NULL
             ORDER BY id ASC
             LIMIT ?",
        )
        .bind::<BigInt, _>(row_limit(limit).unwrap_or(-1))
        .load(self)?;
        to_records(rows)
    }

    fn apply_updates(&mut self, updates: &[MetadataUpdate]) -> Result<usize, StoreError> {
        self.immediate_transaction::<_, StoreError, _>(|conn| {
            let mut touched = 0;
            for u in updates {
                let n = sql_query("UPDATE airdrops SET metadata = ? WHERE id = ?")
                    .bind::<Text, _>(serialized(u)?)
                    .bind::<BigInt, _>(u.id)
                    .execute(conn)?;
                note_missing_row(u.id, n);
                touched += n;
            }
            Ok(touched)
        })
    }
}

impl RecordStore for PgConnection {
    fn load_candidates(&mut self, limit: Option<u32>) -> Result<Vec<Record>, StoreError> {
        // LIMIT NULL means "no limit" in PostgreSQL
        let rows: Vec<RecordRow> = sql_query(
            "SELECT id::bigint AS id, project_key, project_name, token_symbol,
                    metadata::text AS metadata
             FROM airdrops
             WHERE token_symbol IS NOT NULL
             ORDER BY id ASC
             LIMIT $1",
        )
        .bind::<Nullable<BigInt>, _>(row_limit(limit))
        .load(self)?;
        to_records(rows)
    }

    fn apply_updates(&mut self, updates: &[MetadataUpdate]) -> Result<usize, StoreError> {
        self.transaction::<_, StoreError, _>(|conn| {
            let mut touched = 0;
            for u in updates {
                let n = sql_query("UPDATE airdrops SET metadata = $1::jsonb WHERE id = $2")
                    .bind::<Text, _>(serialized(u)?)
                    .bind::<BigInt, _>(u.id)
                    .execute(conn)?;
                note_missing_row(u.id, n);
                touched += n;
            }
            Ok(touched)
        })
    }
}
