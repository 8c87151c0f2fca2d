#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use diesel::QueryableByName;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use price_sync::catalog::CatalogEntry;
use price_sync::config::RunConfig;
use price_sync::db::connection;
use price_sync::providers::{PriceProvider, PriceQuote, ProviderError};
use price_sync::sync::SyncOptions;
use tempfile::TempDir;

const CREATE_AIRDROPS: &str = "
CREATE TABLE airdrops (
    id           INTEGER PRIMARY KEY,
    project_key  TEXT NOT NULL,
    project_name TEXT NOT NULL,
    token_symbol TEXT,
    metadata     TEXT
);";

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

#[derive(Debug, PartialEq, QueryableByName)]
pub struct RawRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Nullable<Text>)]
    pub token_symbol: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub metadata: Option<String>,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    let mut conn = connection::connect_sqlite(&path).expect("connect");
    conn.batch_execute(CREATE_AIRDROPS).expect("create airdrops");
    (TestDb { _dir: dir, path }, conn)
}

pub fn seed(
    conn: &mut SqliteConnection,
    id: i64,
    key: &str,
    symbol: Option<&str>,
    metadata: Option<&str>,
) {
    diesel::sql_query(
        "INSERT INTO airdrops (id, project_key, project_name, token_symbol, metadata)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind::<BigInt, _>(id)
    .bind::<Text, _>(key)
    .bind::<Text, _>(key.to_uppercase())
    .bind::<Nullable<Text>, _>(symbol)
    .bind::<Nullable<Text>, _>(metadata)
    .execute(conn)
    .expect("seed row");
}

/// Every row, verbatim, in id order.
pub fn dump(conn: &mut SqliteConnection) -> Vec<RawRow> {
    diesel::sql_query("SELECT id, token_symbol, metadata FROM airdrops ORDER BY id")
        .load(conn)
        .expect("dump airdrops")
}

pub fn raw_metadata(conn: &mut SqliteConnection, id: i64) -> Option<String> {
    dump(conn)
        .into_iter()
        .find(|r| r.id == id)
        .and_then(|r| r.metadata)
}

pub fn metadata(conn: &mut SqliteConnection, id: i64) -> serde_json::Value {
    let raw = raw_metadata(conn, id).expect("metadata present");
    serde_json::from_str(&raw).expect("metadata is json")
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn entry(id: &str, symbol: &str) -> CatalogEntry {
    CatalogEntry {
        id: id.into(),
        symbol: symbol.into(),
        name: id.replace('-', " "),
    }
}

/// Options with no pacing so tests never sleep.
pub fn options(dry_run: bool) -> SyncOptions {
    SyncOptions {
        dry_run,
        limit: None,
        run: RunConfig {
            pacing: Duration::ZERO,
            ..RunConfig::default()
        },
    }
}

/// In-memory provider that counts its calls.
#[derive(Default)]
pub struct FakeProvider {
    pub catalog: Vec<CatalogEntry>,
    pub prices: HashMap<String, String>,
    pub fail_prices: bool,
    pub catalog_calls: AtomicUsize,
    pub price_calls: Mutex<Vec<Vec<String>>>,
}

impl FakeProvider {
    pub fn new(catalog: Vec<CatalogEntry>, prices: &[(&str, &str)]) -> Self {
        Self {
            catalog,
            prices: prices
                .iter()
                .map(|(id, usd)| (id.to_string(), usd.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.price_calls.lock().unwrap().concat()
    }
}

#[async_trait]
impl PriceProvider for FakeProvider {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ProviderError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.catalog.clone())
    }

    async fn fetch_usd_prices(&self, ids: &[String]) -> Result<Vec<PriceQuote>, ProviderError> {
        self.price_calls.lock().unwrap().push(ids.to_vec());
        if self.fail_prices {
            return Err(ProviderError::Api {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.prices.get(id).map(|usd| PriceQuote {
                    coin_id: id.clone(),
                    usd: usd.parse().unwrap(),
                    last_updated_at: None,
                })
            })
            .collect())
    }
}
