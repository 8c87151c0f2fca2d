//! Records read from and written back to the `airdrops` table.
//!
//! The table is owned by another system. This crate reads a snapshot of
//! candidate rows and later rewrites only the `metadata` column of rows that
//! received a price.

use serde_json::{Map, Value};

/// Metadata key holding the canonical provider identifier.
pub const COIN_ID_KEY: &str = "coingecko_id";
/// Metadata key holding the latest USD price.
pub const PRICE_KEY: &str = "latest_price_usd";
/// Metadata key holding the price provenance tag.
pub const SOURCE_KEY: &str = "price_source";
/// Metadata key holding the fetch timestamp.
pub const UPDATED_AT_KEY: &str = "price_updated_at";
/// Provenance tag written under [`SOURCE_KEY`].
pub const PRICE_SOURCE: &str = "coingecko";

/// One row of the `airdrops` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Primary key.
    pub id: i64,
    /// Stable project key (e.g., "uniswap-airdrop").
    pub project_key: String,
    /// Human-readable project name.
    pub project_name: String,
    /// Ticker symbol of the project's token, if any.
    pub token_symbol: Option<String>,
    /// Open-ended JSON metadata; `None` when the column is NULL.
    pub metadata: Option<Value>,
}

impl Record {
    /// Identifier stored under `metadata.coingecko_id`, if it is a non-blank string.
    pub fn stored_coin_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get(COIN_ID_KEY)?
            .as_str()
            .filter(|id| !id.trim().is_empty())
    }
}

/// A metadata rewrite planned for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataUpdate {
    /// Row to update.
    pub id: i64,
    /// Full replacement value for the `metadata` column.
    pub metadata: Map<String, Value>,
}
