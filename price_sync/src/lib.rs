//! Token price sync.
//!
//! Resolves each record's token symbol to a canonical CoinGecko identifier,
//! fetches USD prices in paced batches, and merges them into the record's JSON
//! metadata. One invocation is one run; see [`sync::sync_prices`].

#![deny(missing_docs)]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod metadata;
pub mod models;
pub mod pricing;
pub mod providers;
pub mod resolve;
pub mod sync;
