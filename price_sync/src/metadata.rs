//! Additive, null-stripping metadata merge.
//!
//! A priced record gets exactly four keys written into its metadata
//! (`coingecko_id`, `latest_price_usd`, `price_source`, `price_updated_at`).
//! Every other key is carried over untouched, then null-valued object fields
//! are stripped at every depth, matching PostgreSQL's `jsonb_strip_nulls`.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::models::{COIN_ID_KEY, PRICE_KEY, PRICE_SOURCE, Record, SOURCE_KEY, UPDATED_AT_KEY};

/// Why a record's metadata could not be merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// The stored metadata is JSON but not an object (array, string, ...).
    #[error("metadata is not a JSON object")]
    NotAnObject,
}

/// Format a fetch time the way it is stored under `price_updated_at`.
pub fn format_updated_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Merge a price into `record`'s metadata and return the full new value.
///
/// Absent or JSON-null metadata counts as an empty object. The result only
/// depends on the inputs, so applying the same price twice is a no-op.
pub fn apply_price(
    record: &Record,
    coin_id: &str,
    price_usd: Decimal,
    updated_at: &str,
) -> Result<Map<String, Value>, MergeError> {
    let mut merged = match &record.metadata {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(MergeError::NotAnObject),
    };

    merged.insert(COIN_ID_KEY.to_string(), Value::String(coin_id.to_string()));
    merged.insert(PRICE_KEY.to_string(), decimal_value(price_usd));
    merged.insert(SOURCE_KEY.to_string(), Value::String(PRICE_SOURCE.to_string()));
    merged.insert(UPDATED_AT_KEY.to_string(), Value::String(updated_at.to_string()));

    strip_nulls(&mut merged);
    Ok(merged)
}

/// Remove null-valued fields from `map` and from every object nested in it.
/// Arrays are descended into, but their null elements are kept.
pub fn strip_nulls(map: &mut Map<String, Value>) {
    map.retain(|_, v| !v.is_null());
    for v in map.values_mut() {
        strip_nested(v);
    }
}

fn strip_nested(value: &mut Value) {
    match value {
        Value::Object(map) => strip_nulls(map),
        Value::Array(items) => items.iter_mut().for_each(strip_nested),
        _ => {}
    }
}

// With serde_json's `arbitrary_precision` a Number keeps its exact text, so
// "7.50" is stored as 7.50 rather than the nearest f64.
fn decimal_value(d: Decimal) -> Value {
    d.to_string()
        .parse::<Number>()
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(d.to_string()))
}
