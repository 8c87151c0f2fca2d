//! Wire types for the `/simple/price` endpoint.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// `{"<id>": {"usd": 7.5, "last_updated_at": 1700000000}, ...}`
pub type SimplePriceResponse = IndexMap<String, SimplePriceEntry>;

/// One identifier's entry. Other currencies and fields are ignored.
#[derive(Deserialize, Debug, Default)]
pub struct SimplePriceEntry {
    /// Raw USD price; a JSON number or numeric string when present.
    #[serde(default)]
    pub usd: Option<Value>,
    /// Unix seconds of the provider's last refresh.
    #[serde(default)]
    pub last_updated_at: Option<Value>,
}

impl SimplePriceEntry {
    /// The USD price as an exact decimal.
    ///
    /// `Ok(None)` when the provider has no price (missing or null). `Err` when a
    /// value is present but is not a non-negative number.
    pub fn usd_price(&self) -> Result<Option<Decimal>, String> {
        let raw = match &self.usd {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => return Err(format!("unexpected usd value {other}")),
        };
        let price = parse_decimal(&raw).ok_or_else(|| format!("unparseable usd value {raw}"))?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(format!("negative usd value {raw}"));
        }
        Ok(Some(price))
    }

    /// Provider freshness timestamp, if present and sane.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let secs = match self.last_updated_at.as_ref()? {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        DateTime::from_timestamp(secs, 0)
    }
}

// JSON numbers keep their source text (serde_json `arbitrary_precision`), which
// can be scientific notation for very small prices.
fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}
