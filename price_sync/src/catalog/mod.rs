//! Provider catalog subsystem.
//!
//! The provider's coin listing is fetched fresh on every run and indexed by
//! lowercase ticker symbol. Ticker symbols collide a lot (dozens of coins call
//! themselves `eth` or `uni`), so the index keeps every entry for a symbol and
//! leaves the decision to [`crate::resolve`]. Curated disambiguations live in
//! [`overrides`].

pub mod overrides;

use std::collections::HashMap;

use serde::Deserialize;

/// One coin from the provider's catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    /// Canonical identifier (provider slug), unique within the catalog.
    pub id: String,
    /// Ticker symbol as listed; not unique.
    #[serde(default)]
    pub symbol: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Lowercase symbol -> catalog entries sharing it, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    by_symbol: HashMap<String, Vec<CatalogEntry>>,
}

impl CatalogIndex {
    /// Index a catalog listing. Entries with a blank symbol are left out.
    pub fn build(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut by_symbol: HashMap<String, Vec<CatalogEntry>> = HashMap::new();
        for entry in entries {
            let key = entry.symbol.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            by_symbol.entry(key).or_default().push(entry);
        }
        Self { by_symbol }
    }

    /// All entries for an already-normalized (trimmed, lowercase) symbol.
    pub fn candidates(&self, symbol: &str) -> &[CatalogEntry] {
        self.by_symbol.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    /// True if nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, symbol: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: id.to_string(),
        }
    }

    #[test]
    fn groups_by_lowercase_symbol_in_catalog_order() {
        let idx = CatalogIndex::build([
            entry("uniswap", "UNI"),
            entry("bitcoin", "btc"),
            entry("unicorn-token", "uni"),
            entry("uniswap", "uni"),
        ]);

        let ids: Vec<&str> = idx.candidates("uni").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["uniswap", "unicorn-token", "uniswap"]);
        assert_eq!(idx.candidates("btc").len(), 1);
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn blank_symbols_are_not_indexed() {
        let idx = CatalogIndex::build([entry("ghost", "  "), entry("nameless", "")]);
        assert!(idx.is_empty());
        assert!(idx.candidates("").is_empty());
    }

    #[test]
    fn listing_without_symbol_field_deserializes() {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(r#"[{"id":"bitcoin","symbol":"btc","name":"Bitcoin"},{"id":"odd"}]"#)
                .unwrap();
        let idx = CatalogIndex::build(entries);
        assert_eq!(idx.candidates("btc")[0].name, "Bitcoin");
        assert_eq!(idx.len(), 1);
    }
}
