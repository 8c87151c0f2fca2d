//! Curated symbol -> identifier overrides.
//!
//! Overrides break known ticker collisions and naming mismatches by hand. They
//! take priority over the catalog during resolution, but never over an
//! identifier already stored on a record.
//!
//! The built-in list is [`OverrideTable::curated`]. Operators can layer extra
//! entries on top with a TOML file:
//!
//! ```toml
//! [overrides]
//! ens = "ethereum-name-service"
//! zro = "layerzero"
//! ```
//!
//! Keys are trimmed and lowercased, values trimmed. Entries that are blank after
//! trimming, or keys that collide once normalized, are rejected.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::config::ConfigError;

const CURATED: &[(&str, &str)] = &[
    ("uni", "uniswap"),
    ("ens", "ethereum-name-service"),
    ("op", "optimism"),
    ("arb", "arbitrum"),
    ("gmx", "gmx"),
    ("ldo", "lido-dao"),
    ("ape", "apecoin"),
    ("blur", "blur"),
    ("looks", "looksrare"),
    ("cow", "cow-protocol"),
    ("1inch", "1inch"),
    ("pendle", "pendle"),
    ("safe", "safe"),
    ("pyth", "pyth-network"),
    ("magic", "magic"),
    ("rdnt", "radiant-capital"),
];

/// Immutable lowercase symbol -> canonical identifier lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: IndexMap<String, String>,
}

impl OverrideTable {
    /// An empty table: every symbol goes to the catalog.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in curated list.
    pub fn curated() -> Self {
        CURATED.iter().copied().collect()
    }

    /// Identifier for a normalized (trimmed, lowercase) symbol.
    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.entries.get(symbol).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a table with `other` layered on top: its entries win on conflict.
    pub fn merged_with(mut self, other: OverrideTable) -> Self {
        self.entries.extend(other.entries);
        self
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for OverrideTable {
    /// Collects pairs, normalizing keys. Blank pairs are skipped; later pairs win.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries = IndexMap::new();
        for (k, v) in iter {
            let key = k.as_ref().trim().to_lowercase();
            let value = v.as_ref().trim().to_string();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            entries.insert(key, value);
        }
        Self { entries }
    }
}

/// On-disk shape of an overrides file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverridesFile {
    /// Symbol -> canonical identifier.
    #[serde(default)]
    pub overrides: IndexMap<String, String>,
}

/// Normalize a parsed overrides file into a table.
///
/// Errors:
/// - blank symbol or identifier after trimming
/// - two symbols that collide once lowercased (e.g. `UNI` and `uni`)
pub fn normalize_overrides(file: OverridesFile) -> Result<OverrideTable, ConfigError> {
    let mut entries = IndexMap::with_capacity(file.overrides.len());
    for (raw_symbol, raw_id) in file.overrides {
        let symbol = raw_symbol.trim().to_lowercase();
        if symbol.is_empty() {
            return Err(ConfigError::InvalidOverride(
                "symbol cannot be empty after trimming".to_string(),
            ));
        }
        let id = raw_id.trim().to_string();
        if id.is_empty() {
            return Err(ConfigError::InvalidOverride(format!(
                "identifier for '{symbol}' cannot be empty"
            )));
        }
        if entries.insert(symbol.clone(), id).is_some() {
            return Err(ConfigError::InvalidOverride(format!(
                "duplicate symbol after normalization: {symbol}"
            )));
        }
    }
    Ok(OverrideTable { entries })
}

/// Parse and normalize overrides from a TOML string.
pub fn load_overrides_str(toml_str: &str) -> Result<OverrideTable, ConfigError> {
    let file: OverridesFile = toml::from_str(toml_str)?;
    normalize_overrides(file)
}

/// Read, parse, and normalize an overrides file from disk.
pub fn load_overrides_path(path: impl AsRef<Path>) -> Result<OverrideTable, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::OverridesIo {
        path: path.to_path_buf(),
        source,
    })?;
    load_overrides_str(&text)
}
