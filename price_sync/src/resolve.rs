//! Symbol -> canonical identifier resolution.
//!
//! Resolution is a strict priority chain; the first step that applies wins:
//!
//! 1. identifier already stored on the record ([`ResolutionReason::Metadata`])
//! 2. curated override ([`ResolutionReason::Override`])
//! 3. exactly one catalog entry for the symbol ([`ResolutionReason::UniqueSymbol`])
//!
//! Anything else is a [`ResolutionFailure`]. Ambiguous symbols are reported, not
//! guessed at.

use std::fmt;

use crate::catalog::{CatalogIndex, overrides::OverrideTable};

/// How an identifier was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionReason {
    /// Taken from the record's stored metadata.
    Metadata,
    /// Taken from the override table.
    Override,
    /// The only catalog entry with this symbol.
    UniqueSymbol,
}

impl fmt::Display for ResolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Metadata => "metadata",
            Self::Override => "override",
            Self::UniqueSymbol => "unique-symbol",
        })
    }
}

/// Why no identifier could be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// The symbol is missing or blank.
    EmptySymbol,
    /// No catalog entry carries the symbol.
    NotFound,
    /// Several catalog entries carry the symbol.
    Ambiguous(usize),
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySymbol => f.write_str("empty-symbol"),
            Self::NotFound => f.write_str("not-found"),
            Self::Ambiguous(n) => write!(f, "ambiguous:{n}"),
        }
    }
}

/// A chosen identifier and the step that chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical provider identifier.
    pub coin_id: String,
    /// Which step of the chain produced it.
    pub reason: ResolutionReason,
}

impl Resolution {
    fn new(coin_id: impl Into<String>, reason: ResolutionReason) -> Self {
        Self {
            coin_id: coin_id.into(),
            reason,
        }
    }
}

/// Resolve one record's symbol to a canonical identifier.
///
/// A non-blank `stored_id` is returned unchanged without looking at anything
/// else, even when the catalog disagrees with it.
pub fn resolve(
    symbol: Option<&str>,
    stored_id: Option<&str>,
    index: &CatalogIndex,
    overrides: &OverrideTable,
) -> Result<Resolution, ResolutionFailure> {
    if let Some(id) = stored_id.filter(|id| !id.trim().is_empty()) {
        return Ok(Resolution::new(id, ResolutionReason::Metadata));
    }

    let symbol = symbol.unwrap_or_default().trim().to_lowercase();
    if symbol.is_empty() {
        return Err(ResolutionFailure::EmptySymbol);
    }

    if let Some(id) = overrides.get(&symbol) {
        return Ok(Resolution::new(id, ResolutionReason::Override));
    }

    match index.candidates(&symbol) {
        [] => Err(ResolutionFailure::NotFound),
        [only] => Ok(Resolution::new(&only.id, ResolutionReason::UniqueSymbol)),
        many => Err(ResolutionFailure::Ambiguous(many.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn entry(id: &str, symbol: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.into(),
            symbol: symbol.into(),
            name: id.into(),
        }
    }

    fn index() -> CatalogIndex {
        CatalogIndex::build([
            entry("uniswap", "uni"),
            entry("bitcoin", "btc"),
            entry("ethereum", "eth"),
            entry("ethereum-wormhole", "eth"),
        ])
    }

    #[test]
    fn unique_symbol_matches_after_normalizing() {
        let got = resolve(Some("  BTC "), None, &index(), &OverrideTable::empty()).unwrap();
        assert_eq!(got, Resolution::new("bitcoin", ResolutionReason::UniqueSymbol));
    }

    #[test]
    fn two_candidates_are_ambiguous() {
        let err = resolve(Some("eth"), None, &index(), &OverrideTable::empty()).unwrap_err();
        assert_eq!(err, ResolutionFailure::Ambiguous(2));
        assert_eq!(err.to_string(), "ambiguous:2");
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let err = resolve(Some("xyz123"), None, &index(), &OverrideTable::curated()).unwrap_err();
        assert_eq!(err.to_string(), "not-found");
    }

    #[test]
    fn blank_or_missing_symbol_is_empty() {
        let table = OverrideTable::empty();
        assert_eq!(resolve(Some("   "), None, &index(), &table), Err(ResolutionFailure::EmptySymbol));
        assert_eq!(resolve(None, Some(""), &index(), &table), Err(ResolutionFailure::EmptySymbol));
    }

    #[test]
    fn override_beats_unique_catalog_match() {
        let table: OverrideTable = [("btc", "wrapped-bitcoin")].into_iter().collect();
        let got = resolve(Some("btc"), None, &index(), &table).unwrap();
        assert_eq!(got, Resolution::new("wrapped-bitcoin", ResolutionReason::Override));
    }

    #[test]
    fn override_resolves_ambiguous_symbol() {
        let table: OverrideTable = [("eth", "ethereum")].into_iter().collect();
        let got = resolve(Some("ETH"), None, &index(), &table).unwrap();
        assert_eq!(got.reason, ResolutionReason::Override);
    }

    #[test]
    fn whitespace_stored_id_is_ignored() {
        let got = resolve(Some("uni"), Some("  "), &index(), &OverrideTable::empty()).unwrap();
        assert_eq!(got.reason, ResolutionReason::UniqueSymbol);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn stored_id_always_wins_unchanged(
            stored in "[a-z0-9-]{1,12}",
            symbol in proptest::option::of("[ A-Za-z]{0,5}"),
            dupes in 0usize..4,
        ) {
            let entries = (0..dupes).map(|i| entry(&format!("coin-{i}"), symbol.as_deref().unwrap_or("x")));
            let idx = CatalogIndex::build(entries);
            let table: OverrideTable = symbol.iter().map(|s| (s.clone(), "override-id".to_string())).collect();

            let got = resolve(symbol.as_deref(), Some(&stored), &idx, &table).unwrap();
            prop_assert_eq!(got.coin_id, stored);
            prop_assert_eq!(got.reason, ResolutionReason::Metadata);
        }

        #[test]
        fn override_target_always_wins_over_catalog(
            symbol in "[a-z]{1,6}",
            target in "[a-z-]{1,12}",
            catalog_id in "[a-z-]{1,12}",
        ) {
            let idx = CatalogIndex::build([entry(&catalog_id, &symbol)]);
            let table: OverrideTable = [(symbol.clone(), target.clone())].into_iter().collect();

            let got = resolve(Some(&symbol.to_uppercase()), None, &idx, &table).unwrap();
            prop_assert_eq!(got, Resolution::new(target, ResolutionReason::Override));
        }
    }
}
