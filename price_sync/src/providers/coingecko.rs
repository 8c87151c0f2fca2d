//! CoinGecko-compatible REST provider.

pub mod provider;
pub mod response;

pub use provider::CoinGeckoProvider;
