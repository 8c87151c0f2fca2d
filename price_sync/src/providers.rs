//! Pricing provider abstraction.
//!
//! [`PriceProvider`] is the seam between the sync job and the remote pricing
//! API. It exposes the two read-only calls the job needs: the full catalog
//! listing and USD spot prices for one batch of identifiers. Batching and
//! pacing live above this trait in [`crate::pricing`], so an implementation only
//! ever sees a single request's worth of identifiers.
//!
//! The trait is async and object safe so the binary can hold a
//! `Box<dyn PriceProvider>` while tests hand in a recording fake.

pub mod coingecko;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    catalog::CatalogEntry,
    config::{ProviderConfig, RunConfig},
};

/// Remote source of the catalog and of USD prices.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch the full catalog listing, in provider order.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ProviderError>;

    /// Fetch USD prices for one batch of identifiers.
    ///
    /// Identifiers the provider has no usable USD price for are simply absent
    /// from the result.
    async fn fetch_usd_prices(&self, ids: &[String]) -> Result<Vec<PriceQuote>, ProviderError>;
}

/// A USD spot price for one canonical identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// Canonical identifier the price belongs to.
    pub coin_id: String,
    /// Exact, non-negative USD price.
    pub usd: Decimal,
    /// When the provider last refreshed this price, if reported.
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Errors that can occur while building a provider client.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    /// Failed to init the reqwest client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// API key contains characters that cannot go into a header.
    #[error("Invalid API key format: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),

    /// The configured API key header name is not a valid header name.
    #[error("Invalid API key header name: {0}")]
    InvalidApiKeyHeader(#[from] reqwest::header::InvalidHeaderName),
}

/// Errors that can occur while talking to a provider. Every variant is fatal
/// to the run.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure, timeout, or an undecodable body.
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered HTTP 429.
    #[error("API rate limit exceeded")]
    RateLimited,

    /// The provider answered with another non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        message: String,
    },
}

/// Build the provider used by the binary.
pub fn build_provider(
    cfg: &ProviderConfig,
    run: &RunConfig,
) -> Result<Box<dyn PriceProvider>, ProviderInitError> {
    let p = coingecko::CoinGeckoProvider::new(cfg, run)?;
    Ok(Box::new(p))
}
