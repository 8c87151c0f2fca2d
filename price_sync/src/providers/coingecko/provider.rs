//! HTTP client for the CoinGecko REST API.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::{
    catalog::CatalogEntry,
    config::{ProviderConfig, RunConfig},
    providers::{
        PriceProvider, PriceQuote, ProviderError, ProviderInitError,
        coingecko::response::SimplePriceResponse,
    },
};

const USER_AGENT: &str = concat!("price-sync/", env!("CARGO_PKG_VERSION"));

/// HTTP client for a CoinGecko-compatible API.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    /// Creates a new provider.
    ///
    /// Every request carries `accept: application/json` and, when an API key is
    /// configured, the key in `cfg.api_key_header`. The run's request timeout
    /// applies to each call individually.
    pub fn new(cfg: &ProviderConfig, run: &RunConfig) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &cfg.api_key {
            let name = header::HeaderName::from_bytes(cfg.api_key_header.as_bytes())?;
            let mut value = header::HeaderValue::from_str(key.expose_secret())?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(run.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.base_url.clone(),
        })
    }

    async fn checked(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ProviderError> {
        let url = format!("{}/coins/list", self.base_url);
        debug!(%url, "fetching catalog");

        let response = self
            .client
            .get(&url)
            .query(&[("include_platform", "false")])
            .send()
            .await?;
        let entries = Self::checked(response)
            .await?
            .json::<Vec<CatalogEntry>>()
            .await?;

        Ok(entries)
    }

    async fn fetch_usd_prices(&self, ids: &[String]) -> Result<Vec<PriceQuote>, ProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/simple/price", self.base_url);
        let joined = ids.join(",");
        let query = [
            ("ids", joined.as_str()),
            ("vs_currencies", "usd"),
            ("include_last_updated_at", "true"),
        ];

        let response = self.client.get(&url).query(&query).send().await?;
        let payload = Self::checked(response)
            .await?
            .json::<SimplePriceResponse>()
            .await?;

        let mut quotes = Vec::with_capacity(payload.len());
        for (coin_id, entry) in payload {
            match entry.usd_price() {
                Ok(Some(usd)) => quotes.push(PriceQuote {
                    last_updated_at: entry.last_updated(),
                    coin_id,
                    usd,
                }),
                Ok(None) => {}
                Err(reason) => warn!(%coin_id, %reason, "dropping unusable quote"),
            }
        }

        debug!(requested = ids.len(), priced = quotes.len(), "price batch done");
        Ok(quotes)
    }
}
