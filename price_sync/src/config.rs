//! Run configuration for a price sync.
//!
//! Every tunable the job uses is carried explicitly in [`RunConfig`] and
//! [`ProviderConfig`] so tests can pass tiny batches and zero pacing.

use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use secrecy::SecretString;
use shared_utils::env::MissingEnvVarError;
use thiserror::Error;

/// Default CoinGecko API root.
pub const DEFAULT_API_BASE: &str = "https://api.coingecko.com/api/v3";
/// Header the demo tier expects the API key in.
pub const DEFAULT_API_KEY_HEADER: &str = "x-cg-demo-api-key";
/// Identifiers per `/simple/price` request.
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Pause between consecutive price batches.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1100);
/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// Knobs controlling batching, pacing, and timeouts for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum identifiers per price request.
    pub batch_size: NonZeroUsize,
    /// Fixed sleep inserted between price requests (never after the last).
    pub pacing: Duration,
    /// Timeout applied to each HTTP request.
    pub request_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            pacing: DEFAULT_PACING,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Where and how to reach the pricing provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API root without a trailing slash.
    pub base_url: String,
    /// Optional API key, sent in `api_key_header`.
    pub api_key: Option<SecretString>,
    /// Header name carrying the API key.
    pub api_key_header: String,
}

impl ProviderConfig {
    /// Build a provider config, normalizing the base URL.
    pub fn new(base_url: &str, api_key: Option<String>, api_key_header: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.map(|k| SecretString::new(k.into())),
            api_key_header: api_key_header.trim().to_string(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, None, DEFAULT_API_KEY_HEADER)
    }
}

/// Configuration faults. All of them are raised before the store or the
/// network is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or blank.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    /// The overrides file could not be read.
    #[error("failed to read overrides file {path}: {source}")]
    OverridesIo {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The overrides file is not valid TOML for the expected shape.
    #[error("invalid overrides TOML: {0}")]
    OverridesParse(#[from] toml::de::Error),

    /// An override entry is unusable after normalization.
    #[error("invalid override entry: {0}")]
    InvalidOverride(String),
}
