//! Run-level error type and its process exit codes.

use thiserror::Error;

use crate::{
    config::ConfigError,
    db::store::StoreError,
    providers::{ProviderError, ProviderInitError},
};

/// Everything that can abort a run.
///
/// Per-record outcomes (unresolvable symbols, missing prices) are not errors;
/// they end up in the [`crate::sync::SyncReport`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The provider client could not be built.
    #[error("provider setup failed: {0}")]
    ProviderInit(#[from] ProviderInitError),

    /// A catalog or price request failed.
    #[error("HTTP error: {0}")]
    Provider(#[from] ProviderError),

    /// The record store failed.
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    /// Anything else.
    #[error("Unexpected error: {0}")]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Process exit status for this error.
    ///
    /// 1 configuration, 2 network/provider, 3 store, 4 anything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            Self::ProviderInit(ProviderInitError::ClientBuild(_)) => 2,
            Self::ProviderInit(_) => 1,
            Self::Provider(_) => 2,
            Self::Store(_) => 3,
            Self::Other(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::env::MissingEnvVarError;

    #[test]
    fn exit_codes_follow_fault_class() {
        let config = SyncError::from(ConfigError::from(MissingEnvVarError("DATABASE_URL".into())));
        let network = SyncError::from(ProviderError::RateLimited);
        let store = SyncError::from(StoreError::Query(diesel::result::Error::NotFound));
        let other = SyncError::from(anyhow::anyhow!("boom"));

        assert_eq!(config.exit_code(), 1);
        assert_eq!(network.exit_code(), 2);
        assert_eq!(store.exit_code(), 3);
        assert_eq!(other.exit_code(), 4);
        assert_eq!(
            config.to_string(),
            "configuration error: Missing environment variable: DATABASE_URL"
        );
    }

    #[test]
    fn bad_api_key_is_a_configuration_fault() {
        let bad = reqwest::header::HeaderValue::from_str("key\nwith newline").unwrap_err();
        assert_eq!(SyncError::from(ProviderInitError::from(bad)).exit_code(), 1);
    }
}
