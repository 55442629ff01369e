//! Error types for the public API

use crate::config::ConfigError;
use crate::provider::FetchError;
use crate::registry::RegistryError;
use thiserror::Error;

/// Errors surfaced by [`CdnIp`](crate::CdnIp)
#[derive(Debug, Error)]
pub enum CdnIpError {
    /// Configuration was rejected or a cache directory could not be found
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested provider is not registered
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Fetching a provider's ranges failed
    #[error("Fetching ranges for {provider} failed: {source}")]
    Fetch {
        /// Provider being fetched
        provider: String,
        /// Underlying failure
        source: FetchError,
    },

    /// Input was not an IP address
    #[error("Invalid IP address: {0}")]
    InvalidIp(String),

    /// Cache maintenance failed
    #[error("Cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),
}
