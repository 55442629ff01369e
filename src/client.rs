//! High-level entry point
//!
//! [`CdnIp`] owns the configuration, the provider registry and the lookup
//! engine, and exposes the operations a caller needs: identify an address,
//! fetch one provider's ranges, and pre-warm every cache.

use crate::config::LookupConfig;
use crate::error::CdnIpError;
use crate::lookup::LookupEngine;
use crate::provider::FetchError;
use crate::registry::{Provider, ProviderRegistry};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::debug;

/// CDN identification service
///
/// # Examples
///
/// ```no_run
/// use cdnip::CdnIp;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cdn = CdnIp::new()?;
///
///     match cdn.lookup("104.16.1.1".parse()?).await {
///         Some(name) => println!("served by {name}"),
///         None => println!("not a known CDN address"),
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CdnIp {
    config: LookupConfig,
    engine: LookupEngine,
}

impl CdnIp {
    /// Create a service with every built-in provider and default settings
    pub fn new() -> Result<Self, CdnIpError> {
        Self::with_config(LookupConfig::default())
    }

    /// Create a service with every built-in provider
    pub fn with_config(config: LookupConfig) -> Result<Self, CdnIpError> {
        config.validate()?;
        let registry = ProviderRegistry::with_builtin(&config)?;
        Self::with_registry(config, registry)
    }

    /// Create a service over a caller-supplied registry
    pub fn with_registry(
        config: LookupConfig,
        registry: ProviderRegistry,
    ) -> Result<Self, CdnIpError> {
        config.validate()?;
        let engine = LookupEngine::new(Arc::new(registry), &config);
        Ok(Self { config, engine })
    }

    /// Active configuration
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Provider registry
    pub fn registry(&self) -> &ProviderRegistry {
        self.engine.registry()
    }

    /// Names of all registered providers
    pub fn providers(&self) -> Vec<&str> {
        self.registry().names()
    }

    /// Identify the provider owning `ip`. Never fails; `None` means no match.
    pub async fn lookup(&self, ip: IpAddr) -> Option<String> {
        self.engine.locate(ip).await
    }

    /// Parse `ip` and identify its provider
    pub async fn lookup_str(&self, ip: &str) -> Result<Option<String>, CdnIpError> {
        let addr: IpAddr = ip
            .trim()
            .parse()
            .map_err(|_| CdnIpError::InvalidIp(ip.to_string()))?;
        Ok(self.lookup(addr).await)
    }

    /// Look up a registered provider
    pub fn provider(&self, name: &str) -> Result<Arc<Provider>, CdnIpError> {
        Ok(self.registry().get(name)?)
    }

    /// Fetch one provider's ranges, from cache if fresh.
    ///
    /// Bounded by the configured provider timeout.
    pub async fn fetch(&self, name: &str) -> Result<Vec<String>, CdnIpError> {
        let provider = self.provider(name)?;
        self.bounded_fetch(&provider)
            .await
            .map_err(|source| CdnIpError::Fetch {
                provider: name.to_string(),
                source,
            })
    }

    /// Fetch every provider's ranges concurrently so later lookups hit the cache.
    ///
    /// Individual failures do not stop the others; they are recorded in the
    /// returned report.
    pub async fn warm_all(&self) -> WarmReport {
        let fetches = self.registry().providers().map(|provider| async move {
            let outcome = self
                .bounded_fetch(provider)
                .await
                .map(|ranges| ranges.len())
                .map_err(|e| e.to_string());
            if let Err(e) = &outcome {
                debug!(provider = provider.name(), error = %e, "warm-up fetch failed");
            }
            (provider.name().to_string(), outcome)
        });

        WarmReport {
            results: join_all(fetches).await.into_iter().collect(),
        }
    }

    async fn bounded_fetch(&self, provider: &Provider) -> Result<Vec<String>, FetchError> {
        timeout(self.config.provider_timeout, provider.fetch_with_cache())
            .await
            .unwrap_or(Err(FetchError::Timeout))
    }

    /// Delete every provider's cache file
    pub async fn clear_caches(&self) -> Result<(), CdnIpError> {
        for provider in self.registry().providers() {
            provider.cache().clear().await?;
        }
        Ok(())
    }
}

/// Outcome of [`CdnIp::warm_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmReport {
    /// Per provider: number of ranges now available, or the failure message
    pub results: BTreeMap<String, Result<usize, String>>,
}

impl WarmReport {
    /// Providers that are ready
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, usize)> {
        self.results
            .iter()
            .filter_map(|(name, outcome)| {
                outcome.as_ref().ok().map(|count| (name.as_str(), *count))
            })
    }

    /// Providers that failed, with their error messages
    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results
            .iter()
            .filter_map(|(name, outcome)| {
                outcome.as_ref().err().map(|e| (name.as_str(), e.as_str()))
            })
    }
}
