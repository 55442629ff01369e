//! Provider registry
//!
//! The registry maps provider names to their cache-wrapped sources. It is
//! built once with [`RegistryBuilder`] and is read-only afterwards, so it can
//! be shared across concurrent lookups behind an `Arc` without locking.

use crate::cache::{CacheStore, CachedSource};
use crate::config::{ConfigError, LookupConfig};
use crate::provider::{Cdn, FetchError, RangeSource};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Error returned when asking for a provider that was never registered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No provider with this name
    #[error("CDN provider not found: {0}")]
    NotFound(String),
}

/// A named provider and its cache-wrapped source
#[derive(Debug)]
pub struct Provider {
    name: String,
    source: CachedSource,
}

impl Provider {
    /// Create a provider whose cache lives under `cache_dir`
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn RangeSource>,
        cache_dir: impl Into<PathBuf>,
        max_age: Duration,
    ) -> Self {
        let name = name.into();
        let store = CacheStore::new(cache_dir.into(), &name, max_age);
        Self {
            source: CachedSource::new(name.clone(), source, store),
            name,
        }
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cache store backing this provider
    pub fn cache(&self) -> &CacheStore {
        self.source.store()
    }

    /// Fetch ranges, preferring a fresh cache
    pub async fn fetch_with_cache(&self) -> Result<Vec<String>, FetchError> {
        self.source.fetch_with_cache().await
    }

    /// Fetch ranges from the network, ignoring the cache
    pub async fn fetch_live(&self) -> Result<Vec<String>, FetchError> {
        self.source.fetch_live().await
    }
}

/// Read-only mapping from provider name to provider
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<Provider>>,
}

impl ProviderRegistry {
    /// Start building a registry whose caches follow `config`
    pub fn builder(config: &LookupConfig) -> Result<RegistryBuilder, ConfigError> {
        Ok(RegistryBuilder::new(
            config.resolved_cache_dir()?,
            config.max_cache_age,
        ))
    }

    /// Registry holding every built-in CDN provider
    pub fn with_builtin(config: &LookupConfig) -> Result<Self, ConfigError> {
        let builder = Cdn::all()
            .iter()
            .fold(Self::builder(config)?, |builder, cdn| {
                builder.register(cdn.name(), cdn.source(config))
            });
        Ok(builder.build())
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Result<Arc<Provider>, RegistryError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// All providers, keyed by name
    pub fn all(&self) -> &BTreeMap<String, Arc<Provider>> {
        &self.providers
    }

    /// Iterate over all providers in name order
    pub fn providers(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.providers.values()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if no providers are registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Builder for [`ProviderRegistry`]
///
/// Registering a name twice replaces the earlier provider.
pub struct RegistryBuilder {
    cache_dir: PathBuf,
    max_age: Duration,
    providers: BTreeMap<String, Arc<Provider>>,
}

impl RegistryBuilder {
    /// Create an empty builder storing caches under `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            max_age,
            providers: BTreeMap::new(),
        }
    }

    /// Register `source` under `name`
    pub fn register<S>(self, name: impl Into<String>, source: S) -> Self
    where
        S: RangeSource + 'static,
    {
        self.register_shared(name, Arc::new(source))
    }

    /// Register an already shared source under `name`
    pub fn register_shared(self, name: impl Into<String>, source: Arc<dyn RangeSource>) -> Self {
        let provider = Provider::new(name, source, self.cache_dir.clone(), self.max_age);
        self.register_provider(provider)
    }

    /// Register a fully constructed provider
    pub fn register_provider(mut self, provider: Provider) -> Self {
        self.providers
            .insert(provider.name().to_string(), Arc::new(provider));
        self
    }

    /// Finish building
    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers,
        }
    }
}
