//! Cache-first wrapper around a range source

use super::store::CacheStore;
use crate::provider::{FetchError, RangeSource};
use crate::ranges::normalize;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Wraps a [`RangeSource`] so fetches prefer a fresh on-disk snapshot
///
/// A live fetch happens only when the snapshot is missing, empty, corrupt or
/// expired. Expired data is never served: if the live fetch then fails, the
/// failure is returned. A successful, non-empty live result is written back;
/// a failed write is logged and the live data is still returned.
#[derive(Clone)]
pub struct CachedSource {
    name: String,
    source: Arc<dyn RangeSource>,
    store: CacheStore,
}

impl CachedSource {
    /// Wrap `source`, caching its results in `store`
    pub fn new(name: impl Into<String>, source: Arc<dyn RangeSource>, store: CacheStore) -> Self {
        Self {
            name: name.into(),
            source,
            store,
        }
    }

    /// Provider name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing cache store
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Return cached ranges if fresh, otherwise fetch live and repopulate
    pub async fn fetch_with_cache(&self) -> Result<Vec<String>, FetchError> {
        match self.store.read().await {
            Ok(ranges) if !ranges.is_empty() => {
                trace!(
                    provider = %self.name,
                    entries = ranges.len(),
                    "serving ranges from cache"
                );
                return Ok(ranges);
            }
            Ok(_) => debug!(provider = %self.name, "cache is empty, fetching live"),
            Err(e) => debug!(
                provider = %self.name,
                error = %e,
                max_age = ?self.store.max_age(),
                "cache unusable, fetching live"
            ),
        }

        let ranges = self.fetch_live().await?;

        if !ranges.is_empty() {
            if let Err(e) = self.store.write(&ranges).await {
                warn!(
                    provider = %self.name,
                    path = %self.store.path().display(),
                    error = %e,
                    "failed to write range cache"
                );
            }
        }

        Ok(ranges)
    }

    /// Fetch from the wrapped source, bypassing the cache entirely
    pub async fn fetch_live(&self) -> Result<Vec<String>, FetchError> {
        let raw = self.source.fetch().await?;
        let ranges = normalize(raw);
        debug!(provider = %self.name, entries = ranges.len(), "fetched live ranges");
        Ok(ranges)
    }
}

impl std::fmt::Debug for CachedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSource")
            .field("name", &self.name)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RangeSource for CachedSource {
    async fn fetch(&self) -> Result<Vec<String>, FetchError> {
        self.fetch_with_cache().await
    }
}
