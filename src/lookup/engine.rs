//! Concurrent membership query across all registered providers
//!
//! Every provider gets its own task. Each task fetches its provider's ranges
//! (cache first) and scans them for the target address. The first task to
//! report a hit wins. Draining the join set to empty without a hit is the
//! only way a lookup concludes "no provider".
//!
//! Per-provider failures and timeouts never fail the lookup; they are logged
//! at debug level and treated as "no match here".

use crate::config::LookupConfig;
use crate::ranges::first_match;
use crate::registry::{Provider, ProviderRegistry};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

/// Races every registered provider for a target address
#[derive(Debug, Clone)]
pub struct LookupEngine {
    registry: Arc<ProviderRegistry>,
    provider_timeout: Duration,
    query_timeout: Option<Duration>,
}

impl LookupEngine {
    /// Create an engine over `registry` with timeouts taken from `config`
    pub fn new(registry: Arc<ProviderRegistry>, config: &LookupConfig) -> Self {
        Self {
            registry,
            provider_timeout: config.provider_timeout,
            query_timeout: config.query_timeout,
        }
    }

    /// Registry this engine queries
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Name of the provider owning `ip`, or `None` if no provider claims it.
    ///
    /// If several providers claim the address, whichever answers first wins.
    /// Tasks still running once a winner is found are detached and finish in
    /// the background, so their cache writes are not lost.
    pub async fn locate(&self, ip: IpAddr) -> Option<String> {
        let ip = ip.to_canonical();

        match self.query_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.race(ip)).await {
                Ok(found) => found,
                Err(_) => {
                    warn!(%ip, timeout = ?limit, "lookup timed out");
                    None
                }
            },
            None => self.race(ip).await,
        }
    }

    async fn race(&self, ip: IpAddr) -> Option<String> {
        let mut tasks = JoinSet::new();
        for provider in self.registry.providers() {
            let provider = Arc::clone(provider);
            let limit = self.provider_timeout;
            tasks.spawn(probe(provider, ip, limit));
        }

        let mut winner = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(name)) => {
                    winner = Some(name);
                    break;
                }
                Ok(None) => {}
                Err(e) => debug!(error = %e, "provider task did not complete"),
            }
        }

        tasks.detach_all();
        winner
    }
}

/// Fetch one provider's ranges and check them for `ip`
async fn probe(provider: Arc<Provider>, ip: IpAddr, limit: Duration) -> Option<String> {
    let ranges = match tokio::time::timeout(limit, provider.fetch_with_cache()).await {
        Ok(Ok(ranges)) => ranges,
        Ok(Err(e)) => {
            debug!(provider = provider.name(), error = %e, "fetch failed, skipping provider");
            return None;
        }
        Err(_) => {
            debug!(
                provider = provider.name(),
                timeout = ?limit,
                "fetch timed out, skipping provider"
            );
            return None;
        }
    };

    let entry = first_match(&ranges, ip)?;
    trace!(provider = provider.name(), %ip, entry, "address matched");
    Some(provider.name().to_string())
}
