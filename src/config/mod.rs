//! Configuration types for CDN lookups

pub mod defaults;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Errors produced while validating or resolving a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A field holds a value that cannot work
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// No cache directory was configured and no home directory was found
    #[error("Could not determine a cache directory (set {env} or pass one explicitly)")]
    NoCacheDir {
        /// Environment variable that can supply the directory
        env: &'static str,
    },
}

/// Configuration shared by the registry, cache and lookup engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Directory holding the per-provider cache files (default: home directory)
    pub cache_dir: Option<PathBuf>,
    /// Maximum age of a cached range list (default: 7 days)
    pub max_cache_age: Duration,
    /// Time budget for each provider during a lookup (default: 10s)
    pub provider_timeout: Duration,
    /// Time budget for a whole lookup, if any (default: 30s)
    pub query_timeout: Option<Duration>,
    /// Timeout for a single HTTP request (default: 10s)
    pub http_timeout: Duration,
    /// User-Agent sent to provider endpoints
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_cache_age: defaults::max_cache_age(),
            provider_timeout: defaults::provider_timeout(),
            query_timeout: Some(defaults::query_timeout()),
            http_timeout: defaults::http_timeout(),
            user_agent: defaults::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl LookupConfig {
    /// Create a new LookupConfig builder
    pub fn builder() -> LookupConfigBuilder {
        LookupConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cache_age.is_zero() {
            return Err(ConfigError::Invalid(
                "max_cache_age must be greater than 0".to_string(),
            ));
        }
        if self.provider_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "provider_timeout must be greater than 0".to_string(),
            ));
        }
        if self.query_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Invalid(
                "query_timeout must be greater than 0".to_string(),
            ));
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "http_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve where cache files live.
    ///
    /// An explicit `cache_dir` wins, then `CDNIP_CACHE_DIR`, then the home
    /// directory.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf, ConfigError> {
        self.cache_dir
            .clone()
            .or_else(defaults::env_cache_dir)
            .or_else(defaults::home_dir)
            .ok_or(ConfigError::NoCacheDir {
                env: defaults::CACHE_DIR_ENV,
            })
    }
}

/// Builder for LookupConfig
pub struct LookupConfigBuilder {
    config: LookupConfig,
}

impl LookupConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LookupConfig::default(),
        }
    }

    /// Set the cache directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    /// Set the maximum cache age
    pub fn max_cache_age(mut self, age: Duration) -> Self {
        self.config.max_cache_age = age;
        self
    }

    /// Set the per-provider timeout
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider_timeout = timeout;
        self
    }

    /// Set the whole-lookup timeout; `None` disables it
    pub fn query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.query_timeout = timeout;
        self
    }

    /// Set the HTTP request timeout
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<LookupConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for LookupConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
