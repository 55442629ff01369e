//! Compile-time defaults and environment overrides
//!
//! Default values are defined as public constants. The cache directory can
//! additionally be overridden through the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Maximum age of a cached range list before it must be refetched (7 days)
pub const DEFAULT_MAX_CACHE_AGE_SECS: u64 = 7 * 24 * 60 * 60;
/// Default time budget for one provider's cache-or-live fetch, in milliseconds
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 10_000;
/// Default time budget for a whole lookup, in milliseconds
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;
/// Default timeout for a single HTTP request, in milliseconds
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// Browser-like User-Agent; some vendor pages reject unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Environment variable that overrides the cache directory
pub const CACHE_DIR_ENV: &str = "CDNIP_CACHE_DIR";

/// Get the default maximum cache age
pub fn max_cache_age() -> Duration {
    Duration::from_secs(DEFAULT_MAX_CACHE_AGE_SECS)
}

/// Get the default per-provider timeout
pub fn provider_timeout() -> Duration {
    Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS)
}

/// Get the default whole-lookup timeout
pub fn query_timeout() -> Duration {
    Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS)
}

/// Get the default HTTP request timeout
pub fn http_timeout() -> Duration {
    Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS)
}

/// Cache directory from the environment, if set and non-empty
pub fn env_cache_dir() -> Option<PathBuf> {
    std::env::var_os(CACHE_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// The current user's home directory
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().filter(|path| !path.as_os_str().is_empty())
}
