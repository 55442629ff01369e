//! cdnip - identify which CDN, if any, serves an IP address
//!
//! Providers publish the address ranges their edge servers use. This library
//! fetches those lists (caching each on disk for a week), then answers "who
//! owns this address?" by racing every provider concurrently and returning
//! the first one whose ranges contain it.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod provider;
pub mod ranges;
pub mod registry;

// Re-export core types for library users
pub use cache::{CacheError, CacheSnapshot, CacheStore, CachedSource};
pub use client::{CdnIp, WarmReport};
pub use config::{ConfigError, LookupConfig, LookupConfigBuilder};
pub use error::CdnIpError;
pub use lookup::LookupEngine;
pub use provider::{Cdn, FetchError, HttpSource, RangeSource, ResponseFormat};
pub use ranges::{first_match, normalize, RangeEntry};
pub use registry::{Provider, ProviderRegistry, RegistryBuilder, RegistryError};
