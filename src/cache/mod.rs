//! Per-provider range caching

pub mod cached;
pub mod store;

pub use cached::CachedSource;
pub use store::{unix_now, CacheError, CacheSnapshot, CacheStore};
