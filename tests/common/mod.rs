//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cdnip::{FetchError, RangeSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a fake provider does when fetched
#[derive(Clone)]
pub enum Behavior {
    /// Return these ranges
    Ranges(Vec<String>),
    /// Return these ranges after a delay
    Slow(Duration, Vec<String>),
    /// Fail immediately
    Fail,
    /// Never complete
    Hang,
}

/// Range source with scripted behavior and a call counter
pub struct FakeSource {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn ranges(list: &[&str]) -> Arc<Self> {
        Self::new(Behavior::Ranges(strings(list)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RangeSource for FakeSource {
    async fn fetch(&self) -> Result<Vec<String>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Ranges(ranges) => Ok(ranges.clone()),
            Behavior::Slow(delay, ranges) => {
                tokio::time::sleep(*delay).await;
                Ok(ranges.clone())
            }
            Behavior::Fail => Err(FetchError::HttpError("connection refused".to_string())),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

pub fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}
