//! On-disk snapshot of one provider's range list
//!
//! Each provider owns a single file, `.<name>.cdn.ip.range`, holding a JSON
//! record with the fetch time and the raw ranges. A snapshot is trusted only
//! while it is younger than the configured maximum age.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Distinguishes temp files of concurrent writers within one process
static WRITE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Persisted record for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Seconds since the Unix epoch when the ranges were fetched
    #[serde(rename = "Timestamp")]
    pub fetched_at: i64,
    /// Normalized range entries, in fetch order
    #[serde(rename = "IPRanges")]
    pub ranges: Vec<String>,
}

impl CacheSnapshot {
    /// Snapshot of `ranges` stamped with the current time
    pub fn now(ranges: Vec<String>) -> Self {
        Self {
            fetched_at: unix_now(),
            ranges,
        }
    }

    /// Age in seconds relative to `now`
    pub fn age_at(&self, now: i64) -> i64 {
        now - self.fetched_at
    }
}

/// Reasons a cache read cannot be trusted
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No snapshot has been written yet
    #[error("No cache file at {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but does not decode
    #[error("Corrupt cache file {}: {reason}", path.display())]
    Corrupt {
        /// File that failed to decode
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// The snapshot is older than the freshness window
    #[error("Cache expired ({age_secs}s old, limit {max_age_secs}s)")]
    Stale {
        /// Age of the snapshot in seconds
        age_secs: i64,
        /// Freshness window in seconds
        max_age_secs: u64,
        /// The expired ranges, for diagnostics only
        ranges: Vec<String>,
    },

    /// Filesystem failure
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Whatever ranges were decoded before the read was rejected
    pub fn ranges(&self) -> &[String] {
        match self {
            CacheError::Stale { ranges, .. } => ranges,
            _ => &[],
        }
    }
}

/// File-backed cache for one provider
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    max_age: Duration,
}

impl CacheStore {
    /// Create a store for `provider` under `dir`
    pub fn new(dir: impl AsRef<Path>, provider: &str, max_age: Duration) -> Self {
        Self {
            path: dir.as_ref().join(Self::file_name(provider)),
            max_age,
        }
    }

    /// File name used for `provider`.
    ///
    /// Characters that could escape the cache directory are replaced.
    pub fn file_name(provider: &str) -> String {
        let safe: String = provider
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!(".{safe}.cdn.ip.range")
    }

    /// Location of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Freshness window
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Load the snapshot, rejecting it if missing, corrupt or expired
    pub async fn read(&self) -> Result<Vec<String>, CacheError> {
        self.read_at(unix_now()).await
    }

    /// Load the snapshot, judging freshness against `now` (Unix seconds)
    pub async fn read_at(&self, now: i64) -> Result<Vec<String>, CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(CacheError::Io(e)),
        };

        let snapshot: CacheSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let age_secs = snapshot.age_at(now);
        let max_age_secs = self.max_age.as_secs();
        if age_secs > i64::try_from(max_age_secs).unwrap_or(i64::MAX) {
            return Err(CacheError::Stale {
                age_secs,
                max_age_secs,
                ranges: snapshot.ranges,
            });
        }

        trace!(path = %self.path.display(), age_secs, "cache snapshot is fresh");
        Ok(snapshot.ranges)
    }

    /// Persist `ranges` stamped with the current time, replacing any prior snapshot
    pub async fn write(&self, ranges: &[String]) -> Result<(), CacheError> {
        self.write_snapshot(&CacheSnapshot::now(ranges.to_vec()))
            .await
    }

    /// Persist an explicit snapshot.
    ///
    /// The record is written to a sibling temp file and renamed into place, so
    /// readers see either the old or the new snapshot, never a partial one.
    /// Both steps run on one blocking task, which completes even if the
    /// caller's future is dropped part way through.
    pub async fn write_snapshot(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| CacheError::Io(std::io::Error::other(e)))?;

        let path = self.path.clone();
        let tmp = self.temp_path();
        tokio::task::spawn_blocking(move || replace_file(&path, &tmp, &json))
            .await
            .map_err(|e| CacheError::Io(std::io::Error::other(e)))??;

        trace!(
            path = %self.path.display(),
            entries = snapshot.ranges.len(),
            "cache snapshot written"
        );
        Ok(())
    }

    /// Remove the snapshot file. A missing file is not an error.
    pub async fn clear(&self) -> Result<(), CacheError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let sequence = WRITE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.{}.tmp", std::process::id(), sequence));
        self.path.with_file_name(name)
    }
}

fn replace_file(path: &Path, tmp: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let result = std::fs::write(tmp, contents).and_then(|()| std::fs::rename(tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(tmp);
    }
    result
}

/// Current time in seconds since the Unix epoch
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
