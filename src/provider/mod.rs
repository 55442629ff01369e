//! Range sources: adapters that fetch a provider's published ranges
//!
//! Each adapter performs the network request for one vendor and turns the
//! vendor's response into a flat list of range strings. Nothing else in the
//! crate talks to the network.

pub mod builtin;
pub mod http;

use async_trait::async_trait;

pub use builtin::Cdn;
pub use http::{parse_body, HttpSource, ResponseFormat};

/// Error type for fetching a provider's ranges
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Status code returned
        status: u16,
        /// URL that was requested
        url: String,
    },

    /// Response body could not be interpreted
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Something that can fetch a provider's raw range list
///
/// Implementations return entries already passed through
/// [`normalize`](crate::ranges::normalize).
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Fetch the current range list
    async fn fetch(&self) -> Result<Vec<String>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            FetchError::HttpError("connection refused".to_string()),
            FetchError::Status {
                status: 503,
                url: "https://example.net/ips".to_string(),
            },
            FetchError::ParseError("expected object".to_string()),
            FetchError::Timeout,
            FetchError::Other("boom".to_string()),
        ];

        for error in errors {
            let error_str = error.to_string();
            assert!(!error_str.is_empty());

            match error {
                FetchError::HttpError(msg) => assert!(error_str.contains(&msg)),
                FetchError::Status { status, url } => {
                    assert!(error_str.contains(&status.to_string()));
                    assert!(error_str.contains(&url));
                }
                FetchError::ParseError(msg) => assert!(error_str.contains(&msg)),
                FetchError::Timeout => assert!(error_str.contains("timed out")),
                FetchError::Other(msg) => assert_eq!(error_str, msg),
            }
        }
    }
}
