//! Built-in CDN providers

use super::http::{HttpSource, ResponseFormat};
use crate::config::LookupConfig;
use std::fmt;
use std::str::FromStr;

/// CDN providers with a published range list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cdn {
    /// Akamai origin ACL documentation page
    Akamai,
    /// Bunny.net edge server list
    Bunny,
    /// CacheFly CDN list
    CacheFly,
    /// Cloudflare IPv4 list
    CloudFlare,
    /// Amazon CloudFront global list
    CloudFront,
    /// Fastly public IP list
    Fastly,
    /// Gcore CDN public IP list
    GCore,
    /// Google Cloud IPv4 prefixes
    Google,
    /// KeyCDN shield prefixes
    Key,
    /// QUIC.cloud node list
    Quic,
}

impl Cdn {
    /// Registry name of this provider
    pub fn name(&self) -> &'static str {
        match self {
            Cdn::Akamai => "akamai",
            Cdn::Bunny => "bunny",
            Cdn::CacheFly => "cachefly",
            Cdn::CloudFlare => "cloudflare",
            Cdn::CloudFront => "cloudfront",
            Cdn::Fastly => "fastly",
            Cdn::GCore => "gcore",
            Cdn::Google => "google",
            Cdn::Key => "key",
            Cdn::Quic => "quic",
        }
    }

    /// Endpoint publishing this provider's ranges
    pub fn url(&self) -> &'static str {
        match self {
            Cdn::Akamai => {
                "https://techdocs.akamai.com/origin-ip-acl/docs/update-your-origin-server"
            }
            Cdn::Bunny => "https://api.bunny.net/system/edgeserverlist/plain",
            Cdn::CacheFly => "https://cachefly.cachefly.net/ips/cdn.txt",
            Cdn::CloudFlare => "https://www.cloudflare.com/ips-v4",
            Cdn::CloudFront => "https://d7uri8nf7uskq.cloudfront.net/tools/list-cloudfront-ips",
            Cdn::Fastly => "https://api.fastly.com/public-ip-list",
            Cdn::GCore => "https://api.gcore.com/cdn/public-ip-list",
            Cdn::Google => "https://www.gstatic.com/ipranges/cloud.json",
            Cdn::Key => "https://www.keycdn.com/shield-prefixes.json",
            Cdn::Quic => "https://quic.cloud/ips",
        }
    }

    /// How the endpoint's response is laid out
    pub fn format(&self) -> ResponseFormat {
        match self {
            Cdn::Akamai => ResponseFormat::HtmlBlock("rdmd-code"),
            Cdn::Bunny | Cdn::CacheFly | Cdn::CloudFlare => ResponseFormat::Lines,
            Cdn::CloudFront => ResponseFormat::JsonList("CLOUDFRONT_GLOBAL_IP_LIST"),
            Cdn::Fastly | Cdn::GCore => ResponseFormat::JsonList("addresses"),
            Cdn::Google => ResponseFormat::JsonObjectList {
                list: "prefixes",
                field: "ipv4Prefix",
            },
            Cdn::Key => ResponseFormat::JsonList("prefixes"),
            Cdn::Quic => ResponseFormat::Separated("<br />"),
        }
    }

    /// Build the HTTP source for this provider
    pub fn source(&self, config: &LookupConfig) -> HttpSource {
        HttpSource::new(
            self.url(),
            self.format(),
            config.http_timeout,
            config.user_agent.clone(),
        )
    }

    /// Get all built-in providers
    pub fn all() -> &'static [Cdn] {
        &[
            Cdn::Akamai,
            Cdn::Bunny,
            Cdn::CacheFly,
            Cdn::CloudFlare,
            Cdn::CloudFront,
            Cdn::Fastly,
            Cdn::GCore,
            Cdn::Google,
            Cdn::Key,
            Cdn::Quic,
        ]
    }
}

impl fmt::Display for Cdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a name does not match any built-in provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown CDN provider: {0}")]
pub struct UnknownCdn(pub String);

impl FromStr for Cdn {
    type Err = UnknownCdn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cdn::all()
            .iter()
            .copied()
            .find(|cdn| cdn.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCdn(s.to_string()))
    }
}
