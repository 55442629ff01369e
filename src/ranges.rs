//! Range entry parsing and matching
//!
//! Providers publish a mix of CIDR blocks and bare addresses. Entries are
//! stored as raw strings and only parsed when a lookup needs them.

use ipnet::IpNet;
use std::net::IpAddr;

/// Normalize raw lines from a provider into range entries.
///
/// Surrounding whitespace (spaces, tabs, carriage returns) is stripped and
/// lines that end up empty are dropped. Order is preserved.
pub fn normalize<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let trimmed = line.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// A single parsed entry from a provider's range list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeEntry {
    /// A CIDR block such as `10.0.0.0/8`
    Network(IpNet),
    /// Anything that is not a CIDR block, compared textually
    Literal(String),
}

impl RangeEntry {
    /// Parse a raw entry. Never fails: non-CIDR text becomes a literal.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<IpNet>() {
            Ok(net) => RangeEntry::Network(net),
            Err(_) => RangeEntry::Literal(raw.to_string()),
        }
    }

    /// Check whether this entry covers `ip`.
    ///
    /// `canonical` must be `ip.to_string()`; it is passed in so a scan over
    /// many entries formats the address only once.
    pub fn covers(&self, ip: &IpAddr, canonical: &str) -> bool {
        match self {
            RangeEntry::Network(net) => net.contains(ip),
            RangeEntry::Literal(text) => text == canonical,
        }
    }
}

/// Find the first entry in `ranges` that covers `ip`.
///
/// Scanning stops at the first hit.
pub fn first_match(ranges: &[String], ip: IpAddr) -> Option<&str> {
    let canonical = ip.to_string();
    ranges
        .iter()
        .find(|raw| RangeEntry::parse(raw).covers(&ip, &canonical))
        .map(String::as_str)
}
