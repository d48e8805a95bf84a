//! Regular expressions for recognizing non-routable address prefixes
//!
//! Used when the input does not parse as an IP address at all, so that
//! something like `192.168.1.300` is still recognized as a private range
//! instead of being sent to a provider.

use once_cell::sync::Lazy;
use regex::Regex;

/// Private IPv4 prefixes: loopback, RFC1918 and link-local
pub static PRIVATE_V4_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:127\.|10\.|192\.168\.|169\.254\.|172\.(?:1[6-9]|2[0-9]|3[0-1])\.)")
        .expect("Failed to compile private IPv4 prefix regex")
});

/// Reserved IPv6 prefixes: loopback, link-local and unique-local
pub static RESERVED_V6_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:::1$|fe80:|fc00:|fd00:)")
        .expect("Failed to compile reserved IPv6 prefix regex")
});

/// Check whether text starts with a private IPv4 prefix
pub fn has_private_v4_prefix(text: &str) -> bool {
    PRIVATE_V4_PREFIX_RE.is_match(text)
}

/// Check whether text starts with a reserved IPv6 prefix
pub fn has_reserved_v6_prefix(text: &str) -> bool {
    RESERVED_V6_PREFIX_RE.is_match(text)
}
