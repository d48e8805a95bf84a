//! Address classification
//!
//! Decides, without any network access, whether geolocating an address makes
//! sense at all. Loopback, private and link-local ranges are not routable on
//! the public internet, so providers have nothing useful to say about them.

use crate::error::{GeoError, Result};
use crate::regex::{has_private_v4_prefix, has_reserved_v6_prefix};
use ipnetwork::{Ipv4Network, Ipv6Network};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Result of classifying an address string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressClassification {
    /// IPv4 loopback, RFC1918 or link-local
    Private,
    /// IPv6 loopback, link-local or unique-local
    Reserved,
    /// Anything else, including input that is not an address at all
    Public,
}

impl AddressClassification {
    /// Whether a provider lookup is meaningful for this class
    pub fn is_public(&self) -> bool {
        matches!(self, AddressClassification::Public)
    }
}

impl fmt::Display for AddressClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressClassification::Private => write!(f, "Private"),
            AddressClassification::Reserved => write!(f, "Reserved"),
            AddressClassification::Public => write!(f, "Public"),
        }
    }
}

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Family of an address as written; anything with a colon is IPv6
    pub fn of(address: &str) -> Self {
        if address.contains(':') {
            AddressFamily::V6
        } else {
            AddressFamily::V4
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

static PRIVATE_V4_NETWORKS: Lazy<Vec<Ipv4Network>> = Lazy::new(|| {
    [
        (Ipv4Addr::new(127, 0, 0, 0), 8),
        (Ipv4Addr::new(10, 0, 0, 0), 8),
        (Ipv4Addr::new(172, 16, 0, 0), 12),
        (Ipv4Addr::new(192, 168, 0, 0), 16),
        (Ipv4Addr::new(169, 254, 0, 0), 16),
    ]
    .into_iter()
    .map(|(addr, prefix)| Ipv4Network::new(addr, prefix).expect("valid IPv4 network"))
    .collect()
});

static RESERVED_V6_NETWORKS: Lazy<Vec<Ipv6Network>> = Lazy::new(|| {
    [
        (Ipv6Addr::LOCALHOST, 128),
        (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10),
        (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),
    ]
    .into_iter()
    .map(|(addr, prefix)| Ipv6Network::new(addr, prefix).expect("valid IPv6 network"))
    .collect()
});

/// Classify an address string
///
/// Input is trimmed first. Empty input means "the caller's own address" and
/// is classified `Public` so the lookup goes ahead. Strings that do not parse
/// as an address are checked against textual prefixes and otherwise fall
/// through to `Public`, leaving the provider to reject them.
pub fn classify(address: &str) -> AddressClassification {
    let address = address.trim();
    if address.is_empty() {
        return AddressClassification::Public;
    }

    match address.parse::<IpAddr>() {
        Ok(ip) => classify_ip(ip),
        Err(_) => classify_text(address),
    }
}

/// Classify a parsed address
pub fn classify_ip(ip: IpAddr) -> AddressClassification {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return classify_v4(v4);
            }
            if RESERVED_V6_NETWORKS.iter().any(|net| net.contains(v6)) {
                AddressClassification::Reserved
            } else {
                AddressClassification::Public
            }
        }
    }
}

fn classify_v4(ip: Ipv4Addr) -> AddressClassification {
    if PRIVATE_V4_NETWORKS.iter().any(|net| net.contains(ip)) {
        AddressClassification::Private
    } else {
        AddressClassification::Public
    }
}

fn classify_text(address: &str) -> AddressClassification {
    if has_private_v4_prefix(address) {
        log::debug!("Unparseable address '{}' has a private IPv4 prefix", address);
        AddressClassification::Private
    } else if has_reserved_v6_prefix(address) {
        log::debug!("Unparseable address '{}' has a reserved IPv6 prefix", address);
        AddressClassification::Reserved
    } else {
        AddressClassification::Public
    }
}

/// Validate user input as an IPv4 or IPv6 address
///
/// Unlike [`classify`], empty input is rejected: a typed query must name an
/// address. Use the own-address path to look up the caller.
pub fn validate_format(input: &str) -> Result<IpAddr> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GeoError::InvalidAddressFormat(
            "Please enter an IP address.".to_string(),
        ));
    }
    trimmed
        .parse::<IpAddr>()
        .map_err(|_| GeoError::InvalidAddressFormat(trimmed.to_string()))
}
