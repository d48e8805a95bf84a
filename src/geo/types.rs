//! Type definitions for the geolocation client
//!
//! Provider response shapes and the normalized `GeoRecord` they turn into.

use crate::classify::AddressFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Parse a provider `"lat,lon"` string
    ///
    /// Returns `None` unless both halves are finite numbers.
    pub fn parse(loc: &str) -> Option<Self> {
        let (lat, lon) = loc.split_once(',')?;
        let latitude = lat.trim().parse::<f64>().ok()?;
        let longitude = lon.trim().parse::<f64>().ok()?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        Some(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Normalized lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// Queried address, or the address the provider reported for "own address" lookups
    pub address: String,
    pub address_family: AddressFamily,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub organization: Option<String>,
    pub hostname: Option<String>,
    pub timezone: Option<String>,
}

impl GeoRecord {
    /// An empty record for an address
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            address_family: AddressFamily::of(&address),
            address,
            country: None,
            city: None,
            region: None,
            coordinates: None,
            organization: None,
            hostname: None,
            timezone: None,
        }
    }

    /// Normalize an address-lookup provider response
    ///
    /// `queried` wins over the reported `ip` so the record always describes
    /// what the user asked for.
    pub fn from_ipinfo(queried: &str, response: IpInfoResponse) -> Self {
        let queried = queried.trim();
        let address = if queried.is_empty() {
            non_empty(response.ip).unwrap_or_default()
        } else {
            queried.to_string()
        };

        let coordinates = response.loc.as_deref().and_then(Coordinates::parse);
        if coordinates.is_none() && response.loc.is_some() {
            log::debug!("Ignoring unparseable loc {:?} for {}", response.loc, address);
        }

        Self {
            address_family: AddressFamily::of(&address),
            address,
            country: non_empty(response.country),
            city: non_empty(response.city),
            region: non_empty(response.region),
            coordinates,
            organization: non_empty(response.org),
            hostname: non_empty(response.hostname),
            timezone: non_empty(response.timezone),
        }
    }

    /// Whether a map pin can be placed for this record
    pub fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }

    /// Short label for a map pin: address, then city and country when known
    pub fn pin_label(&self) -> String {
        let place = [self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        if place.is_empty() {
            format!("IP: {}", self.address)
        } else {
            format!("IP: {} ({})", self.address, place)
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Address-lookup provider response (ipinfo.io shape)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpInfoResponse {
    pub ip: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub loc: Option<String>,
    pub org: Option<String>,
    pub hostname: Option<String>,
    pub timezone: Option<String>,
}

/// Self-address provider response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelfAddressResponse {
    #[serde(alias = "ipAddress")]
    pub ip: Option<String>,
}

/// Reverse-geocoding provider response (OpenCage shape)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeResult {
    pub formatted: Option<String>,
}

impl GeocodeResponse {
    /// First non-empty formatted address
    pub fn first_formatted(self) -> Option<String> {
        self.results
            .into_iter()
            .filter_map(|r| non_empty(r.formatted))
            .next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_parse() {
        assert_eq!(
            Coordinates::parse("37.751,-97.822"),
            Some(Coordinates::new(37.751, -97.822))
        );
        assert_eq!(
            Coordinates::parse(" 1.5 , 2.5 "),
            Some(Coordinates::new(1.5, 2.5))
        );
        assert_eq!(Coordinates::parse("37.751"), None);
        assert_eq!(Coordinates::parse("abc,1"), None);
        assert_eq!(Coordinates::parse("NaN,1"), None);
        assert_eq!(Coordinates::parse(""), None);
    }

    #[test]
    fn test_from_ipinfo_full() {
        let response: IpInfoResponse = serde_json::from_str(
            r#"{"ip":"8.8.8.8","country":"US","city":"Mountain View","region":"California",
                "loc":"37.751,-97.822","org":"AS15169 Google LLC","hostname":"dns.google",
                "timezone":"America/Chicago"}"#,
        )
        .unwrap();
        let record = GeoRecord::from_ipinfo("8.8.8.8", response);

        assert_eq!(record.address, "8.8.8.8");
        assert_eq!(record.address_family, AddressFamily::V4);
        assert_eq!(record.country.as_deref(), Some("US"));
        assert_eq!(record.coordinates, Some(Coordinates::new(37.751, -97.822)));
        assert_eq!(record.hostname.as_deref(), Some("dns.google"));
    }

    #[test]
    fn test_from_ipinfo_without_loc() {
        let response: IpInfoResponse =
            serde_json::from_str(r#"{"ip":"2001:db8::1","country":"","org":"Example"}"#).unwrap();
        let record = GeoRecord::from_ipinfo("", response);

        assert_eq!(record.address, "2001:db8::1");
        assert_eq!(record.address_family, AddressFamily::V6);
        assert_eq!(record.country, None);
        assert!(!record.has_coordinates());
        assert_eq!(record.organization.as_deref(), Some("Example"));
    }

    #[test]
    fn test_self_address_alias() {
        let a: SelfAddressResponse = serde_json::from_str(r#"{"ip":"1.2.3.4"}"#).unwrap();
        let b: SelfAddressResponse = serde_json::from_str(r#"{"ipAddress":"1.2.3.4"}"#).unwrap();
        assert_eq!(a.ip, b.ip);
    }

    #[test]
    fn test_geocode_first_formatted() {
        let response: GeocodeResponse = serde_json::from_str(
            r#"{"results":[{"formatted":""},{"formatted":"Main St, Springfield"}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_formatted().as_deref(), Some("Main St, Springfield"));

        let empty: GeocodeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_formatted(), None);
    }

    #[test]
    fn test_pin_label() {
        let mut record = GeoRecord::new("8.8.8.8");
        assert_eq!(record.pin_label(), "IP: 8.8.8.8");
        record.city = Some("Mountain View".to_string());
        record.country = Some("US".to_string());
        assert_eq!(record.pin_label(), "IP: 8.8.8.8 (Mountain View, US)");
    }
}
