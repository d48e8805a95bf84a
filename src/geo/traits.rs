//! Trait definitions for the geolocation client
//!
//! The lookup orchestrator only talks to providers through this trait.

use crate::error::Result;
use async_trait::async_trait;

use super::types::GeoRecord;

/// Returned by reverse geocoding whenever no provider produced an address
pub const ADDRESS_LOOKUP_FAILED: &str = "Address lookup failed";

/// Provider-facing operations used by a lookup
#[async_trait]
pub trait GeoBackend: Send + Sync {
    /// Discover the caller's own public address
    async fn discover_own_address(&self) -> Result<String>;

    /// Look up an address; empty means the caller's own address
    async fn lookup(&self, address: &str) -> Result<GeoRecord>;

    /// Resolve coordinates to a place name
    ///
    /// Best effort: falls back to [`ADDRESS_LOOKUP_FAILED`] instead of failing.
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String;

    /// Backend name (for logs)
    fn name(&self) -> &str;
}
