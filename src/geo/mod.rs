//! Geolocation client module
//!
//! Talks to third-party providers: self-address discovery with ordered
//! fallback, address lookup, and best-effort reverse geocoding.
//!
//! # Module Organization
//!
//! - `types`: Provider response shapes and the normalized `GeoRecord`
//! - `traits`: The `GeoBackend` trait the orchestrator depends on
//! - `client`: HTTP implementation on top of reqwest

pub mod client;
pub mod traits;
pub mod types;

pub use client::GeoClient;
pub use traits::{ADDRESS_LOOKUP_FAILED, GeoBackend};
pub use types::{Coordinates, GeoRecord, GeocodeResponse, IpInfoResponse, SelfAddressResponse};
