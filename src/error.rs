//! Error types for ipscope-rs
//!
//! This module defines custom error types using thiserror for better error handling.

use crate::classify::AddressClassification;
use crate::lookup::GeolocationErrorCode;
use thiserror::Error;

/// Main error type for ipscope-rs
///
/// Lookup sessions report failures as `FailureKind` payloads; a failed
/// outcome becomes one of these through `FailurePayload::to_error`.
#[derive(Error, Debug)]
pub enum GeoError {
    /// Transport failure or timeout talking to a provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Provider answered with a non-2xx status
    #[error("HTTP error! status: {0}")]
    HttpError(u16),

    /// Every provider in a fallback list failed
    #[error("All IP detection services failed")]
    AllProvidersExhausted,

    /// Input is not an IPv4 or IPv6 address
    #[error("Invalid IP address format: {0}")]
    InvalidAddressFormat(String),

    /// Address lookup failed at the provider
    #[error("Unable to fetch IP information: {0}")]
    LookupFailed(String),

    /// Address is not routable on the public internet
    #[error("{0} addresses cannot be geolocated")]
    PrivateAddress(AddressClassification),

    /// Device position could not be obtained
    #[error("Geolocation error (code {}): {}", .0.code(), .0)]
    GeolocationError(GeolocationErrorCode),

    /// History entry rejected before saving
    #[error("Invalid history entry: {0}")]
    InvalidEntry(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    YamlError(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias for ipscope-rs
pub type Result<T> = std::result::Result<T, GeoError>;

impl GeoError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GeoError::ConfigError(msg.into())
    }

    /// Create a network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        GeoError::NetworkError(msg.into())
    }

    /// Create an invalid entry error
    pub fn invalid_entry<S: Into<String>>(msg: S) -> Self {
        GeoError::InvalidEntry(msg.into())
    }

    /// Whether the same request may succeed if simply tried again
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            GeoError::NetworkError(_)
                | GeoError::HttpError(_)
                | GeoError::AllProvidersExhausted
                | GeoError::LookupFailed(_)
                | GeoError::GeolocationError(_)
        )
    }
}

/// Convert from anyhow::Error
impl From<anyhow::Error> for GeoError {
    fn from(err: anyhow::Error) -> Self {
        GeoError::Other(err.to_string())
    }
}

/// Convert from reqwest::Error
///
/// Status errors keep their code, everything else is a transport failure.
impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return GeoError::HttpError(status.as_u16());
        }
        if err.is_timeout() {
            return GeoError::NetworkError(format!("request timed out: {}", err));
        }
        GeoError::NetworkError(err.to_string())
    }
}
