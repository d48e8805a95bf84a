//! Session states and outcome payloads

use crate::classify::AddressClassification;
use crate::error::GeoError;
use crate::geo::GeoRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one lookup session; later sessions have larger tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a session ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    PrivateAddress,
    ProviderError,
    GeolocationError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::PrivateAddress => write!(f, "private-address"),
            FailureReason::ProviderError => write!(f, "provider-error"),
            FailureReason::GeolocationError => write!(f, "geolocation-error"),
        }
    }
}

/// State of a single lookup session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSession {
    Idle,
    Classifying,
    FetchingGeo,
    ReverseGeocoding,
    Displayed,
    Failed(FailureReason),
}

impl LookupSession {
    /// Whether the session has resolved
    pub fn is_terminal(&self) -> bool {
        matches!(self, LookupSession::Displayed | LookupSession::Failed(_))
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: LookupSession) -> bool {
        use LookupSession::*;
        matches!(
            (self, next),
            (Idle, Classifying)
                | (Idle, ReverseGeocoding)
                | (Idle, Failed(FailureReason::GeolocationError))
                | (Classifying, Failed(FailureReason::PrivateAddress))
                | (Classifying, FetchingGeo)
                | (FetchingGeo, ReverseGeocoding)
                | (FetchingGeo, Displayed)
                | (FetchingGeo, Failed(FailureReason::ProviderError))
                | (ReverseGeocoding, Displayed)
        )
    }
}

/// Device-position error, numbered like the browser geolocation API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeolocationErrorCode {
    Unsupported,
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl GeolocationErrorCode {
    pub fn code(&self) -> u8 {
        match self {
            GeolocationErrorCode::Unsupported => 0,
            GeolocationErrorCode::PermissionDenied => 1,
            GeolocationErrorCode::PositionUnavailable => 2,
            GeolocationErrorCode::Timeout => 3,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => GeolocationErrorCode::PermissionDenied,
            2 => GeolocationErrorCode::PositionUnavailable,
            3 => GeolocationErrorCode::Timeout,
            _ => GeolocationErrorCode::Unsupported,
        }
    }
}

impl fmt::Display for GeolocationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeolocationErrorCode::Unsupported => write!(f, "Geolocation is not supported"),
            GeolocationErrorCode::PermissionDenied => write!(f, "Location access was denied"),
            GeolocationErrorCode::PositionUnavailable => {
                write!(f, "Location information is unavailable")
            }
            GeolocationErrorCode::Timeout => write!(f, "Location request timed out"),
        }
    }
}

/// Locally obtained device position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters
    pub accuracy_m: Option<f64>,
}

/// What a failed session reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum FailureKind {
    PrivateAddress(AddressClassification),
    ProviderError,
    GeolocationError(GeolocationErrorCode),
}

impl FailureKind {
    pub fn reason(&self) -> FailureReason {
        match self {
            FailureKind::PrivateAddress(_) => FailureReason::PrivateAddress,
            FailureKind::ProviderError => FailureReason::ProviderError,
            FailureKind::GeolocationError(_) => FailureReason::GeolocationError,
        }
    }

    /// Retrying with the same input can help for everything but private addresses
    pub fn retriable(&self) -> bool {
        !matches!(self, FailureKind::PrivateAddress(_))
    }

    /// Actionable hint shown with the failure
    pub fn next_step(&self) -> &'static str {
        match self {
            FailureKind::PrivateAddress(_) => {
                "Enter a public IP address instead, or use your device location."
            }
            FailureKind::ProviderError => {
                "Check your internet connection and try again, or enter a different IP address."
            }
            FailureKind::GeolocationError(GeolocationErrorCode::PermissionDenied) => {
                "Please allow location access and try again."
            }
            FailureKind::GeolocationError(_) => "Please try again, or look up an IP address instead.",
        }
    }
}

/// Successful result of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum DisplayPayload {
    /// Address lookup; `resolved_address` is `None` when the record has no coordinates
    Address {
        record: GeoRecord,
        resolved_address: Option<String>,
    },
    /// Device position
    Position {
        fix: PositionFix,
        resolved_address: String,
    },
}

impl DisplayPayload {
    /// Location is unknown for this address: no map pin, no place name
    pub fn is_partial(&self) -> bool {
        matches!(self, DisplayPayload::Address { record, .. } if !record.has_coordinates())
    }

    pub fn record(&self) -> Option<&GeoRecord> {
        match self {
            DisplayPayload::Address { record, .. } => Some(record),
            DisplayPayload::Position { .. } => None,
        }
    }
}

/// Failed result of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePayload {
    pub kind: FailureKind,
    pub detail: String,
}

impl FailurePayload {
    /// The error a command reports for this failure
    pub fn to_error(&self) -> GeoError {
        match self.kind {
            FailureKind::PrivateAddress(class) => GeoError::PrivateAddress(class),
            FailureKind::ProviderError => GeoError::LookupFailed(self.detail.clone()),
            FailureKind::GeolocationError(code) => GeoError::GeolocationError(code),
        }
    }
}

/// Everything a session can hand to the display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum LookupOutcome {
    Displayed(DisplayPayload),
    Failed(FailurePayload),
}

impl LookupOutcome {
    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        LookupOutcome::Failed(FailurePayload {
            kind,
            detail: detail.into(),
        })
    }

    pub fn is_displayed(&self) -> bool {
        matches!(self, LookupOutcome::Displayed(_))
    }

    /// Session state this outcome corresponds to
    pub fn state(&self) -> LookupSession {
        match self {
            LookupOutcome::Displayed(_) => LookupSession::Displayed,
            LookupOutcome::Failed(f) => LookupSession::Failed(f.kind.reason()),
        }
    }
}
