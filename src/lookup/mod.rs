//! Lookup orchestration
//!
//! A lookup session moves through classification, provider lookup and
//! reverse geocoding, and ends with exactly one outcome handed to a
//! [`DisplaySink`]. Sessions superseded by a newer one are discarded.

pub mod orchestrator;
pub mod types;

pub use orchestrator::{DisplaySink, LookupOrchestrator, Session};
pub use types::{
    DisplayPayload, FailureKind, FailurePayload, FailureReason, GeolocationErrorCode,
    LookupOutcome, LookupSession, PositionFix, SessionToken,
};
