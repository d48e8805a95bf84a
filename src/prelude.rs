//! Commonly used types
//!
//! This module re-exports the types most callers of ipscope-rs need.

pub use crate::classify::{AddressClassification, AddressFamily, classify, validate_format};
pub use crate::config::AppConfig;
pub use crate::error::{GeoError, Result};
pub use crate::geo::{Coordinates, GeoBackend, GeoClient, GeoRecord};
pub use crate::history::{HistoryStats, SearchHistoryEntry, SearchHistoryStore};
pub use crate::lookup::{
    DisplayPayload, DisplaySink, FailureKind, GeolocationErrorCode, LookupOrchestrator,
    LookupOutcome, PositionFix, SessionToken,
};
pub use crate::render::{format_outcome_json, format_outcome_text};
pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};
