//! Rendering of lookup outcomes and search history
//!
//! The orchestrator only produces payloads; this module turns them into
//! terminal text, JSON, or a map link.

pub mod formatter;
pub mod map;

pub use formatter::{
    OutputFormat, format_history_text, format_outcome_json, format_outcome_text,
    format_stats_text,
};
pub use map::MapPin;
