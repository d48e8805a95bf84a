//! ipscope-rs: IP geolocation lookup through online providers
//!
//! Classifies addresses locally, looks up public ones through an ordered
//! list of providers, reverse geocodes coordinates, and keeps a capped
//! history of saved lookups.
//!
//! ```no_run
//! use ipscope_rs::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo() -> ipscope_rs::Result<()> {
//! let client = GeoClient::new(AppConfig::default().providers)?;
//! let orchestrator = LookupOrchestrator::new(
//!     Arc::new(client),
//!     Arc::new(|_token: SessionToken, outcome: LookupOutcome| {
//!         println!("{}", format_outcome_text(&outcome, false));
//!     }),
//! );
//! orchestrator.start("8.8.8.8").run().await;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod geo;
pub mod history;
pub mod lookup;
pub mod prelude;
pub mod regex;
pub mod render;
pub mod storage;
pub mod utils;

// Re-export common types
pub use error::{GeoError, Result};
