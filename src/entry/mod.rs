//! Entry points
//!
//! One function per place a lookup can be started from: the address form,
//! the "detect my address" action, the location view that picks up the
//! handed-off address, the device-position action, and saving the displayed
//! result to history. All lookups go through the same orchestrator.

use crate::classify::validate_format;
use crate::error::{GeoError, Result};
use crate::geo::GeoBackend;
use crate::history::{SearchHistoryEntry, SearchHistoryStore};
use crate::lookup::{
    DisplayPayload, GeolocationErrorCode, LookupOrchestrator, LookupOutcome, PositionFix,
};
use crate::storage::{KeyValueStore, hand_off_address, selected_address};
use std::net::IpAddr;

/// Address form submit: validate and hand the address to the location view
pub fn home_submit<S: KeyValueStore>(input: &str, session: &S) -> Result<IpAddr> {
    let ip = validate_format(input)?;
    hand_off_address(session, &ip.to_string())?;
    log::debug!("Handed off {} for lookup", ip);
    Ok(ip)
}

/// "Detect my address" action
pub async fn detect_own_address<B: GeoBackend + ?Sized>(backend: &B) -> Result<String> {
    backend.discover_own_address().await.inspect_err(|e| {
        log::error!("IP detection error: {}", e);
    })
}

/// Location view: look up whatever address was handed off (empty means own address)
///
/// Returns `None` when a newer lookup superseded this one.
pub async fn location_page<B, S>(
    orchestrator: &LookupOrchestrator<B>,
    session: &S,
) -> Result<Option<LookupOutcome>>
where
    B: GeoBackend + 'static,
    S: KeyValueStore,
{
    let address = selected_address(session)?;
    log::info!(
        "Looking up {}",
        if address.is_empty() { "own address" } else { address.as_str() }
    );
    Ok(orchestrator.start(&address).run().await)
}

/// Device-position action
pub async fn current_position<B: GeoBackend + 'static>(
    orchestrator: &LookupOrchestrator<B>,
    position: std::result::Result<PositionFix, GeolocationErrorCode>,
) -> Option<LookupOutcome> {
    orchestrator.start_from_position(position).run().await
}

/// Save the record currently on display
///
/// Only address lookups carry a record; anything else is rejected as an
/// invalid entry.
pub fn save_displayed<S: KeyValueStore>(
    history: &SearchHistoryStore<S>,
    outcome: &LookupOutcome,
) -> Result<SearchHistoryEntry> {
    match outcome {
        LookupOutcome::Displayed(DisplayPayload::Address { record, .. }) => history.save(record),
        LookupOutcome::Displayed(DisplayPayload::Position { .. }) => Err(GeoError::invalid_entry(
            "device positions have no address to save",
        )),
        LookupOutcome::Failed(_) => Err(GeoError::invalid_entry("nothing is displayed")),
    }
}
