//! Search history store
//!
//! A capped, most-recent-first list of saved lookups, kept as one JSON blob
//! in a [`KeyValueStore`]. Each address appears at most once: saving it again
//! moves it to the front with the new data.

use crate::error::{GeoError, Result};
use crate::geo::GeoRecord;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Storage key of the history blob
pub const HISTORY_KEY: &str = "ipLookupHistory";

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 20;

/// Text used for values the provider did not supply
pub const UNKNOWN: &str = "Unknown";

/// Placeholder addresses that must never be saved
const PLACEHOLDERS: [&str; 2] = [UNKNOWN, "Loading..."];

/// One saved lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub address: String,
    pub address_family: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub coordinates_text: String,
    pub organization: String,
    pub captured_at: DateTime<Utc>,
}

impl SearchHistoryEntry {
    /// Build an entry from a displayed record
    pub fn from_record(id: i64, record: &GeoRecord, captured_at: DateTime<Utc>) -> Self {
        let or_unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            id,
            address: record.address.trim().to_string(),
            address_family: record.address_family.to_string(),
            country: or_unknown(&record.country),
            city: or_unknown(&record.city),
            region: or_unknown(&record.region),
            coordinates_text: record
                .coordinates
                .map(|c| c.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            organization: or_unknown(&record.organization),
            captured_at,
        }
    }
}

/// Aggregates shown on the history page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub distinct_countries: usize,
    pub most_recent: Option<DateTime<Utc>>,
}

/// Search history backed by a key-value store
pub struct SearchHistoryStore<S> {
    store: S,
    capacity: usize,
}

impl<S: KeyValueStore> SearchHistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_capacity(store, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(store: S, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Save a displayed record at the front of the history
    pub fn save(&self, record: &GeoRecord) -> Result<SearchHistoryEntry> {
        self.save_at(record, Utc::now())
    }

    /// Save with an explicit capture time
    pub fn save_at(&self, record: &GeoRecord, captured_at: DateTime<Utc>) -> Result<SearchHistoryEntry> {
        let address = record.address.trim();
        if address.is_empty() || PLACEHOLDERS.contains(&address) {
            return Err(GeoError::invalid_entry(format!(
                "'{}' is not a saveable address",
                address
            )));
        }

        let mut entries = self.list()?;

        // ids are capture times in millis, bumped past any existing id
        let max_id = entries.iter().map(|e| e.id).max().unwrap_or(i64::MIN);
        let id = captured_at.timestamp_millis().max(max_id.saturating_add(1));

        let entry = SearchHistoryEntry::from_record(id, record, captured_at);
        entries.retain(|e| e.address != entry.address);
        entries.insert(0, entry.clone());
        entries.truncate(self.capacity);

        self.write(&entries)?;
        log::info!("Saved {} to search history", entry.address);
        Ok(entry)
    }

    /// All entries, most recent first
    pub fn list(&self) -> Result<Vec<SearchHistoryEntry>> {
        let Some(blob) = self.store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&blob) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                log::warn!("Search history is corrupted, treating it as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Find one entry by id
    pub fn find(&self, id: i64) -> Result<Option<SearchHistoryEntry>> {
        Ok(self.list()?.into_iter().find(|e| e.id == id))
    }

    /// Remove an entry; missing ids are ignored
    pub fn remove(&self, id: i64) -> Result<()> {
        let mut entries = self.list()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            log::debug!("History entry {} not found, nothing to remove", id);
            return Ok(());
        }
        self.write(&entries)
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        self.store.remove(HISTORY_KEY)
    }

    /// Total entries, distinct known countries and the latest capture time
    pub fn stats(&self) -> Result<HistoryStats> {
        let entries = self.list()?;
        let countries: HashSet<&str> = entries
            .iter()
            .map(|e| e.country.trim())
            .filter(|c| !c.is_empty() && !PLACEHOLDERS.contains(c))
            .collect();

        Ok(HistoryStats {
            total: entries.len(),
            distinct_countries: countries.len(),
            most_recent: entries.iter().map(|e| e.captured_at).max(),
        })
    }

    fn write(&self, entries: &[SearchHistoryEntry]) -> Result<()> {
        let blob = serde_json::to_string(entries)?;
        self.store.set(HISTORY_KEY, &blob)
    }
}
