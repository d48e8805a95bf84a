//! Outcome formatter - formats lookup outcomes and history for output
//!
//! Every view is built from a single payload in one pass, so a failure
//! replaces the whole output rather than patching part of a result.

use crate::geo::GeoRecord;
use crate::history::{HistoryStats, SearchHistoryEntry, UNKNOWN};
use crate::lookup::{DisplayPayload, FailureKind, FailurePayload, LookupOutcome, PositionFix};
use std::fmt::Write as FmtWrite;

use super::map::MapPin;

#[cfg(feature = "colored-output")]
use colored::Colorize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain or colored text
    Text,
    /// JSON format
    Json,
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Heading,
    Good,
    Warn,
    Bad,
}

fn paint(text: &str, tone: Tone, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }
    #[cfg(feature = "colored-output")]
    {
        match tone {
            Tone::Heading => text.bold().to_string(),
            Tone::Good => text.green().to_string(),
            Tone::Warn => text.yellow().to_string(),
            Tone::Bad => text.red().to_string(),
        }
    }
    #[cfg(not(feature = "colored-output"))]
    {
        let _ = tone;
        text.to_string()
    }
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNKNOWN)
}

/// Format a lookup outcome as text
pub fn format_outcome_text(outcome: &LookupOutcome, use_color: bool) -> String {
    match outcome {
        LookupOutcome::Displayed(DisplayPayload::Address {
            record,
            resolved_address,
        }) => format_record(record, resolved_address.as_deref(), use_color),
        LookupOutcome::Displayed(DisplayPayload::Position {
            fix,
            resolved_address,
        }) => format_position(fix, resolved_address, use_color),
        LookupOutcome::Failed(failure) => format_failure(failure, use_color),
    }
}

fn format_record(record: &GeoRecord, resolved_address: Option<&str>, use_color: bool) -> String {
    let mut out = String::new();
    let address = if record.address.is_empty() {
        UNKNOWN
    } else {
        record.address.as_str()
    };

    let _ = writeln!(
        out,
        "{}",
        paint(&format!("IP Address: {}", address), Tone::Heading, use_color)
    );
    if !record.has_coordinates() {
        let _ = writeln!(
            out,
            "{}",
            paint(
                "Precise location information is not available for this IP.",
                Tone::Warn,
                use_color
            )
        );
    }
    let _ = writeln!(out, "Country:     {}", or_unknown(&record.country));
    let _ = writeln!(out, "City:        {}", or_unknown(&record.city));
    let _ = writeln!(out, "Region:      {}", or_unknown(&record.region));
    if let Some(place) = resolved_address {
        let _ = writeln!(out, "Location:    {}", place);
    }
    let _ = writeln!(out, "ISP:         {}", or_unknown(&record.organization));
    let _ = writeln!(out, "Timezone:    {}", or_unknown(&record.timezone));
    if let Some(ref hostname) = record.hostname {
        let _ = writeln!(out, "Hostname:    {}", hostname);
    }
    if let Some(c) = record.coordinates {
        let _ = writeln!(out, "Coordinates: {}, {}", c.latitude, c.longitude);
    }

    write_pin(&mut out, &MapPin::for_record(record), use_color);
    out
}

fn write_pin(out: &mut String, pin: &MapPin, use_color: bool) {
    let _ = writeln!(out, "Pin:         {}", pin.label);
    let _ = write!(
        out,
        "Map:         {}",
        paint(&pin.url(), Tone::Good, use_color)
    );
}

fn format_position(fix: &PositionFix, resolved_address: &str, use_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", paint("Your Current Location", Tone::Heading, use_color));
    let _ = writeln!(
        out,
        "Coordinates: {:.6}, {:.6}",
        fix.latitude, fix.longitude
    );
    let _ = writeln!(out, "Address:     {}", resolved_address);
    if let Some(accuracy) = fix.accuracy_m {
        let _ = writeln!(out, "Accuracy:    {} meters", accuracy);
    }
    let _ = writeln!(out, "Source:      Device position");

    write_pin(&mut out, &MapPin::for_position(fix), use_color);
    out
}

fn format_failure(failure: &FailurePayload, use_color: bool) -> String {
    let heading = match failure.kind {
        FailureKind::PrivateAddress(class) => format!("{} IP address", class),
        FailureKind::ProviderError => "Unable to fetch IP information".to_string(),
        FailureKind::GeolocationError(code) => {
            format!("Unable to get your location (code {})", code.code())
        }
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", paint(&heading, Tone::Bad, use_color));
    let _ = writeln!(out, "{}", failure.detail);
    if matches!(failure.kind, FailureKind::PrivateAddress(_)) {
        let _ = writeln!(
            out,
            "Private IPs are used within local networks and cannot be geolocated."
        );
    }
    let _ = write!(out, "Next step: {}", failure.kind.next_step());
    out
}

/// Format a lookup outcome as JSON
///
/// Displayed outcomes carry their map pin, with its link, under `map`.
pub fn format_outcome_json(outcome: &LookupOutcome) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(outcome)?;
    if let LookupOutcome::Displayed(payload) = outcome
        && let Some(fields) = value.as_object_mut()
    {
        let pin = MapPin::for_payload(payload);
        let mut map = serde_json::to_value(&pin)?;
        if let Some(map_fields) = map.as_object_mut() {
            map_fields.insert("url".to_string(), serde_json::Value::String(pin.url()));
        }
        fields.insert("map".to_string(), map);
    }
    serde_json::to_string_pretty(&value)
}

/// Format the search history as text, one entry per line
pub fn format_history_text(entries: &[SearchHistoryEntry], use_color: bool) -> String {
    if entries.is_empty() {
        return "No saved lookups yet.".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        let place = [entry.city.as_str(), entry.country.as_str()]
            .into_iter()
            .filter(|part| *part != UNKNOWN)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "{}  {}  {}  {}  {}",
            paint(&entry.id.to_string(), Tone::Heading, use_color),
            entry.captured_at.format("%Y-%m-%d %H:%M:%S"),
            entry.address,
            if place.is_empty() { UNKNOWN } else { place.as_str() },
            entry.organization
        );
    }
    out.trim_end().to_string()
}

/// Format history aggregates as text
pub fn format_stats_text(stats: &HistoryStats) -> String {
    let most_recent = stats
        .most_recent
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "Never".to_string());
    format!(
        "Total searches:     {}\nCountries:          {}\nMost recent search: {}",
        stats.total, stats.distinct_countries, most_recent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AddressClassification;
    use crate::geo::Coordinates;
    use crate::lookup::GeolocationErrorCode;
    use chrono::{TimeZone, Utc};

    fn google() -> GeoRecord {
        let mut record = GeoRecord::new("8.8.8.8");
        record.country = Some("US".to_string());
        record.city = Some("Mountain View".to_string());
        record.organization = Some("AS15169 Google LLC".to_string());
        record
    }

    #[test]
    fn test_format_full_record() {
        let mut record = google();
        record.coordinates = Some(Coordinates::new(37.751, -97.822));
        let outcome = LookupOutcome::Displayed(DisplayPayload::Address {
            record,
            resolved_address: Some("Kansas, USA".to_string()),
        });

        let text = format_outcome_text(&outcome, false);
        assert!(text.starts_with("IP Address: 8.8.8.8"));
        assert!(text.contains("Location:    Kansas, USA"));
        assert!(text.contains("Timezone:    Unknown"));
        assert!(text.contains("mlat=37.751"));
        assert!(text.contains("Pin:         IP: 8.8.8.8 (Mountain View, US)"));
        assert!(!text.contains("not available"));
    }

    #[test]
    fn test_format_partial_record() {
        let outcome = LookupOutcome::Displayed(DisplayPayload::Address {
            record: google(),
            resolved_address: None,
        });

        let text = format_outcome_text(&outcome, false);
        assert!(text.contains("Precise location information is not available"));
        assert!(!text.contains("Location:"));
        assert!(text.contains("#map=2/0/0"));
        assert!(text.contains("Pin:         Location data not available"));
    }

    #[test]
    fn test_format_position() {
        let outcome = LookupOutcome::Displayed(DisplayPayload::Position {
            fix: PositionFix {
                latitude: 48.8584,
                longitude: 2.2945,
                accuracy_m: Some(15.0),
            },
            resolved_address: "Eiffel Tower, Paris".to_string(),
        });

        let text = format_outcome_text(&outcome, false);
        assert!(text.contains("Coordinates: 48.858400, 2.294500"));
        assert!(text.contains("Accuracy:    15 meters"));
        assert!(text.contains("Pin:         Your Location (accuracy: 15m)"));
    }

    #[test]
    fn test_format_failures() {
        let private = LookupOutcome::failed(
            FailureKind::PrivateAddress(AddressClassification::Private),
            "Location information is not available for private address 10.0.0.1.",
        );
        let text = format_outcome_text(&private, false);
        assert!(text.starts_with("Private IP address"));
        assert!(text.contains("Next step: Enter a public IP address"));

        let geo = LookupOutcome::failed(
            FailureKind::GeolocationError(GeolocationErrorCode::Timeout),
            "Unable to get your location. Location request timed out.",
        );
        assert!(format_outcome_text(&geo, false).contains("(code 3)"));
    }

    #[test]
    fn test_format_json() {
        let outcome = LookupOutcome::failed(FailureKind::ProviderError, "HTTP error! status: 500");
        let json = format_outcome_json(&outcome).unwrap();
        assert!(json.contains("\"outcome\": \"failed\""));
        assert!(json.contains("provider-error"));
        assert!(!json.contains("\"map\""));
    }

    #[test]
    fn test_format_json_includes_pin() {
        let mut record = google();
        record.coordinates = Some(Coordinates::new(37.751, -97.822));
        let outcome = LookupOutcome::Displayed(DisplayPayload::Address {
            record,
            resolved_address: None,
        });

        let json = format_outcome_json(&outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"], "displayed");
        assert_eq!(value["map"]["label"], "IP: 8.8.8.8 (Mountain View, US)");
        assert_eq!(value["map"]["zoom"], 10);
        assert_eq!(
            value["map"]["url"],
            "https://www.openstreetmap.org/?mlat=37.751&mlon=-97.822#map=10/37.751/-97.822"
        );
    }

    #[test]
    fn test_format_history() {
        assert_eq!(format_history_text(&[], false), "No saved lookups yet.");

        let captured_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let entry = SearchHistoryEntry::from_record(42, &google(), captured_at);
        let text = format_history_text(&[entry], false);
        assert_eq!(
            text,
            "42  2024-05-01 12:00:00  8.8.8.8  Mountain View, US  AS15169 Google LLC"
        );
    }

    #[test]
    fn test_format_stats() {
        let stats = HistoryStats {
            total: 0,
            distinct_countries: 0,
            most_recent: None,
        };
        assert!(format_stats_text(&stats).contains("Most recent search: Never"));
    }
}
