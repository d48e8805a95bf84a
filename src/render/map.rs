//! Map pins
//!
//! The terminal has no map widget, so a pin is rendered as an OpenStreetMap
//! link centered on the marker.

use crate::geo::GeoRecord;
use crate::lookup::{DisplayPayload, PositionFix};
use serde::Serialize;

/// Zoom used for a located pin
const PIN_ZOOM: u8 = 10;

/// Zoom used when nothing is known and the whole world is shown
const WORLD_ZOOM: u8 = 2;

/// A marker with its popup label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPin {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    pub zoom: u8,
}

impl MapPin {
    pub fn new(latitude: f64, longitude: f64, label: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            label: label.into(),
            zoom: PIN_ZOOM,
        }
    }

    /// World view for records without coordinates
    pub fn world() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            label: "Location data not available".to_string(),
            zoom: WORLD_ZOOM,
        }
    }

    /// Pin for a lookup record, falling back to the world view
    pub fn for_record(record: &GeoRecord) -> Self {
        match record.coordinates {
            Some(c) => Self::new(c.latitude, c.longitude, record.pin_label()),
            None => Self::world(),
        }
    }

    /// Pin for a device position, labelled with its accuracy when known
    pub fn for_position(fix: &PositionFix) -> Self {
        let label = match fix.accuracy_m {
            Some(accuracy) => format!("Your Location (accuracy: {}m)", accuracy),
            None => "Your Location".to_string(),
        };
        Self::new(fix.latitude, fix.longitude, label)
    }

    pub fn for_payload(payload: &DisplayPayload) -> Self {
        match payload {
            DisplayPayload::Address { record, .. } => Self::for_record(record),
            DisplayPayload::Position { fix, .. } => Self::for_position(fix),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map={zoom}/{lat}/{lon}",
            lat = self.latitude,
            lon = self.longitude,
            zoom = self.zoom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;

    #[test]
    fn test_pin_url() {
        let pin = MapPin::new(37.751, -97.822, "IP: 8.8.8.8");
        assert_eq!(
            pin.url(),
            "https://www.openstreetmap.org/?mlat=37.751&mlon=-97.822#map=10/37.751/-97.822"
        );
    }

    #[test]
    fn test_pin_for_record() {
        let mut record = GeoRecord::new("8.8.8.8");
        assert_eq!(MapPin::for_record(&record), MapPin::world());

        record.coordinates = Some(Coordinates::new(1.5, 2.5));
        let pin = MapPin::for_record(&record);
        assert_eq!(pin.zoom, 10);
        assert_eq!(pin.label, "IP: 8.8.8.8");
    }

    #[test]
    fn test_pin_for_position() {
        let mut fix = PositionFix {
            latitude: 48.8584,
            longitude: 2.2945,
            accuracy_m: Some(15.0),
        };
        assert_eq!(MapPin::for_position(&fix).label, "Your Location (accuracy: 15m)");

        fix.accuracy_m = None;
        let payload = DisplayPayload::Position {
            fix,
            resolved_address: "Paris".to_string(),
        };
        let pin = MapPin::for_payload(&payload);
        assert_eq!(pin.label, "Your Location");
        assert_eq!(pin.zoom, 10);
    }
}
