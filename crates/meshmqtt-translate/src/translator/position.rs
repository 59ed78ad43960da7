//! Position translation
//!
//! Optional wire fields stay in the document as `null` when absent.

use serde::Serialize;

use crate::proto::{self, LocSource};

/// Position fix as published.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Position {
    /// Latitude in 1e-7 degrees
    pub latitude_i: Option<i32>,
    /// Longitude in 1e-7 degrees
    pub longitude_i: Option<i32>,
    pub altitude: Option<i32>,
    pub time: u32,
    pub location_source: String,
    #[serde(rename = "PDOP")]
    pub pdop: u32,
    pub ground_speed: Option<u32>,
    pub ground_track: Option<u32>,
    pub sats_in_view: u32,
    pub precision_bits: u32,
}

impl From<proto::Position> for Position {
    fn from(p: proto::Position) -> Self {
        Self {
            latitude_i: p.latitude_i,
            longitude_i: p.longitude_i,
            altitude: p.altitude,
            time: p.time,
            location_source: LocSource::name_of(p.location_source),
            pdop: p.pdop,
            ground_speed: p.ground_speed,
            ground_track: p.ground_track,
            sats_in_view: p.sats_in_view,
            precision_bits: p.precision_bits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_position_translation() {
        let position = Position::from(proto::Position {
            latitude_i: Some(-274169856),
            longitude_i: Some(1530101760),
            altitude: Some(59),
            time: 1762932009,
            location_source: LocSource::LocInternal as i32,
            pdop: 366,
            ground_speed: Some(2),
            ground_track: Some(0),
            sats_in_view: 5,
            precision_bits: 16,
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_value(&position).unwrap(),
            json!({
                "latitude_i": -274169856,
                "longitude_i": 1530101760,
                "altitude": 59,
                "time": 1762932009,
                "location_source": "LOC_INTERNAL",
                "PDOP": 366,
                "ground_speed": 2,
                "ground_track": 0,
                "sats_in_view": 5,
                "precision_bits": 16
            })
        );
    }

    #[test]
    fn test_absent_optionals_are_null() {
        let value = serde_json::to_value(Position::from(proto::Position::default())).unwrap();
        assert!(value["latitude_i"].is_null());
        assert!(value["altitude"].is_null());
        assert!(value["ground_speed"].is_null());
        assert_eq!(value["location_source"], "LOC_UNSET");
    }
}
