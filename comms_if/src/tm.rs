//! # Telemetry module
//!
//! Defines the telemetry document the rover publishes to the ground service.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Stream the telemetry document is published to.
pub const TELEMETRY_STREAM: &str = "telemetry";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One telemetry sample.
///
/// Serialises to a flat JSON object with the keys `seconds_since_boot`, `wifi_rssi`, `voltage`,
/// `heading`, `latitude` and `longitude`. `wifi_rssi` is left out when the link strength is not
/// known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmPacket {
    /// Whole seconds since the executive started
    pub seconds_since_boot: u64,

    /// Received signal strength of the network link in dBm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_rssi: Option<i32>,

    /// Battery voltage in volts
    pub voltage: f64,

    /// Heading in degrees, in `[0, 360)`
    pub heading: f64,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TmPacket {
    /// Serialise the packet to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tm_packet_keys() {
        let packet = TmPacket {
            seconds_since_boot: 12,
            wifi_rssi: Some(-61),
            voltage: 3.3,
            heading: 90.0,
            latitude: 47.816944,
            longitude: -119.656111,
        };

        let value: serde_json::Value =
            serde_json::from_str(&packet.to_json().unwrap()).unwrap();

        assert_eq!(value["seconds_since_boot"], 12);
        assert_eq!(value["wifi_rssi"], -61);
        assert_eq!(value["voltage"], 3.3);
        assert_eq!(value["heading"], 90.0);
        assert_eq!(value["latitude"], 47.816944);
        assert_eq!(value["longitude"], -119.656111);
        assert_eq!(value.as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_tm_packet_without_rssi() {
        let packet = TmPacket {
            seconds_since_boot: 0,
            wifi_rssi: None,
            voltage: 0.0,
            heading: 0.0,
            latitude: 0.0,
            longitude: 0.0,
        };

        let json = packet.to_json().unwrap();
        assert!(!json.contains("wifi_rssi"));

        let back: TmPacket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, packet);
    }
}
