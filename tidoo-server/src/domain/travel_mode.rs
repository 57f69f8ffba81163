//! Travel mode enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown travel mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown travel mode: {0}")]
pub struct InvalidTravelMode(String);

/// How the route between stops is travelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Drive,
    Walk,
    Bicycle,
    Transit,
}

impl TravelMode {
    /// All modes, in display order.
    pub const ALL: [TravelMode; 4] = [
        TravelMode::Drive,
        TravelMode::Walk,
        TravelMode::Bicycle,
        TravelMode::Transit,
    ];

    /// Wire name used by the route provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Drive => "DRIVE",
            TravelMode::Walk => "WALK",
            TravelMode::Bicycle => "BICYCLE",
            TravelMode::Transit => "TRANSIT",
        }
    }

    /// Routing preference to request for this mode.
    ///
    /// Only driving supports traffic-aware routing.
    pub fn routing_preference(&self) -> Option<&'static str> {
        match self {
            TravelMode::Drive => Some("TRAFFIC_AWARE"),
            _ => None,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = InvalidTravelMode;

    /// Case-insensitive parse of a wire name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TravelMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidTravelMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_drive() {
        assert_eq!(TravelMode::default(), TravelMode::Drive);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("walk".parse::<TravelMode>(), Ok(TravelMode::Walk));
        assert_eq!("BICYCLE".parse::<TravelMode>(), Ok(TravelMode::Bicycle));
        assert_eq!(" Transit ".parse::<TravelMode>(), Ok(TravelMode::Transit));
        assert!("boat".parse::<TravelMode>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&TravelMode::Bicycle).unwrap();
        assert_eq!(json, "\"BICYCLE\"");

        let mode: TravelMode = serde_json::from_str("\"TRANSIT\"").unwrap();
        assert_eq!(mode, TravelMode::Transit);
    }

    #[test]
    fn only_drive_is_traffic_aware() {
        assert_eq!(TravelMode::Drive.routing_preference(), Some("TRAFFIC_AWARE"));
        assert_eq!(TravelMode::Walk.routing_preference(), None);
        assert_eq!(TravelMode::Transit.routing_preference(), None);
    }
}
