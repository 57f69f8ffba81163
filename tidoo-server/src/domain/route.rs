//! Route types.
//!
//! Route legs and totals are only ever produced by the route provider.
//! A `RouteSummary` records which stop ordering and endpoints it was
//! computed for, so that stale metrics can be recognised.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{LatLng, PlaceId, TravelMode};

/// An elapsed-time value as reported by the route provider (e.g. `"5400s"`).
///
/// The raw text is kept so that unparseable values can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteDuration(String);

impl RouteDuration {
    /// Wrap a raw provider duration.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a duration from whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(format!("{secs}s"))
    }

    /// The raw provider text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the value as whole seconds.
    ///
    /// Accepts an optional trailing `s` and a fractional part, which is
    /// truncated. Returns `None` for negative, non-finite or malformed input.
    pub fn seconds(&self) -> Option<u64> {
        let trimmed = self.0.trim();
        let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
        let value: f64 = digits.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(value.trunc() as u64)
    }
}

impl fmt::Display for RouteDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One segment of a computed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_meters: u64,
    pub duration: RouteDuration,
    pub start_location: LatLng,
    pub end_location: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_polyline: Option<String>,
}

/// A route computation request, in provider-independent form.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: LatLng,
    pub destination: LatLng,
    pub intermediates: Vec<LatLng>,
    pub travel_mode: TravelMode,
    pub optimize_waypoint_order: bool,
}

/// One route returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedRoute {
    pub legs: Vec<RouteLeg>,
    pub distance_meters: u64,
    pub duration: RouteDuration,
    pub encoded_polyline: Option<String>,
    /// New position → original intermediate index, when the provider reordered.
    pub optimized_intermediate_waypoint_index: Option<Vec<usize>>,
}

/// The provider's answer to a `RouteRequest`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteResponse {
    pub routes: Vec<ComputedRoute>,
}

/// The inputs a route was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFingerprint {
    pub stop_ids: Vec<PlaceId>,
    pub start: Option<LatLng>,
    pub end: Option<LatLng>,
    pub return_to_start: bool,
    pub travel_mode: TravelMode,
}

/// Cached metrics of the last successful route computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub legs: Vec<RouteLeg>,
    pub distance_meters: u64,
    pub duration: RouteDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_polyline: Option<String>,
    pub fingerprint: RouteFingerprint,
}
