//! Itinerary aggregate.
//!
//! An `Itinerary` is an ordered collection of stops plus the routing
//! configuration (travel mode and endpoints) and the metrics of the last
//! successful route computation.
//!
//! Every edit is a pure transition: it takes the current value and a
//! timestamp and returns the next value. The invariants below hold for
//! every value that can be constructed or deserialized:
//!
//! - stop `order` equals the stop's position (dense, 0-based)
//! - at most one stop per place id
//! - `updated_at` strictly increases across effective edits
//! - cached route metrics are dropped by any structural edit

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    ItineraryError, LatLng, Place, PlaceId, RouteDuration, RouteFingerprint, RouteLeg,
    RouteSummary, TravelMode,
};

/// Name given to a freshly created itinerary.
pub const DEFAULT_ITINERARY_NAME: &str = "New Itinerary";

/// Unique itinerary identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItineraryId(Uuid);

impl ItineraryId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ItineraryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ItineraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItineraryId({})", self.0)
    }
}

impl fmt::Display for ItineraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Where an endpoint's coordinate came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "place_id", rename_all = "snake_case")]
pub enum EndpointSource {
    /// The user's live coordinate.
    CurrentLocation,
    /// A resolved place.
    Place(PlaceId),
}

/// A named start or end location for route computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub label: String,
    pub location: LatLng,
    pub source: EndpointSource,
}

impl Endpoint {
    /// An endpoint at the user's current coordinate.
    pub fn current_location(location: LatLng) -> Self {
        Self {
            label: "Current location".to_string(),
            location,
            source: EndpointSource::CurrentLocation,
        }
    }

    /// An endpoint at a resolved place.
    pub fn from_place(place: &Place) -> Self {
        Self {
            label: place.name().to_string(),
            location: place.location,
            source: EndpointSource::Place(place.id.clone()),
        }
    }
}

/// A place with its position in the itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub place: Place,
    pub order: usize,
}

/// The itinerary aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ItineraryRecord")]
pub struct Itinerary {
    id: ItineraryId,
    name: String,
    stops: Vec<Stop>,
    travel_mode: TravelMode,
    start: Option<Endpoint>,
    end: Option<Endpoint>,
    return_to_start: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    route: Option<RouteSummary>,
}

/// Unvalidated serialized form of an `Itinerary`.
#[derive(Deserialize)]
struct ItineraryRecord {
    id: ItineraryId,
    name: String,
    #[serde(default)]
    stops: Vec<Stop>,
    #[serde(default)]
    travel_mode: TravelMode,
    #[serde(default)]
    start: Option<Endpoint>,
    #[serde(default)]
    end: Option<Endpoint>,
    #[serde(default)]
    return_to_start: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    route: Option<RouteSummary>,
}

impl TryFrom<ItineraryRecord> for Itinerary {
    type Error = ItineraryError;

    fn try_from(record: ItineraryRecord) -> Result<Self, Self::Error> {
        check_stops(&record.stops)?;

        Ok(Self {
            id: record.id,
            name: record.name,
            stops: record.stops,
            travel_mode: record.travel_mode,
            start: record.start,
            end: record.end,
            return_to_start: record.return_to_start,
            created_at: record.created_at,
            updated_at: record.updated_at,
            route: record.route,
        })
    }
}

/// Verify that stop orders are dense and place ids unique.
fn check_stops(stops: &[Stop]) -> Result<(), ItineraryError> {
    let mut seen = HashSet::with_capacity(stops.len());
    for (position, stop) in stops.iter().enumerate() {
        if stop.order != position {
            return Err(ItineraryError::OrderMismatch {
                position,
                order: stop.order,
            });
        }
        if !seen.insert(&stop.place.id) {
            return Err(ItineraryError::DuplicatePlace(stop.place.id.clone()));
        }
    }
    Ok(())
}

impl Itinerary {
    /// Create an empty itinerary with a fresh id.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: ItineraryId::new(),
            name: DEFAULT_ITINERARY_NAME.to_string(),
            stops: Vec::new(),
            travel_mode: TravelMode::default(),
            start: None,
            end: None,
            return_to_start: false,
            created_at: now,
            updated_at: now,
            route: None,
        }
    }

    pub fn id(&self) -> ItineraryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops in visiting order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.travel_mode
    }

    pub fn start(&self) -> Option<&Endpoint> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&Endpoint> {
        self.end.as_ref()
    }

    pub fn return_to_start(&self) -> bool {
        self.return_to_start
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Whether a stop exists for the given place.
    pub fn contains(&self, place_id: &PlaceId) -> bool {
        self.stops.iter().any(|s| &s.place.id == place_id)
    }

    /// The inputs a route computed now would be valid for.
    pub fn fingerprint(&self) -> RouteFingerprint {
        RouteFingerprint {
            stop_ids: self.stops.iter().map(|s| s.place.id.clone()).collect(),
            start: self.start.as_ref().map(|e| e.location),
            end: self.end.as_ref().map(|e| e.location),
            return_to_start: self.return_to_start,
            travel_mode: self.travel_mode,
        }
    }

    /// Cached route metrics, only if they still describe the current itinerary.
    pub fn route(&self) -> Option<&RouteSummary> {
        self.route
            .as_ref()
            .filter(|r| r.fingerprint == self.fingerprint())
    }

    /// Whether cached metrics exist but no longer match the itinerary.
    pub fn has_stale_route(&self) -> bool {
        self.route.is_some() && self.route().is_none()
    }

    /// Append a stop. Returns an unchanged copy if the place is already present.
    pub fn add_stop(&self, place: Place, now: DateTime<Utc>) -> Self {
        if self.contains(&place.id) {
            return self.clone();
        }

        let mut next = self.clone();
        let order = next.stops.len();
        next.stops.push(Stop { place, order });
        next.structural_edit(now);
        next
    }

    /// Remove the stop for a place and close the gap.
    ///
    /// Returns an unchanged copy if the place is not present.
    pub fn remove_stop(&self, place_id: &PlaceId, now: DateTime<Utc>) -> Self {
        if !self.contains(place_id) {
            return self.clone();
        }

        let mut next = self.clone();
        next.stops.retain(|s| &s.place.id != place_id);
        next.renumber();
        next.structural_edit(now);
        next
    }

    /// Reorder stops to the given sequence of place ids.
    ///
    /// The sequence must be exactly a permutation of the current stops.
    pub fn reorder_stops(
        &self,
        sequence: &[PlaceId],
        now: DateTime<Utc>,
    ) -> Result<Self, ItineraryError> {
        if sequence.len() != self.stops.len() {
            return Err(ItineraryError::InvalidReorder(format!(
                "expected {} stops, got {}",
                self.stops.len(),
                sequence.len()
            )));
        }

        let mut seen = HashSet::with_capacity(sequence.len());
        let mut reordered = Vec::with_capacity(sequence.len());
        for id in sequence {
            if !seen.insert(id) {
                return Err(ItineraryError::InvalidReorder(format!(
                    "place {id} listed more than once"
                )));
            }
            let stop = self
                .stops
                .iter()
                .find(|s| &s.place.id == id)
                .ok_or_else(|| ItineraryError::InvalidReorder(format!("unknown place {id}")))?;
            reordered.push(stop.clone());
        }

        let mut next = self.clone();
        next.stops = reordered;
        next.renumber();
        next.structural_edit(now);
        Ok(next)
    }

    /// Replace the stop sequence with a provider-optimized order.
    ///
    /// `order[k]` is the current index of the stop that moves to position `k`.
    /// Unlike `reorder_stops` this is a full replacement driven by the
    /// provider, so it only requires `order` to be a permutation of `0..n`.
    pub fn apply_waypoint_order(
        &self,
        order: &[usize],
        now: DateTime<Utc>,
    ) -> Result<Self, ItineraryError> {
        let n = self.stops.len();
        let invalid = ItineraryError::InvalidWaypointOrder { expected: n };
        if order.len() != n {
            return Err(invalid);
        }

        let mut used = vec![false; n];
        let mut reordered = Vec::with_capacity(n);
        for &idx in order {
            match (self.stops.get(idx), used.get_mut(idx)) {
                (Some(stop), Some(flag)) if !*flag => {
                    *flag = true;
                    reordered.push(stop.clone());
                }
                _ => return Err(invalid),
            }
        }

        let mut next = self.clone();
        next.stops = reordered;
        next.renumber();
        next.structural_edit(now);
        Ok(next)
    }

    pub fn with_travel_mode(&self, mode: TravelMode, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.travel_mode = mode;
        next.structural_edit(now);
        next
    }

    pub fn with_start(&self, start: Option<Endpoint>, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.start = start;
        next.structural_edit(now);
        next
    }

    pub fn with_end(&self, end: Option<Endpoint>, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.end = end;
        next.structural_edit(now);
        next
    }

    pub fn with_return_to_start(&self, value: bool, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.return_to_start = value;
        next.structural_edit(now);
        next
    }

    /// Rename. Route metrics are kept.
    pub fn renamed(&self, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.name = name.into();
        next.touch(now);
        next
    }

    /// Replace a stop's place data with a richer copy of the same place.
    ///
    /// Returns `None` if the place is not in the itinerary. Route metrics
    /// are dropped only if the coordinate moved.
    pub fn with_enriched_place(&self, place: Place, now: DateTime<Utc>) -> Option<Self> {
        let mut next = self.clone();
        let stop = next.stops.iter_mut().find(|s| s.place.id == place.id)?;
        let moved = stop.place.location != place.location;
        stop.place = place;

        if moved {
            next.structural_edit(now);
        } else {
            next.touch(now);
        }
        Some(next)
    }

    /// Attach metrics computed for the current stop order and endpoints.
    pub fn with_route(
        &self,
        legs: Vec<RouteLeg>,
        distance_meters: u64,
        duration: RouteDuration,
        encoded_polyline: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut next = self.clone();
        next.route = Some(RouteSummary {
            legs,
            distance_meters,
            duration,
            encoded_polyline,
            fingerprint: self.fingerprint(),
        });
        next.touch(now);
        next
    }

    /// Drop cached metrics that no longer match. Timestamps are unchanged.
    pub fn without_stale_route(&self) -> Self {
        let mut next = self.clone();
        if next.has_stale_route() {
            next.route = None;
        }
        next
    }

    fn renumber(&mut self) {
        for (i, stop) in self.stops.iter_mut().enumerate() {
            stop.order = i;
        }
    }

    fn structural_edit(&mut self, now: DateTime<Utc>) {
        self.route = None;
        self.touch(now);
    }

    /// Advance `updated_at` strictly, even if the clock has not moved.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
    }
}

#[cfg(test)]
#[path = "itinerary_tests.rs"]
mod tests;
