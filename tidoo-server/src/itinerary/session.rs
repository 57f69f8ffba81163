//! The active itinerary and its edit operations.
//!
//! `ItinerarySession` owns exactly one active itinerary. Every operation
//! computes the next itinerary value from the current one and swaps it in,
//! so no partially applied edit is ever observable. Each effective edit
//! bumps the session `version`, which in-flight route requests carry as
//! their tag.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{Endpoint, Itinerary, ItineraryError, ItineraryId, Place, PlaceId, TravelMode};
use crate::domain::{RouteRequest, RouteResponse};
use crate::provider::ProviderError;

use super::clock::{Clock, SystemClock};
use super::error::RouteError;
use super::optimizer::{self, OptimizationOutcome};

/// Identity of the state a route request was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub itinerary_id: ItineraryId,
    pub version: u64,
    pub sequence: u64,
}

/// Owner of the active itinerary.
pub struct ItinerarySession {
    itinerary: Itinerary,
    version: u64,
    pending: Option<RequestTag>,
    next_sequence: u64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ItinerarySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItinerarySession")
            .field("itinerary", &self.itinerary.id())
            .field("version", &self.version)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Default for ItinerarySession {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ItinerarySession {
    /// Start a session with a fresh empty itinerary.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let itinerary = Itinerary::new(clock.now());
        Self::with_itinerary(itinerary, clock)
    }

    /// Start a session with a previously saved itinerary.
    pub fn with_itinerary(itinerary: Itinerary, clock: Arc<dyn Clock>) -> Self {
        Self {
            itinerary,
            version: 0,
            pending: None,
            next_sequence: 0,
            clock,
        }
    }

    /// The active itinerary.
    pub fn itinerary(&self) -> &Itinerary {
        &self.itinerary
    }

    /// Number of effective edits applied in this session.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether a route request for the active itinerary is in flight.
    pub fn is_optimizing(&self) -> bool {
        self.pending
            .is_some_and(|tag| tag.itinerary_id == self.itinerary.id())
    }

    /// Whether the active itinerary contains a place.
    pub fn is_place_present(&self, place_id: &PlaceId) -> bool {
        self.itinerary.contains(place_id)
    }

    /// Append a stop. Returns `false` if the place was already present.
    pub fn add_stop(&mut self, place: Place) -> bool {
        if self.itinerary.contains(&place.id) {
            return false;
        }
        let next = self.itinerary.add_stop(place, self.clock.now());
        self.replace(next);
        true
    }

    /// Remove a stop. Returns `false` if the place was not present.
    pub fn remove_stop(&mut self, place_id: &PlaceId) -> bool {
        if !self.itinerary.contains(place_id) {
            return false;
        }
        let next = self.itinerary.remove_stop(place_id, self.clock.now());
        self.replace(next);
        true
    }

    /// Reorder stops. Rejected, with no state change, unless `sequence`
    /// is a permutation of the current stops.
    pub fn reorder_stops(&mut self, sequence: &[PlaceId]) -> Result<(), ItineraryError> {
        let next = self.itinerary.reorder_stops(sequence, self.clock.now())?;
        self.replace(next);
        Ok(())
    }

    pub fn set_travel_mode(&mut self, mode: TravelMode) {
        let next = self.itinerary.with_travel_mode(mode, self.clock.now());
        self.replace(next);
    }

    pub fn set_start_location(&mut self, start: Option<Endpoint>) {
        let next = self.itinerary.with_start(start, self.clock.now());
        self.replace(next);
    }

    pub fn set_end_location(&mut self, end: Option<Endpoint>) {
        let next = self.itinerary.with_end(end, self.clock.now());
        self.replace(next);
    }

    pub fn set_return_to_start(&mut self, value: bool) {
        let next = self.itinerary.with_return_to_start(value, self.clock.now());
        self.replace(next);
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        let next = self.itinerary.renamed(name, self.clock.now());
        self.replace(next);
    }

    /// Merge richer place data into an existing stop.
    ///
    /// Returns `false` if the place is no longer in the itinerary.
    pub fn enrich_stop(&mut self, place: Place) -> bool {
        match self.itinerary.with_enriched_place(place, self.clock.now()) {
            Some(next) => {
                self.replace(next);
                true
            }
            None => false,
        }
    }

    /// Replace the active itinerary with a fresh empty one.
    pub fn clear(&mut self) {
        let next = Itinerary::new(self.clock.now());
        self.replace(next);
    }

    /// Make a loaded itinerary the active one.
    pub fn load(&mut self, itinerary: Itinerary) {
        self.replace(itinerary);
    }

    /// Validate preconditions and issue a route request for the active itinerary.
    ///
    /// Stale cached metrics are dropped before the request is built.
    pub fn begin_optimization(&mut self) -> Result<(RequestTag, RouteRequest), RouteError> {
        if self.is_optimizing() {
            return Err(RouteError::OptimizationInProgress);
        }

        if self.itinerary.has_stale_route() {
            self.itinerary = self.itinerary.without_stale_route();
        }

        let request = optimizer::build_request(&self.itinerary)?;

        let tag = RequestTag {
            itinerary_id: self.itinerary.id(),
            version: self.version,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.pending = Some(tag);

        Ok((tag, request))
    }

    /// Apply the result of a route request issued by `begin_optimization`.
    ///
    /// Results for an itinerary that has since been edited, cleared or
    /// replaced are discarded. On error the itinerary is left untouched.
    pub fn finish_optimization(
        &mut self,
        tag: RequestTag,
        result: Result<RouteResponse, ProviderError>,
    ) -> Result<OptimizationOutcome, RouteError> {
        if self.pending.is_some_and(|p| p.sequence == tag.sequence) {
            self.pending = None;
        }

        if tag.itinerary_id != self.itinerary.id() || tag.version != self.version {
            debug!(
                request = tag.sequence,
                requested_version = tag.version,
                current_version = self.version,
                "Discarding stale route response"
            );
            return Ok(OptimizationOutcome::Discarded);
        }

        let response = result?;
        let (next, reordered) = optimizer::reconcile(&self.itinerary, response, self.clock.now())?;
        self.replace(next);

        Ok(OptimizationOutcome::Applied { reordered })
    }

    fn replace(&mut self, next: Itinerary) {
        self.itinerary = next;
        self.version += 1;
    }
}
