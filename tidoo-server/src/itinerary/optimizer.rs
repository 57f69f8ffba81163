//! Route optimization.
//!
//! Translating the active itinerary into a provider request and applying
//! the provider's answer back onto it. The provider call itself happens
//! between `ItinerarySession::begin_optimization` and
//! `ItinerarySession::finish_optimization`, so callers holding the session
//! behind a lock need not hold it across the await.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{Itinerary, RouteRequest, RouteResponse};
use crate::provider::RouteProvider;

use super::error::RouteError;
use super::session::ItinerarySession;

/// What happened to a completed route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationOutcome {
    /// Route metrics were attached; `reordered` is true if the stop order changed.
    Applied { reordered: bool },
    /// The itinerary changed while the request was in flight; the response was dropped.
    Discarded,
}

/// Build the provider request for an itinerary.
///
/// Stops become intermediates in their current order. The destination is
/// the end endpoint unless the route returns to start (or no end is set),
/// in which case it is the origin. Waypoint optimization is requested only
/// when there are at least two intermediates to reorder.
pub fn build_request(itinerary: &Itinerary) -> Result<RouteRequest, RouteError> {
    let origin = itinerary
        .start()
        .map(|s| s.location)
        .ok_or(RouteError::MissingStartLocation)?;

    if itinerary.is_empty() {
        return Err(RouteError::InsufficientStops);
    }

    let destination = match itinerary.end() {
        Some(end) if !itinerary.return_to_start() => end.location,
        _ => origin,
    };

    let intermediates: Vec<_> = itinerary
        .stops()
        .iter()
        .map(|s| s.place.location)
        .collect();
    let optimize_waypoint_order = intermediates.len() >= 2;

    Ok(RouteRequest {
        origin,
        destination,
        intermediates,
        travel_mode: itinerary.travel_mode(),
        optimize_waypoint_order,
    })
}

/// Apply a provider response to the itinerary it was computed for.
///
/// The first route is used. If it carries a non-empty optimized waypoint
/// order, stops are reordered to match before metrics are attached.
/// Returns the next itinerary and whether the stop order changed.
pub fn reconcile(
    itinerary: &Itinerary,
    response: RouteResponse,
    now: DateTime<Utc>,
) -> Result<(Itinerary, bool), RouteError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(RouteError::NoRouteFound)?;

    let order = route
        .optimized_intermediate_waypoint_index
        .filter(|order| !order.is_empty());

    let (ordered, reordered) = match order {
        Some(order) => {
            if order.iter().copied().eq(0..itinerary.len()) {
                (itinerary.clone(), false)
            } else {
                let next = itinerary
                    .apply_waypoint_order(&order, now)
                    .map_err(RouteError::InvalidWaypointOrder)?;
                (next, true)
            }
        }
        None => (itinerary.clone(), false),
    };

    let next = ordered.with_route(
        route.legs,
        route.distance_meters,
        route.duration,
        route.encoded_polyline,
        now,
    );
    Ok((next, reordered))
}

/// Optimize the session's active itinerary with `provider`.
///
/// Convenience for callers that own the session outright; the web layer
/// drives the begin/finish halves itself to release its lock during the
/// provider call.
pub async fn optimize<P: RouteProvider>(
    session: &mut ItinerarySession,
    provider: &P,
) -> Result<OptimizationOutcome, RouteError> {
    let (tag, request) = session.begin_optimization()?;
    let result = provider.compute_route(&request).await;
    if let Err(e) = &result {
        warn!(error = %e, "Route computation failed");
    }

    let outcome = session.finish_optimization(tag, result)?;
    if let OptimizationOutcome::Applied { reordered } = outcome {
        let route = session.itinerary().route();
        info!(
            stops = session.itinerary().len(),
            reordered,
            distance_meters = route.map(|r| r.distance_meters),
            "Route optimized"
        );
    }
    Ok(outcome)
}

#[cfg(test)]
#[path = "optimizer_tests.rs"]
mod tests;
