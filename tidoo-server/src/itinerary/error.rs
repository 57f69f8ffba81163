//! Route optimization error types.

use crate::domain::ItineraryError;
use crate::provider::ProviderError;

/// Errors from a route optimization attempt.
///
/// All are recoverable; the itinerary is left in its previous valid state.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// No start endpoint is set
    #[error("a start location is required for route optimization")]
    MissingStartLocation,

    /// The itinerary has no stops
    #[error("add at least one stop to optimize the route")]
    InsufficientStops,

    /// The provider returned no routes
    #[error("no route found between the selected stops")]
    NoRouteFound,

    /// The provider call failed
    #[error("route provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider's waypoint order is not a permutation of the stops
    #[error("provider returned an {0}")]
    InvalidWaypointOrder(ItineraryError),

    /// A request for this itinerary is already in flight
    #[error("route optimization already in progress")]
    OptimizationInProgress,
}

impl RouteError {
    /// HTTP-like status reported by the provider, if any.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            RouteError::Provider(e) => e.status(),
            _ => None,
        }
    }
}
