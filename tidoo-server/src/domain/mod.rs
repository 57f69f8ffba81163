//! Domain types for the itinerary planner.
//!
//! This module contains the core domain model: places, stops, endpoints,
//! itineraries and route metrics. Types enforce their invariants at
//! construction (and deserialization) time, so code that receives them
//! can trust their validity.

mod error;
mod format;
mod itinerary;
mod place;
mod route;
mod travel_mode;

pub use error::ItineraryError;
pub use format::{format_distance, format_duration};
pub use itinerary::{
    DEFAULT_ITINERARY_NAME, Endpoint, EndpointSource, Itinerary, ItineraryId, Stop,
};
pub use place::{
    AuthorAttribution, InvalidCoordinate, InvalidPlaceId, LatLng, LocalizedText, OpeningHours,
    Place, PlaceId, PlacePhoto, PlaceReview, Suggestion,
};
pub use route::{
    ComputedRoute, RouteDuration, RouteFingerprint, RouteLeg, RouteRequest, RouteResponse,
    RouteSummary,
};
pub use travel_mode::{InvalidTravelMode, TravelMode};
