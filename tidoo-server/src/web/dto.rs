//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Endpoint, Itinerary, ItineraryId, Place, PlaceId, RouteDuration, RouteLeg, RouteSummary, Stop,
    Suggestion, TravelMode, format_distance, format_duration,
};
use crate::itinerary::OptimizationOutcome;

use super::state::KeySource;

/// Text search parameters.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search text
    pub q: String,
    pub lat: f64,
    pub lng: f64,

    /// Restrict to one place type (e.g. "museum")
    #[serde(rename = "type")]
    pub place_type: Option<String>,

    #[serde(default)]
    pub open_now: bool,

    pub min_rating: Option<f32>,

    /// "relevance" (default) or "distance"
    pub rank_by: Option<String>,
}

/// Nearby search parameters.
#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lng: f64,

    /// Radius in meters
    pub radius: Option<f64>,

    /// Comma-separated place types
    pub types: Option<String>,
}

/// Autocomplete parameters.
#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    pub input: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// A place in search results.
#[derive(Debug, Serialize)]
pub struct PlaceResult {
    #[serde(flatten)]
    pub place: Place,

    /// Media URL of the first photo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Search results.
#[derive(Debug, Serialize)]
pub struct PlacesResponse {
    pub places: Vec<PlaceResult>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

/// Request to add a stop.
#[derive(Debug, Deserialize)]
pub struct AddStopRequest {
    pub place: Place,
}

/// Request to reorder stops.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub place_ids: Vec<PlaceId>,
}

#[derive(Debug, Deserialize)]
pub struct TravelModeRequest {
    pub travel_mode: TravelMode,
}

#[derive(Debug, Deserialize)]
pub struct ReturnToStartRequest {
    pub return_to_start: bool,
}

/// A start or end location as submitted by the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndpointInput {
    /// The browser's geolocation
    CurrentLocation { latitude: f64, longitude: f64 },
    /// A place picked from search
    Place { place: Place },
}

/// Request to set or unset an endpoint. `null` unsets.
#[derive(Debug, Deserialize)]
pub struct EndpointRequest {
    pub endpoint: Option<EndpointInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveRequest {
    /// Rename before saving
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyStatus {
    pub configured: bool,
    pub source: Option<KeySource>,
}

/// A route leg with display labels.
#[derive(Debug, Serialize)]
pub struct LegView {
    pub from: String,
    pub to: String,
    pub distance_meters: u64,
    pub duration: RouteDuration,
    pub distance_label: String,
    pub duration_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_polyline: Option<String>,
}

/// Route metrics with display labels.
#[derive(Debug, Serialize)]
pub struct RouteView {
    pub legs: Vec<LegView>,
    pub distance_meters: u64,
    pub duration: RouteDuration,
    pub distance_label: String,
    pub duration_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_polyline: Option<String>,
}

/// The active itinerary as shown to the client.
#[derive(Debug, Serialize)]
pub struct ItineraryView {
    pub id: ItineraryId,
    pub name: String,
    pub stops: Vec<Stop>,
    pub travel_mode: TravelMode,
    pub start: Option<Endpoint>,
    pub end: Option<Endpoint>,
    pub return_to_start: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub route: Option<RouteView>,
    pub optimizing: bool,
}

impl ItineraryView {
    pub fn new(itinerary: &Itinerary, optimizing: bool) -> Self {
        Self {
            id: itinerary.id(),
            name: itinerary.name().to_string(),
            stops: itinerary.stops().to_vec(),
            travel_mode: itinerary.travel_mode(),
            start: itinerary.start().cloned(),
            end: itinerary.end().cloned(),
            return_to_start: itinerary.return_to_start(),
            created_at: itinerary.created_at(),
            updated_at: itinerary.updated_at(),
            route: itinerary.route().map(|r| route_view(itinerary, r)),
            optimizing,
        }
    }
}

/// Name of each point the route passes through, in order:
/// start, every stop, then the destination.
fn waypoint_labels(itinerary: &Itinerary) -> Vec<String> {
    let start = itinerary.start().map(|s| s.label.clone()).unwrap_or_default();
    let destination = match itinerary.end() {
        Some(end) if !itinerary.return_to_start() => end.label.clone(),
        _ => start.clone(),
    };

    std::iter::once(start)
        .chain(itinerary.stops().iter().map(|s| s.place.name().to_string()))
        .chain(std::iter::once(destination))
        .collect()
}

fn leg_view(leg: &RouteLeg, from: String, to: String) -> LegView {
    LegView {
        from,
        to,
        distance_meters: leg.distance_meters,
        duration: leg.duration.clone(),
        distance_label: format_distance(leg.distance_meters),
        duration_label: format_duration(&leg.duration),
        encoded_polyline: leg.encoded_polyline.clone(),
    }
}

fn route_view(itinerary: &Itinerary, route: &RouteSummary) -> RouteView {
    let labels = waypoint_labels(itinerary);
    let legs = route
        .legs
        .iter()
        .enumerate()
        .map(|(i, leg)| {
            let from = labels.get(i).cloned().unwrap_or_default();
            let to = labels.get(i + 1).cloned().unwrap_or_default();
            leg_view(leg, from, to)
        })
        .collect();

    RouteView {
        legs,
        distance_meters: route.distance_meters,
        duration: route.duration.clone(),
        distance_label: format_distance(route.distance_meters),
        duration_label: format_duration(&route.duration),
        encoded_polyline: route.encoded_polyline.clone(),
    }
}

/// Result of an optimization request.
#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    /// "applied" or "discarded"
    pub outcome: &'static str,
    pub reordered: bool,
    pub itinerary: ItineraryView,
}

impl OptimizeResponse {
    pub fn new(outcome: OptimizationOutcome, itinerary: ItineraryView) -> Self {
        let (outcome, reordered) = match outcome {
            OptimizationOutcome::Applied { reordered } => ("applied", reordered),
            OptimizationOutcome::Discarded => ("discarded", false),
        };
        Self {
            outcome,
            reordered,
            itinerary,
        }
    }
}

/// A saved itinerary in listings.
#[derive(Debug, Serialize)]
pub struct ItinerarySummary {
    pub id: ItineraryId,
    pub name: String,
    pub stop_count: usize,
    pub travel_mode: TravelMode,
    pub updated_at: DateTime<Utc>,
}

impl From<&Itinerary> for ItinerarySummary {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            id: itinerary.id(),
            name: itinerary.name().to_string(),
            stop_count: itinerary.len(),
            travel_mode: itinerary.travel_mode(),
            updated_at: itinerary.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItinerariesResponse {
    pub itineraries: Vec<ItinerarySummary>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
