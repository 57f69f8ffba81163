//! Google Places (New) and Routes API wire types.
//!
//! Request bodies are serialized from these types; responses are
//! deserialized into them and then converted to domain types. Place
//! resources deserialize straight into `domain::Place`.

use serde::{Deserialize, Serialize};

use crate::domain::{LatLng, Place, TravelMode};

use super::query::RankPreference;

/// A circle used for location bias or restriction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    pub center: LatLng,
    pub radius: f64,
}

/// Wrapper for `{ "circle": ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct LocationArea {
    pub circle: Circle,
}

impl LocationArea {
    pub fn circle(center: LatLng, radius: f64) -> Self {
        Self {
            circle: Circle { center, radius },
        }
    }
}

/// Body of `places:searchText`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextBody {
    pub text_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_bias: Option<LocationArea>,
    pub max_result_count: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_preference: Option<RankPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
}

/// Body of `places:searchNearby`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNearbyBody {
    pub location_restriction: LocationArea,
    pub max_result_count: u8,
    pub rank_preference: RankPreference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included_types: Vec<String>,
}

/// Response of text and nearby search.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesResponse {
    #[serde(default)]
    pub places: Vec<Place>,
}

/// Body of `places:autocomplete`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteBody {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_bias: Option<LocationArea>,
}

/// Response of `places:autocomplete`.
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(default)]
    pub suggestions: Vec<WireSuggestion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSuggestion {
    pub place_prediction: Option<PlacePrediction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacePrediction {
    pub place_id: String,
    pub text: TextValue,
    pub structured_format: Option<StructuredFormat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextValue {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFormat {
    pub main_text: TextValue,
    pub secondary_text: Option<TextValue>,
}

/// `{ "latLng": { ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLocation {
    pub lat_lng: LatLng,
}

/// A route waypoint given by coordinate.
#[derive(Debug, Clone, Serialize)]
pub struct Waypoint {
    pub location: WireLocation,
}

impl From<LatLng> for Waypoint {
    fn from(lat_lng: LatLng) -> Self {
        Self {
            location: WireLocation { lat_lng },
        }
    }
}

/// Body of `directions/v2:computeRoutes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRoutesBody {
    pub origin: Waypoint,
    pub destination: Waypoint,
    pub intermediates: Vec<Waypoint>,
    pub travel_mode: TravelMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_preference: Option<&'static str>,
    pub optimize_waypoint_order: bool,
    pub compute_alternative_routes: bool,
    pub language_code: &'static str,
    pub units: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePolyline {
    pub encoded_polyline: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLeg {
    #[serde(default)]
    pub distance_meters: u64,
    pub duration: Option<String>,
    pub start_location: Option<WireLocation>,
    pub end_location: Option<WireLocation>,
    pub polyline: Option<WirePolyline>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRoute {
    #[serde(default)]
    pub legs: Vec<WireLeg>,
    #[serde(default)]
    pub distance_meters: u64,
    pub duration: Option<String>,
    pub polyline: Option<WirePolyline>,
    pub optimized_intermediate_waypoint_index: Option<Vec<usize>>,
}

/// Response of `directions/v2:computeRoutes`.
#[derive(Debug, Clone, Deserialize)]
pub struct ComputeRoutesResponse {
    #[serde(default)]
    pub routes: Vec<WireRoute>,
}

/// Google error envelope: `{ "error": { "code", "message", "status" } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ll(lat: f64, lng: f64) -> LatLng {
        LatLng::new(lat, lng).unwrap()
    }

    #[test]
    fn compute_routes_body_shape() {
        let body = ComputeRoutesBody {
            origin: ll(51.5, -0.1).into(),
            destination: ll(51.5, -0.1).into(),
            intermediates: vec![ll(51.6, -0.2).into()],
            travel_mode: TravelMode::Walk,
            routing_preference: TravelMode::Walk.routing_preference(),
            optimize_waypoint_order: false,
            compute_alternative_routes: false,
            language_code: "en-US",
            units: "IMPERIAL",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["travelMode"], "WALK");
        assert_eq!(json["origin"]["location"]["latLng"]["latitude"], 51.5);
        assert_eq!(json["intermediates"][0]["location"]["latLng"]["longitude"], -0.2);
        assert_eq!(json["optimizeWaypointOrder"], false);
        assert!(json.get("routingPreference").is_none());
    }

    #[test]
    fn search_text_body_omits_unset_filters() {
        let body = SearchTextBody {
            text_query: "museum".into(),
            location_bias: Some(LocationArea::circle(ll(1.0, 2.0), 10_000.0)),
            max_result_count: 20,
            rank_preference: Some(RankPreference::Relevance),
            included_type: None,
            open_now: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["textQuery"], "museum");
        assert_eq!(json["rankPreference"], "RELEVANCE");
        assert_eq!(json["locationBias"]["circle"]["radius"], 10_000.0);
        assert!(json.get("includedType").is_none());
        assert!(json.get("openNow").is_none());
    }

    #[test]
    fn parse_routes_response() {
        let json = r#"{
            "routes": [{
                "legs": [{
                    "distanceMeters": 1200,
                    "duration": "300s",
                    "startLocation": { "latLng": { "latitude": 1.0, "longitude": 2.0 } },
                    "endLocation": { "latLng": { "latitude": 1.1, "longitude": 2.1 } }
                }],
                "distanceMeters": 1200,
                "duration": "300s",
                "optimizedIntermediateWaypointIndex": [1, 0]
            }]
        }"#;

        let resp: ComputeRoutesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.routes.len(), 1);
        assert_eq!(resp.routes[0].legs[0].distance_meters, 1200);
        assert_eq!(
            resp.routes[0].optimized_intermediate_waypoint_index,
            Some(vec![1, 0])
        );
    }

    #[test]
    fn parse_empty_responses() {
        let resp: ComputeRoutesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.routes.is_empty());

        let resp: PlacesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.places.is_empty());

        let resp: AutocompleteResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.suggestions.is_empty());
    }
}
