//! Conversion from provider wire types to domain types.

use crate::domain::{ComputedRoute, PlaceId, RouteDuration, RouteLeg, RouteResponse, Suggestion};

use super::types::{ComputeRoutesResponse, WireLeg, WireRoute, WireSuggestion};

/// Duration reported when the provider omits one.
const ZERO_DURATION: &str = "0s";

/// Error converting a provider response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// A leg is missing one of its endpoints
    #[error("route {route} leg {leg} is missing its {field}")]
    MissingLegLocation {
        route: usize,
        leg: usize,
        field: &'static str,
    },
}

/// Convert a computeRoutes response.
pub fn convert_routes(response: ComputeRoutesResponse) -> Result<RouteResponse, ConversionError> {
    let routes = response
        .routes
        .into_iter()
        .enumerate()
        .map(|(i, route)| convert_route(i, route))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RouteResponse { routes })
}

fn convert_route(index: usize, route: WireRoute) -> Result<ComputedRoute, ConversionError> {
    let legs = route
        .legs
        .into_iter()
        .enumerate()
        .map(|(leg, wire)| convert_leg(index, leg, wire))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ComputedRoute {
        legs,
        distance_meters: route.distance_meters,
        duration: RouteDuration::new(route.duration.unwrap_or_else(|| ZERO_DURATION.to_string())),
        encoded_polyline: route.polyline.and_then(|p| p.encoded_polyline),
        optimized_intermediate_waypoint_index: route.optimized_intermediate_waypoint_index,
    })
}

fn convert_leg(route: usize, leg: usize, wire: WireLeg) -> Result<RouteLeg, ConversionError> {
    let start = wire
        .start_location
        .ok_or(ConversionError::MissingLegLocation {
            route,
            leg,
            field: "startLocation",
        })?;
    let end = wire.end_location.ok_or(ConversionError::MissingLegLocation {
        route,
        leg,
        field: "endLocation",
    })?;

    Ok(RouteLeg {
        distance_meters: wire.distance_meters,
        duration: RouteDuration::new(wire.duration.unwrap_or_else(|| ZERO_DURATION.to_string())),
        start_location: start.lat_lng,
        end_location: end.lat_lng,
        encoded_polyline: wire.polyline.and_then(|p| p.encoded_polyline),
    })
}

/// Convert autocomplete suggestions.
///
/// Query predictions (no place) and predictions with unusable ids are skipped.
pub fn convert_suggestions(suggestions: Vec<WireSuggestion>) -> Vec<Suggestion> {
    suggestions
        .into_iter()
        .filter_map(|s| s.place_prediction)
        .filter_map(|p| {
            let place_id = PlaceId::parse(&p.place_id).ok()?;
            let (main_text, secondary_text) = match p.structured_format {
                Some(f) => (Some(f.main_text.text), f.secondary_text.map(|t| t.text)),
                None => (None, None),
            };
            Some(Suggestion {
                place_id,
                text: p.text.text,
                main_text,
                secondary_text,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::AutocompleteResponse;

    #[test]
    fn converts_route_with_defaults() {
        let json = r#"{
            "routes": [{
                "legs": [{
                    "startLocation": { "latLng": { "latitude": 1.0, "longitude": 2.0 } },
                    "endLocation": { "latLng": { "latitude": 1.5, "longitude": 2.5 } },
                    "polyline": { "encodedPolyline": "abc" }
                }]
            }]
        }"#;
        let wire: ComputeRoutesResponse = serde_json::from_str(json).unwrap();
        let resp = convert_routes(wire).unwrap();

        let route = &resp.routes[0];
        assert_eq!(route.distance_meters, 0);
        assert_eq!(route.duration.as_str(), "0s");
        assert!(route.optimized_intermediate_waypoint_index.is_none());
        assert_eq!(route.legs[0].encoded_polyline.as_deref(), Some("abc"));
        assert_eq!(route.legs[0].end_location.latitude, 1.5);
    }

    #[test]
    fn missing_leg_location_is_error() {
        let json = r#"{ "routes": [{ "legs": [{ "distanceMeters": 5 }] }] }"#;
        let wire: ComputeRoutesResponse = serde_json::from_str(json).unwrap();
        let err = convert_routes(wire).unwrap_err();
        assert_eq!(
            err,
            ConversionError::MissingLegLocation {
                route: 0,
                leg: 0,
                field: "startLocation"
            }
        );
    }

    #[test]
    fn converts_suggestions_skipping_unusable() {
        let json = r#"{
            "suggestions": [
                { "placePrediction": {
                    "placeId": "ChIJabc",
                    "text": { "text": "Tate Modern, London" },
                    "structuredFormat": {
                        "mainText": { "text": "Tate Modern" },
                        "secondaryText": { "text": "London" }
                    }
                } },
                { "queryPrediction": { "text": { "text": "tate" } } },
                { "placePrediction": { "placeId": "bad id", "text": { "text": "x" } } }
            ]
        }"#;
        let wire: AutocompleteResponse = serde_json::from_str(json).unwrap();
        let suggestions = convert_suggestions(wire.suggestions);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].place_id.as_str(), "ChIJabc");
        assert_eq!(suggestions[0].main_text.as_deref(), Some("Tate Modern"));
        assert_eq!(suggestions[0].secondary_text.as_deref(), Some("London"));
    }
}
