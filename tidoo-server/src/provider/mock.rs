//! Mock provider for development without API access.
//!
//! Loads places from a JSON file and serves them as if they were live
//! search results. Routes are estimated from great-circle distances at a
//! per-mode average speed; when optimization is requested the stops are
//! ordered greedily by nearest neighbour.

use std::path::Path;
use std::sync::Arc;

use crate::domain::{
    ComputedRoute, LatLng, Place, PlaceId, RouteDuration, RouteLeg, RouteRequest, RouteResponse,
    Suggestion, TravelMode,
};

use super::error::ProviderError;
use super::query::{AUTOCOMPLETE_MIN_INPUT, NearbyQuery, PlaceQuery};
use super::{PlaceProvider, RouteProvider};

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Mock provider that serves data from a JSON file.
#[derive(Debug, Clone)]
pub struct MockProvider {
    places: Arc<Vec<Place>>,
}

impl MockProvider {
    /// Create a mock provider over a fixed set of places.
    pub fn from_places(places: Vec<Place>) -> Self {
        Self {
            places: Arc::new(places),
        }
    }

    /// Load places from a JSON array file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::NotConfigured(format!("failed to read {}: {}", path.display(), e))
        })?;

        let places: Vec<Place> = serde_json::from_str(&json).map_err(|e| ProviderError::Json {
            message: format!("failed to parse {}: {}", path.display(), e),
            body: None,
        })?;

        if places.is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "no places found in {}",
                path.display()
            )));
        }

        Ok(Self::from_places(places))
    }

    /// Number of places available.
    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    fn matches(place: &Place, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        place.name().to_lowercase().contains(&needle)
            || place.formatted_address.to_lowercase().contains(&needle)
            || place
                .primary_type
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
    }
}

/// Great-circle distance between two coordinates in meters.
fn haversine_m(from: LatLng, to: LatLng) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Assumed average speed for a travel mode, in km/h.
fn speed_kmh(mode: TravelMode) -> f64 {
    match mode {
        TravelMode::Drive => 40.0,
        TravelMode::Transit => 25.0,
        TravelMode::Bicycle => 15.0,
        TravelMode::Walk => 5.0,
    }
}

/// Greedy nearest-neighbour visiting order starting from `origin`.
fn nearest_neighbour_order(origin: LatLng, points: &[LatLng]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut order = Vec::with_capacity(points.len());
    let mut current = origin;

    while !remaining.is_empty() {
        let (pos, _) = remaining
            .iter()
            .enumerate()
            .map(|(pos, &idx)| (pos, haversine_m(current, points[idx])))
            .fold((0, f64::INFINITY), |best, candidate| {
                if candidate.1 < best.1 { candidate } else { best }
            });
        let idx = remaining.remove(pos);
        current = points[idx];
        order.push(idx);
    }

    order
}

fn leg(from: LatLng, to: LatLng, mode: TravelMode) -> RouteLeg {
    let meters = haversine_m(from, to);
    let secs = meters / 1000.0 / speed_kmh(mode) * 3600.0;
    RouteLeg {
        distance_meters: meters.round() as u64,
        duration: RouteDuration::from_secs(secs.round() as u64),
        start_location: from,
        end_location: to,
        encoded_polyline: None,
    }
}

impl PlaceProvider for MockProvider {
    async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<Place>, ProviderError> {
        Ok(self
            .places
            .iter()
            .filter(|p| Self::matches(p, &query.text))
            .filter(|p| match &query.included_type {
                Some(t) => p.primary_type.as_deref() == Some(t.as_str()),
                None => true,
            })
            .filter(|p| {
                !query.open_now
                    || p.regular_opening_hours
                        .as_ref()
                        .and_then(|h| h.open_now)
                        .unwrap_or(false)
            })
            .filter(|p| query.accepts_rating(p.rating))
            .take(query.max_result_count as usize)
            .cloned()
            .collect())
    }

    async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<Place>, ProviderError> {
        let mut within: Vec<(f64, &Place)> = self
            .places
            .iter()
            .filter(|p| {
                query.included_types.is_empty()
                    || p.primary_type
                        .as_ref()
                        .is_some_and(|t| query.included_types.contains(t))
            })
            .map(|p| (haversine_m(query.location, p.location), p))
            .filter(|(d, _)| *d <= query.radius_meters)
            .collect();

        within.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(within
            .into_iter()
            .take(query.max_result_count as usize)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn place_details(&self, id: &PlaceId) -> Result<Place, ProviderError> {
        self.places
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::Api {
                status: 404,
                message: format!("Place details failed: no mock place {id}"),
            })
    }

    async fn autocomplete(
        &self,
        input: &str,
        _location: Option<LatLng>,
    ) -> Result<Vec<Suggestion>, ProviderError> {
        if input.chars().count() < AUTOCOMPLETE_MIN_INPUT {
            return Ok(Vec::new());
        }

        Ok(self
            .places
            .iter()
            .filter(|p| Self::matches(p, input))
            .map(|p| Suggestion {
                place_id: p.id.clone(),
                text: format!("{}, {}", p.name(), p.formatted_address),
                main_text: Some(p.name().to_string()),
                secondary_text: Some(p.formatted_address.clone()),
            })
            .collect())
    }
}

impl RouteProvider for MockProvider {
    async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResponse, ProviderError> {
        let order: Vec<usize> = if request.optimize_waypoint_order {
            nearest_neighbour_order(request.origin, &request.intermediates)
        } else {
            (0..request.intermediates.len()).collect()
        };

        let mut path = Vec::with_capacity(order.len() + 2);
        path.push(request.origin);
        path.extend(order.iter().map(|&i| request.intermediates[i]));
        path.push(request.destination);

        let legs: Vec<RouteLeg> = path
            .windows(2)
            .map(|w| leg(w[0], w[1], request.travel_mode))
            .collect();

        let distance_meters = legs.iter().map(|l| l.distance_meters).sum();
        let duration_secs = legs.iter().filter_map(|l| l.duration.seconds()).sum();

        Ok(RouteResponse {
            routes: vec![ComputedRoute {
                legs,
                distance_meters,
                duration: RouteDuration::from_secs(duration_secs),
                encoded_polyline: None,
                optimized_intermediate_waypoint_index: request
                    .optimize_waypoint_order
                    .then_some(order),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OpeningHours;
    use std::io::Write;

    fn ll(lat: f64, lng: f64) -> LatLng {
        LatLng::new(lat, lng).unwrap()
    }

    fn place(id: &str, name: &str, kind: &str, lat: f64, lng: f64) -> Place {
        let mut p = Place::new(PlaceId::parse(id).unwrap(), name, ll(lat, lng))
            .with_address("London");
        p.primary_type = Some(kind.to_string());
        p
    }

    fn provider() -> MockProvider {
        let mut museum = place("m1", "British Museum", "museum", 51.5194, -0.1270).with_rating(4.7);
        museum.regular_opening_hours = Some(OpeningHours {
            open_now: Some(true),
            weekday_descriptions: Vec::new(),
        });
        MockProvider::from_places(vec![
            museum,
            place("m2", "Science Museum", "museum", 51.4978, -0.1745).with_rating(4.5),
            place("c1", "Monmouth Coffee", "cafe", 51.5055, -0.0910).with_rating(3.5),
        ])
    }

    #[test]
    fn haversine_known_distance() {
        // Paris to London is roughly 344 km
        let d = haversine_m(ll(48.8566, 2.3522), ll(51.5074, -0.1278));
        assert!(d > 330_000.0 && d < 360_000.0, "got {d}");
        assert!(haversine_m(ll(1.0, 1.0), ll(1.0, 1.0)) < 0.001);
    }

    #[test]
    fn nearest_neighbour_visits_closest_first() {
        let origin = ll(0.0, 0.0);
        let points = [ll(0.0, 3.0), ll(0.0, 1.0), ll(0.0, 2.0)];
        assert_eq!(nearest_neighbour_order(origin, &points), vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn search_filters() {
        let p = provider();
        let here = ll(51.5, -0.12);

        let all = p.search_places(&PlaceQuery::new("museum", here)).await.unwrap();
        assert_eq!(all.len(), 2);

        let rated = p
            .search_places(&PlaceQuery::new("museum", here).with_min_rating(4.6))
            .await
            .unwrap();
        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].id.as_str(), "m1");

        let open = p
            .search_places(&PlaceQuery::new("", here).with_open_now(true))
            .await
            .unwrap();
        assert_eq!(open.len(), 1);

        let cafes = p
            .search_places(&PlaceQuery::new("", here).with_type("cafe"))
            .await
            .unwrap();
        assert_eq!(cafes.len(), 1);
    }

    #[tokio::test]
    async fn nearby_sorted_by_distance() {
        let p = provider();
        let query = NearbyQuery::new(ll(51.5194, -0.1270)).with_radius(10_000.0);
        let results = p.nearby_search(&query).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id.as_str(), "m1");

        let tight = NearbyQuery::new(ll(51.5194, -0.1270)).with_radius(100.0);
        assert_eq!(p.nearby_search(&tight).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn details_and_autocomplete() {
        let p = provider();
        let found = p.place_details(&PlaceId::parse("c1").unwrap()).await.unwrap();
        assert_eq!(found.name(), "Monmouth Coffee");

        let missing = p.place_details(&PlaceId::parse("zz").unwrap()).await;
        assert!(matches!(missing, Err(ProviderError::Api { status: 404, .. })));

        assert!(p.autocomplete("s", None).await.unwrap().is_empty());
        let suggestions = p.autocomplete("scien", None).await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].main_text.as_deref(), Some("Science Museum"));
    }

    #[tokio::test]
    async fn route_legs_cover_path() {
        let p = provider();
        let request = RouteRequest {
            origin: ll(0.0, 0.0),
            destination: ll(0.0, 0.0),
            intermediates: vec![ll(0.0, 2.0), ll(0.0, 1.0)],
            travel_mode: TravelMode::Walk,
            optimize_waypoint_order: true,
        };

        let resp = p.compute_route(&request).await.unwrap();
        let route = &resp.routes[0];
        assert_eq!(route.legs.len(), 3);
        assert_eq!(route.optimized_intermediate_waypoint_index, Some(vec![1, 0]));
        assert_eq!(
            route.distance_meters,
            route.legs.iter().map(|l| l.distance_meters).sum::<u64>()
        );
        assert!(route.duration.seconds().unwrap() > 0);
    }

    #[tokio::test]
    async fn route_without_optimization_keeps_order() {
        let p = provider();
        let request = RouteRequest {
            origin: ll(0.0, 0.0),
            destination: ll(0.0, 0.0),
            intermediates: vec![ll(0.0, 2.0), ll(0.0, 1.0)],
            travel_mode: TravelMode::Drive,
            optimize_waypoint_order: false,
        };

        let resp = p.compute_route(&request).await.unwrap();
        assert!(resp.routes[0].optimized_intermediate_waypoint_index.is_none());
        assert_eq!(resp.routes[0].legs[0].end_location, ll(0.0, 2.0));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.json");
        let places = vec![place("a1", "Alpha", "park", 1.0, 1.0)];
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(serde_json::to_string(&places).unwrap().as_bytes())
            .unwrap();

        let p = MockProvider::load(&path).unwrap();
        assert_eq!(p.len(), 1);

        std::fs::write(&path, "[]").unwrap();
        assert!(MockProvider::load(&path).is_err());
        assert!(MockProvider::load(dir.path().join("missing.json")).is_err());
    }
}
