//! Handler tests against the mock provider.

use std::path::PathBuf;

use tempfile::{TempDir, tempdir};

use super::*;
use crate::config::ServerConfig;
use crate::domain::{OpeningHours, TravelMode};
use crate::web::KeySource;

fn place(id: &str, name: &str, kind: &str, lat: f64, lng: f64) -> Place {
    let mut p = Place::new(PlaceId::parse(id).unwrap(), name, LatLng::new(lat, lng).unwrap())
        .with_address("London");
    p.primary_type = Some(kind.to_string());
    p
}

fn catalogue() -> Vec<Place> {
    let mut museum = place("m1", "British Museum", "museum", 51.5194, -0.1270).with_rating(4.7);
    museum.regular_opening_hours = Some(OpeningHours {
        open_now: Some(true),
        weekday_descriptions: Vec::new(),
    });
    vec![
        museum,
        place("m2", "Science Museum", "museum", 51.4978, -0.1745).with_rating(4.5),
        place("c1", "Monmouth Coffee", "cafe", 51.5055, -0.0910).with_rating(3.5),
    ]
}

fn write_catalogue(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("places.json");
    std::fs::write(&path, serde_json::to_string(&catalogue()).unwrap()).unwrap();
    path
}

/// State backed by the mock provider, with its own data directory.
fn mock_state() -> (AppState, TempDir) {
    let dir = tempdir().unwrap();
    let config = ServerConfig {
        data_dir: dir.path().join("data"),
        mock_places: Some(write_catalogue(&dir)),
        ..ServerConfig::default()
    };
    (AppState::new(config).unwrap(), dir)
}

/// State with no provider configured.
fn bare_state() -> (AppState, TempDir) {
    let dir = tempdir().unwrap();
    let config = ServerConfig {
        data_dir: dir.path().to_path_buf(),
        ..ServerConfig::default()
    };
    (AppState::new(config).unwrap(), dir)
}

fn search(q: &str) -> SearchParams {
    SearchParams {
        q: q.to_string(),
        lat: 51.5,
        lng: -0.12,
        place_type: None,
        open_now: false,
        min_rating: None,
        rank_by: None,
    }
}

fn here() -> EndpointRequest {
    EndpointRequest {
        endpoint: Some(EndpointInput::CurrentLocation {
            latitude: 51.5,
            longitude: -0.12,
        }),
    }
}

/// Summary form of a place, as a search result would give it.
fn bare(id: &str) -> Place {
    let full = catalogue().into_iter().find(|p| p.id.as_str() == id).unwrap();
    Place::new(full.id.clone(), full.name(), full.location)
}

async fn add(state: &AppState, id: &str) -> ItineraryView {
    add_stop(State(state.clone()), Json(AddStopRequest { place: bare(id) }))
        .await
        .unwrap()
        .0
}

fn stop_ids(view: &ItineraryView) -> Vec<&str> {
    view.stops.iter().map(|s| s.place.id.as_str()).collect()
}

#[tokio::test]
async fn health_ok() {
    assert_eq!(health().await, "ok");
}

#[tokio::test]
async fn provider_endpoints_require_key() {
    let (state, _dir) = bare_state();

    let err = search_places(State(state.clone()), Query(search("museum")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PreconditionRequired { .. }));

    let err = optimize(State(state.clone())).await.unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::PRECONDITION_REQUIRED);

    let status = api_key_status(State(state)).await.0;
    assert!(!status.configured);
    assert!(status.source.is_none());
}

#[tokio::test]
async fn itinerary_works_without_provider() {
    let (state, _dir) = bare_state();

    let view = add(&state, "m1").await;
    assert_eq!(stop_ids(&view), vec!["m1"]);
    // No enrichment without a provider
    assert_eq!(view.stops[0].place.formatted_address, "");
}

#[tokio::test]
async fn search_applies_filters() {
    let (state, _dir) = mock_state();

    let found = search_places(State(state.clone()), Query(search("museum")))
        .await
        .unwrap()
        .0;
    assert_eq!(found.places.len(), 2);
    assert!(found.places.iter().all(|p| p.photo_url.is_none()));

    let mut params = search("museum");
    params.min_rating = Some(4.6);
    let found = search_places(State(state.clone()), Query(params))
        .await
        .unwrap()
        .0;
    assert_eq!(found.places.len(), 1);
    assert_eq!(found.places[0].place.name(), "British Museum");
}

#[tokio::test]
async fn search_rejects_bad_input() {
    let (state, _dir) = mock_state();

    let err = search_places(State(state.clone()), Query(search("  ")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));

    let mut params = search("museum");
    params.lat = 123.0;
    let err = search_places(State(state.clone()), Query(params))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));

    let mut params = search("museum");
    params.rank_by = Some("popularity".into());
    let err = search_places(State(state), Query(params))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));
}

#[tokio::test]
async fn nearby_splits_types() {
    let (state, _dir) = mock_state();
    let params = NearbyParams {
        lat: 51.5,
        lng: -0.12,
        radius: Some(10_000.0),
        types: Some("cafe, bakery".into()),
    };

    let found = nearby_places(State(state), Query(params)).await.unwrap().0;
    let ids: Vec<&str> = found.places.iter().map(|p| p.place.id.as_str()).collect();
    assert_eq!(ids, vec!["c1"]);
}

#[tokio::test]
async fn details_not_found_is_404() {
    let (state, _dir) = mock_state();

    let found = place_details(State(state.clone()), Path("m2".into()))
        .await
        .unwrap()
        .0;
    assert_eq!(found.place.name(), "Science Museum");

    let err = place_details(State(state.clone()), Path("zzz".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let err = place_details(State(state), Path("bad id!".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));
}

#[tokio::test]
async fn autocomplete_requires_two_chars() {
    let (state, _dir) = mock_state();
    let params = |input: &str| AutocompleteParams {
        input: input.to_string(),
        lat: None,
        lng: None,
    };

    let short = autocomplete(State(state.clone()), Query(params("m")))
        .await
        .unwrap()
        .0;
    assert!(short.suggestions.is_empty());

    let found = autocomplete(State(state), Query(params("coffee")))
        .await
        .unwrap()
        .0;
    assert_eq!(found.suggestions.len(), 1);
    assert_eq!(found.suggestions[0].main_text.as_deref(), Some("Monmouth Coffee"));
}

#[tokio::test]
async fn add_stop_enriches_and_ignores_duplicates() {
    let (state, _dir) = mock_state();

    let view = add(&state, "m1").await;
    assert_eq!(stop_ids(&view), vec!["m1"]);
    assert_eq!(view.stops[0].place.formatted_address, "London");
    assert_eq!(view.stops[0].place.rating, Some(4.7));

    let before = view.updated_at;
    let view = add(&state, "m1").await;
    assert_eq!(stop_ids(&view), vec!["m1"]);
    assert_eq!(view.updated_at, before);
}

#[tokio::test]
async fn edit_endpoints() {
    let (state, _dir) = mock_state();
    add(&state, "m1").await;
    add(&state, "m2").await;
    add(&state, "c1").await;

    let view = remove_stop(State(state.clone()), Path("m2".into()))
        .await
        .unwrap()
        .0;
    assert_eq!(stop_ids(&view), vec!["m1", "c1"]);
    assert_eq!(view.stops[1].order, 1);

    let ids = |ids: &[&str]| ReorderRequest {
        place_ids: ids.iter().map(|s| PlaceId::parse(s).unwrap()).collect(),
    };
    let view = reorder_stops(State(state.clone()), Json(ids(&["c1", "m1"])))
        .await
        .unwrap()
        .0;
    assert_eq!(stop_ids(&view), vec!["c1", "m1"]);

    let err = reorder_stops(State(state.clone()), Json(ids(&["c1"])))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));

    let view = set_travel_mode(
        State(state.clone()),
        Json(TravelModeRequest {
            travel_mode: TravelMode::Transit,
        }),
    )
    .await
    .0;
    assert_eq!(view.travel_mode, TravelMode::Transit);

    let view = set_start(State(state.clone()), Json(here())).await.unwrap().0;
    assert_eq!(view.start.unwrap().label, "Current location");

    let view = set_end(
        State(state.clone()),
        Json(EndpointRequest {
            endpoint: Some(EndpointInput::Place { place: bare("m2") }),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(view.end.unwrap().label, "Science Museum");

    let view = set_return_to_start(
        State(state.clone()),
        Json(ReturnToStartRequest {
            return_to_start: true,
        }),
    )
    .await
    .0;
    assert!(view.return_to_start);

    let err = set_start(
        State(state),
        Json(EndpointRequest {
            endpoint: Some(EndpointInput::CurrentLocation {
                latitude: 0.0,
                longitude: 200.0,
            }),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));
}

#[tokio::test]
async fn optimize_reorders_with_mock_routes() {
    let (state, _dir) = mock_state();

    let err = optimize(State(state.clone())).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));

    add(&state, "m2").await;
    add(&state, "m1").await;
    set_start(State(state.clone()), Json(here())).await.unwrap();

    let response = optimize(State(state.clone())).await.unwrap().0;
    assert_eq!(response.outcome, "applied");
    assert!(response.reordered);
    assert_eq!(stop_ids(&response.itinerary), vec!["m1", "m2"]);
    assert!(!response.itinerary.optimizing);

    let route = response.itinerary.route.unwrap();
    assert_eq!(route.legs.len(), 3);
    assert_eq!(route.legs[0].from, "Current location");
    assert_eq!(route.legs[0].to, "British Museum");
    assert_eq!(route.legs[2].to, "Current location");

    // A structural edit drops the route
    let view = remove_stop(State(state.clone()), Path("m2".into()))
        .await
        .unwrap()
        .0;
    assert!(view.route.is_none());
}

#[tokio::test]
async fn optimize_while_in_flight_conflicts() {
    let (state, _dir) = mock_state();
    add(&state, "m1").await;
    set_start(State(state.clone()), Json(here())).await.unwrap();

    state.session.lock().await.begin_optimization().unwrap();
    let err = optimize(State(state.clone())).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));

    let view = get_itinerary(State(state)).await.0;
    assert!(view.optimizing);
}

#[tokio::test]
async fn save_list_load_delete() {
    let (state, _dir) = mock_state();
    add(&state, "m1").await;

    let saved = save_itinerary(
        State(state.clone()),
        Some(Json(SaveRequest {
            name: Some("  Museums  ".into()),
        })),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(saved.name, "Museums");
    assert_eq!(saved.stop_count, 1);

    let listed = list_itineraries(State(state.clone())).await.unwrap().0;
    assert_eq!(listed.itineraries.len(), 1);
    assert_eq!(listed.itineraries[0].id, saved.id);

    let cleared = clear_itinerary(State(state.clone())).await.0;
    assert!(cleared.stops.is_empty());
    assert_ne!(cleared.id, saved.id);

    let id = saved.id.to_string();
    let fetched = get_saved_itinerary(State(state.clone()), Path(id.clone()))
        .await
        .unwrap()
        .0;
    assert_eq!(fetched.name, "Museums");

    let loaded = load_saved_itinerary(State(state.clone()), Path(id.clone()))
        .await
        .unwrap()
        .0;
    assert_eq!(loaded.id, saved.id);
    assert_eq!(stop_ids(&loaded), vec!["m1"]);

    let status = delete_saved_itinerary(State(state.clone()), Path(id.clone()))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = load_saved_itinerary(State(state.clone()), Path(id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let err = get_saved_itinerary(State(state), Path("not-a-uuid".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));
}

#[tokio::test]
async fn save_without_body_keeps_name() {
    let (state, _dir) = bare_state();
    let saved = save_itinerary(State(state), None).await.unwrap().0;
    assert_eq!(saved.name, crate::domain::DEFAULT_ITINERARY_NAME);
}

#[tokio::test]
async fn api_key_settings() {
    let (state, _dir) = mock_state();

    let status = api_key_status(State(state.clone())).await.0;
    assert!(status.configured);
    assert_eq!(status.source, Some(KeySource::Mock));

    let err = set_api_key(
        State(state.clone()),
        Json(ApiKeyRequest {
            api_key: "   ".into(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));

    // Clearing the stored key leaves the mock provider active
    let status = clear_api_key(State(state)).await.unwrap().0;
    assert_eq!(status.source, Some(KeySource::Mock));
}

#[test]
fn error_mapping() {
    let status = |e: AppError| e.into_response().status();

    assert_eq!(
        status(RouteError::MissingStartLocation.into()),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(status(RouteError::NoRouteFound.into()), StatusCode::NOT_FOUND);
    assert_eq!(
        status(RouteError::OptimizationInProgress.into()),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status(RouteError::Provider(ProviderError::RateLimited).into()),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        status(ProviderError::NotConfigured("no key".into()).into()),
        StatusCode::PRECONDITION_REQUIRED
    );
    assert_eq!(
        status(StoreError::EmptyApiKey.into()),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status(StoreError::Clock.into()),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
