//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::domain::{Endpoint, ItineraryError, ItineraryId, LatLng, Place, PlaceId};
use crate::itinerary::RouteError;
use crate::provider::{
    NearbyQuery, PlaceProvider, PlaceQuery, ProviderError, RankPreference, RouteProvider,
};
use crate::store::{ApiKey, StoreError};

use super::dto::*;
use super::state::{AppState, Places};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/places/search", get(search_places))
        .route("/api/places/nearby", get(nearby_places))
        .route("/api/places/autocomplete", get(autocomplete))
        .route("/api/places/:id", get(place_details))
        .route("/api/itinerary", get(get_itinerary))
        .route("/api/itinerary/stops", post(add_stop))
        .route("/api/itinerary/stops/:place_id", delete(remove_stop))
        .route("/api/itinerary/order", put(reorder_stops))
        .route("/api/itinerary/travel-mode", put(set_travel_mode))
        .route("/api/itinerary/start", put(set_start))
        .route("/api/itinerary/end", put(set_end))
        .route("/api/itinerary/return-to-start", put(set_return_to_start))
        .route("/api/itinerary/optimize", post(optimize))
        .route("/api/itinerary/clear", post(clear_itinerary))
        .route("/api/itinerary/save", post(save_itinerary))
        .route("/api/itineraries", get(list_itineraries))
        .route(
            "/api/itineraries/:id",
            get(get_saved_itinerary).delete(delete_saved_itinerary),
        )
        .route("/api/itineraries/:id/load", post(load_saved_itinerary))
        .route(
            "/api/settings/api-key",
            get(api_key_status).put(set_api_key).delete(clear_api_key),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The configured provider, or 428 until an API key is set.
async fn require_places(state: &AppState) -> Result<Places, AppError> {
    state.places().await.ok_or_else(|| AppError::PreconditionRequired {
        message: "Configure a Google Maps API key to use place search and routing".to_string(),
    })
}

fn lat_lng(lat: f64, lng: f64) -> Result<LatLng, AppError> {
    LatLng::new(lat, lng).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })
}

fn parse_place_id(raw: &str) -> Result<PlaceId, AppError> {
    PlaceId::parse(raw).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })
}

fn parse_itinerary_id(raw: &str) -> Result<ItineraryId, AppError> {
    ItineraryId::parse(raw).map_err(|_| AppError::BadRequest {
        message: format!("Invalid itinerary id: {raw}"),
    })
}

fn parse_rank(raw: &str) -> Result<RankPreference, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "relevance" => Ok(RankPreference::Relevance),
        "distance" => Ok(RankPreference::Distance),
        _ => Err(AppError::BadRequest {
            message: format!("Invalid rank_by: {raw} (expected relevance or distance)"),
        }),
    }
}

fn place_results(places: &Places, found: Vec<Place>) -> PlacesResponse {
    let places = found
        .into_iter()
        .map(|place| {
            let photo_url = place
                .photos
                .first()
                .and_then(|p| AppState::photo_url(places, &p.name));
            PlaceResult { place, photo_url }
        })
        .collect();
    PlacesResponse { places }
}

/// Free-text place search.
async fn search_places(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<PlacesResponse>, AppError> {
    let places = require_places(&state).await?;

    let text = params.q.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest {
            message: "Search text must not be empty".to_string(),
        });
    }

    let mut query =
        PlaceQuery::new(text, lat_lng(params.lat, params.lng)?).with_open_now(params.open_now);
    if let Some(place_type) = params.place_type.filter(|t| !t.trim().is_empty()) {
        query = query.with_type(place_type.trim());
    }
    if let Some(min_rating) = params.min_rating {
        query = query.with_min_rating(min_rating);
    }
    if let Some(rank) = params.rank_by.as_deref() {
        query = query.with_rank_preference(parse_rank(rank)?);
    }

    let found = places.search_places(&query).await?;
    Ok(Json(place_results(&places, found)))
}

/// Places near a coordinate.
async fn nearby_places(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<PlacesResponse>, AppError> {
    let places = require_places(&state).await?;

    let mut query = NearbyQuery::new(lat_lng(params.lat, params.lng)?);
    if let Some(radius) = params.radius {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(AppError::BadRequest {
                message: format!("Invalid radius: {radius}"),
            });
        }
        query = query.with_radius(radius);
    }
    if let Some(types) = params.types.as_deref() {
        let types = types
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        query = query.with_types(types);
    }

    let found = places.nearby_search(&query).await?;
    Ok(Json(place_results(&places, found)))
}

/// Predictions for partially typed input.
async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let places = require_places(&state).await?;

    let location = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => Some(lat_lng(lat, lng)?),
        _ => None,
    };

    let suggestions = places.autocomplete(params.input.trim(), location).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

/// Full details for one place, served from cache when fresh.
async fn place_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaceResult>, AppError> {
    let places = require_places(&state).await?;
    let id = parse_place_id(&id)?;

    let place = places.place_details(&id).await?;
    let photo_url = place
        .photos
        .first()
        .and_then(|p| AppState::photo_url(&places, &p.name));
    Ok(Json(PlaceResult { place, photo_url }))
}

async fn current_view(state: &AppState) -> ItineraryView {
    let session = state.session.lock().await;
    ItineraryView::new(session.itinerary(), session.is_optimizing())
}

/// The active itinerary.
async fn get_itinerary(State(state): State<AppState>) -> Json<ItineraryView> {
    Json(current_view(&state).await)
}

/// Add a stop, then fill in its full details if a provider is available.
///
/// Adding a place that is already present leaves the itinerary unchanged.
async fn add_stop(
    State(state): State<AppState>,
    Json(req): Json<AddStopRequest>,
) -> Result<Json<ItineraryView>, AppError> {
    let place = req.place;
    let id = place.id.clone();

    let added = state.session.lock().await.add_stop(place);
    if added {
        enrich_stop(&state, &id).await;
    } else {
        debug!(place = %id, "Place already in itinerary");
    }

    Ok(Json(current_view(&state).await))
}

/// Best-effort detail fetch for a newly added stop.
async fn enrich_stop(state: &AppState, id: &PlaceId) {
    let Some(places) = state.places().await else {
        return;
    };

    match places.place_details(id).await {
        Ok(place) => {
            if !state.session.lock().await.enrich_stop(place) {
                debug!(place = %id, "Stop removed before details arrived");
            }
        }
        Err(e) => warn!(place = %id, error = %e, "Failed to fetch stop details"),
    }
}

async fn remove_stop(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> Result<Json<ItineraryView>, AppError> {
    let id = parse_place_id(&place_id)?;
    let mut session = state.session.lock().await;
    session.remove_stop(&id);
    Ok(Json(ItineraryView::new(
        session.itinerary(),
        session.is_optimizing(),
    )))
}

async fn reorder_stops(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<ItineraryView>, AppError> {
    let mut session = state.session.lock().await;
    session.reorder_stops(&req.place_ids)?;
    Ok(Json(ItineraryView::new(
        session.itinerary(),
        session.is_optimizing(),
    )))
}

async fn set_travel_mode(
    State(state): State<AppState>,
    Json(req): Json<TravelModeRequest>,
) -> Json<ItineraryView> {
    let mut session = state.session.lock().await;
    session.set_travel_mode(req.travel_mode);
    Json(ItineraryView::new(
        session.itinerary(),
        session.is_optimizing(),
    ))
}

fn endpoint(input: Option<EndpointInput>) -> Result<Option<Endpoint>, AppError> {
    match input {
        None => Ok(None),
        Some(EndpointInput::CurrentLocation {
            latitude,
            longitude,
        }) => Ok(Some(Endpoint::current_location(lat_lng(latitude, longitude)?))),
        Some(EndpointInput::Place { place }) => Ok(Some(Endpoint::from_place(&place))),
    }
}

async fn set_start(
    State(state): State<AppState>,
    Json(req): Json<EndpointRequest>,
) -> Result<Json<ItineraryView>, AppError> {
    let start = endpoint(req.endpoint)?;
    let mut session = state.session.lock().await;
    session.set_start_location(start);
    Ok(Json(ItineraryView::new(
        session.itinerary(),
        session.is_optimizing(),
    )))
}

async fn set_end(
    State(state): State<AppState>,
    Json(req): Json<EndpointRequest>,
) -> Result<Json<ItineraryView>, AppError> {
    let end = endpoint(req.endpoint)?;
    let mut session = state.session.lock().await;
    session.set_end_location(end);
    Ok(Json(ItineraryView::new(
        session.itinerary(),
        session.is_optimizing(),
    )))
}

async fn set_return_to_start(
    State(state): State<AppState>,
    Json(req): Json<ReturnToStartRequest>,
) -> Json<ItineraryView> {
    let mut session = state.session.lock().await;
    session.set_return_to_start(req.return_to_start);
    Json(ItineraryView::new(
        session.itinerary(),
        session.is_optimizing(),
    ))
}

/// Optimize the active itinerary's route.
///
/// The session lock is released while the provider is called. The call and
/// its reconciliation run in their own task so a disconnected client cannot
/// leave the request marked as in flight.
async fn optimize(State(state): State<AppState>) -> Result<Json<OptimizeResponse>, AppError> {
    let places = require_places(&state).await?;
    let (tag, request) = state.session.lock().await.begin_optimization()?;

    let session = state.session.clone();
    let task = tokio::spawn(async move {
        let result = places.inner().compute_route(&request).await;
        let mut session = session.lock().await;
        let outcome = session.finish_optimization(tag, result)?;
        let view = ItineraryView::new(session.itinerary(), session.is_optimizing());
        Ok::<_, RouteError>(OptimizeResponse::new(outcome, view))
    });

    let response = task.await.map_err(|e| AppError::Internal {
        message: format!("Route optimization task failed: {e}"),
    })??;

    info!(outcome = response.outcome, reordered = response.reordered, "Optimize request finished");
    Ok(Json(response))
}

/// Replace the active itinerary with a fresh one.
async fn clear_itinerary(State(state): State<AppState>) -> Json<ItineraryView> {
    let mut session = state.session.lock().await;
    session.clear();
    Json(ItineraryView::new(
        session.itinerary(),
        session.is_optimizing(),
    ))
}

/// Persist the active itinerary, optionally renaming it first.
async fn save_itinerary(
    State(state): State<AppState>,
    body: Option<Json<SaveRequest>>,
) -> Result<Json<ItinerarySummary>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let mut session = state.session.lock().await;

    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        session.rename(name);
    }

    state.itineraries.save(session.itinerary())?;
    info!(itinerary = %session.itinerary().id(), "Itinerary saved");
    Ok(Json(ItinerarySummary::from(session.itinerary())))
}

/// Saved itineraries, most recent first.
async fn list_itineraries(
    State(state): State<AppState>,
) -> Result<Json<ItinerariesResponse>, AppError> {
    let itineraries = state
        .itineraries
        .list_all()?
        .iter()
        .map(ItinerarySummary::from)
        .collect();
    Ok(Json(ItinerariesResponse { itineraries }))
}

async fn get_saved_itinerary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItineraryView>, AppError> {
    let id = parse_itinerary_id(&id)?;
    let itinerary = state.itineraries.get(id)?.ok_or_else(|| AppError::NotFound {
        message: format!("No saved itinerary {id}"),
    })?;
    Ok(Json(ItineraryView::new(&itinerary, false)))
}

/// Make a saved itinerary the active one.
async fn load_saved_itinerary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItineraryView>, AppError> {
    let id = parse_itinerary_id(&id)?;
    let itinerary = state.itineraries.get(id)?.ok_or_else(|| AppError::NotFound {
        message: format!("No saved itinerary {id}"),
    })?;

    let mut session = state.session.lock().await;
    session.load(itinerary);
    Ok(Json(ItineraryView::new(
        session.itinerary(),
        session.is_optimizing(),
    )))
}

async fn delete_saved_itinerary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_itinerary_id(&id)?;
    state.itineraries.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_key_status(State(state): State<AppState>) -> Json<ApiKeyStatus> {
    let source = state.key_source().await;
    Json(ApiKeyStatus {
        configured: source.is_some(),
        source,
    })
}

/// Validate and store an API key.
async fn set_api_key(
    State(state): State<AppState>,
    Json(req): Json<ApiKeyRequest>,
) -> Result<Json<ApiKeyStatus>, AppError> {
    let key = ApiKey::parse(&req.api_key)?;

    state.install_api_key(key).await.map_err(|e| match e {
        ProviderError::Api { status, message } if status == 400 || status == 403 => {
            AppError::BadRequest { message }
        }
        ProviderError::NotConfigured(message) => AppError::BadRequest { message },
        other => AppError::from(other),
    })?;

    Ok(Json(ApiKeyStatus {
        configured: true,
        source: state.key_source().await,
    }))
}

async fn clear_api_key(State(state): State<AppState>) -> Result<Json<ApiKeyStatus>, AppError> {
    state.clear_api_key().await?;
    let source = state.key_source().await;
    Ok(Json(ApiKeyStatus {
        configured: source.is_some(),
        source,
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    PreconditionRequired { message: String },
    BadGateway { message: String },
    Internal { message: String },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::PreconditionRequired { .. } => StatusCode::PRECONDITION_REQUIRED,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_message(self) -> String {
        match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Conflict { message }
            | AppError::PreconditionRequired { message }
            | AppError::BadGateway { message }
            | AppError::Internal { message } => message,
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotConfigured(message) => AppError::PreconditionRequired { message },
            ProviderError::Api { status: 404, message } => AppError::NotFound { message },
            other => AppError::BadGateway {
                message: other.to_string(),
            },
        }
    }
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        let message = e.to_string();
        match e {
            RouteError::MissingStartLocation | RouteError::InsufficientStops => {
                AppError::BadRequest { message }
            }
            RouteError::NoRouteFound => AppError::NotFound { message },
            RouteError::OptimizationInProgress => AppError::Conflict { message },
            RouteError::Provider(_) | RouteError::InvalidWaypointOrder(_) => {
                AppError::BadGateway { message }
            }
        }
    }
}

impl From<ItineraryError> for AppError {
    fn from(e: ItineraryError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmptyApiKey => AppError::BadRequest {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = self.into_message();

        if status.is_server_error() {
            warn!(%status, %message, "Request failed");
        } else {
            debug!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
