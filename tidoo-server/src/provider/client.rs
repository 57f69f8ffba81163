//! Google Places (New) and Routes HTTP client.
//!
//! Provides async methods for place search, place details, autocomplete
//! and route computation. Handles authentication, field masks, bounded
//! concurrency and conversion to domain types.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::domain::{LatLng, Place, PlaceId, RouteRequest, RouteResponse, Suggestion};

use super::convert::{convert_routes, convert_suggestions};
use super::error::ProviderError;
use super::query::{
    AUTOCOMPLETE_BIAS_RADIUS_M, AUTOCOMPLETE_MIN_INPUT, NearbyQuery, PlaceQuery, RankPreference,
    SEARCH_BIAS_RADIUS_M,
};
use super::types::{
    AutocompleteBody, AutocompleteResponse, ComputeRoutesBody, ComputeRoutesResponse,
    ErrorEnvelope, LocationArea, PlacesResponse, SearchNearbyBody, SearchTextBody, Waypoint,
};
use super::{PlaceProvider, RouteProvider};

/// Default base URL for the Places API (New).
const DEFAULT_PLACES_BASE_URL: &str = "https://places.googleapis.com/v1";

/// Default base URL for the Routes API.
const DEFAULT_ROUTES_BASE_URL: &str = "https://routes.googleapis.com";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default photo width in pixels.
pub const DEFAULT_PHOTO_WIDTH: u32 = 400;

/// Maximum number of response body characters kept in errors.
const MAX_ERROR_BODY: usize = 500;

const API_KEY_HEADER: &str = "x-goog-api-key";
const FIELD_MASK_HEADER: &str = "x-goog-fieldmask";

const SEARCH_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,\
places.location,places.rating,places.userRatingCount,places.primaryType,\
places.primaryTypeDisplayName,places.photos,places.regularOpeningHours,places.googleMapsUri";

const DETAIL_FIELD_MASK: &str = "id,displayName,formattedAddress,location,rating,\
userRatingCount,primaryType,primaryTypeDisplayName,photos,regularOpeningHours,\
editorialSummary,nationalPhoneNumber,websiteUri,priceLevel,reviews,googleMapsUri";

const ROUTE_FIELD_MASK: &str = "routes.legs.distanceMeters,routes.legs.duration,\
routes.legs.startLocation,routes.legs.endLocation,routes.legs.polyline.encodedPolyline,\
routes.distanceMeters,routes.duration,routes.polyline.encodedPolyline,\
routes.optimizedIntermediateWaypointIndex";

/// Configuration for the Google Maps client.
#[derive(Clone)]
pub struct GoogleMapsConfig {
    /// API key sent with every request
    pub api_key: String,
    /// Base URL for the Places API
    pub places_base_url: String,
    /// Base URL for the Routes API
    pub routes_base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GoogleMapsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleMapsConfig")
            .field("api_key", &"<redacted>")
            .field("places_base_url", &self.places_base_url)
            .field("routes_base_url", &self.routes_base_url)
            .field("max_concurrent", &self.max_concurrent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GoogleMapsConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            places_base_url: DEFAULT_PLACES_BASE_URL.to_string(),
            routes_base_url: DEFAULT_ROUTES_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set custom base URLs (for testing).
    pub fn with_base_urls(
        mut self,
        places: impl Into<String>,
        routes: impl Into<String>,
    ) -> Self {
        self.places_base_url = places.into();
        self.routes_base_url = routes.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Google Places and Routes client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Clone)]
pub struct GoogleMapsClient {
    http: reqwest::Client,
    api_key: String,
    places_base_url: String,
    routes_base_url: String,
    semaphore: Arc<Semaphore>,
}

impl std::fmt::Debug for GoogleMapsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleMapsClient")
            .field("places_base_url", &self.places_base_url)
            .field("routes_base_url", &self.routes_base_url)
            .finish_non_exhaustive()
    }
}

impl GoogleMapsClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GoogleMapsConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured("missing API key".to_string()));
        }

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ProviderError::NotConfigured("invalid API key format".to_string()))?;
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key,
            places_base_url: config.places_base_url,
            routes_base_url: config.routes_base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Check that the key is accepted by the Places API.
    ///
    /// Issues the cheapest possible text search.
    #[tracing::instrument(skip(self))]
    pub async fn validate_key(&self) -> Result<(), ProviderError> {
        let url = format!("{}/places:searchText", self.places_base_url);
        let body = SearchTextBody {
            text_query: "test".to_string(),
            location_bias: None,
            max_result_count: 1,
            rank_preference: None,
            included_type: None,
            open_now: None,
        };

        let _: PlacesResponse = self
            .post_json(&url, Some("places.id"), &body, "API key validation")
            .await
            .map_err(|e| match e {
                ProviderError::Api { status, .. } if status == 400 || status == 403 => {
                    ProviderError::Api {
                        status,
                        message: "Invalid API key or Places API not enabled".to_string(),
                    }
                }
                other => other,
            })?;
        Ok(())
    }

    /// Media URL for a photo resource name.
    pub fn photo_url(&self, photo_name: &str, max_width: u32) -> String {
        format!(
            "{}/{}/media?maxWidthPx={}&key={}",
            self.places_base_url, photo_name, max_width, self.api_key
        )
    }

    async fn post_json<B, T>(
        &self,
        url: &str,
        field_mask: Option<&str>,
        body: &B,
        operation: &str,
    ) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let _permit = self.acquire().await?;

        let mut request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(mask) = field_mask {
            request = request.header(FIELD_MASK_HEADER, mask);
        }

        let response = request.send().await?;
        read_json(response, operation).await
    }

    async fn get_json<T>(&self, url: &str, field_mask: &str, operation: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let _permit = self.acquire().await?;

        let response = self
            .http
            .get(url)
            .header(FIELD_MASK_HEADER, field_mask)
            .send()
            .await?;
        read_json(response, operation).await
    }

    async fn acquire(&self) -> Result<tokio::sync::SemaphorePermit<'_>, ProviderError> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| ProviderError::NotConfigured("request semaphore closed".to_string()))
    }
}

/// Check status and decode a JSON body.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T, ProviderError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(api_error(status.as_u16(), &body, operation));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(MAX_ERROR_BODY).collect()),
    })
}

/// Build an API error, preferring the provider's own message.
fn api_error(status: u16, body: &str, operation: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("{operation} failed: {status}"));

    ProviderError::Api { status, message }
}

impl PlaceProvider for GoogleMapsClient {
    #[tracing::instrument(skip(self), fields(text = %query.text))]
    async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<Place>, ProviderError> {
        let url = format!("{}/places:searchText", self.places_base_url);
        let body = SearchTextBody {
            text_query: query.text.clone(),
            location_bias: Some(LocationArea::circle(query.location, SEARCH_BIAS_RADIUS_M)),
            max_result_count: query.max_result_count,
            rank_preference: Some(query.rank_preference),
            included_type: query.included_type.clone(),
            open_now: query.open_now.then_some(true),
        };

        let response: PlacesResponse = self
            .post_json(&url, Some(SEARCH_FIELD_MASK), &body, "Places search")
            .await?;

        Ok(response
            .places
            .into_iter()
            .filter(|p| query.accepts_rating(p.rating))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<Place>, ProviderError> {
        let url = format!("{}/places:searchNearby", self.places_base_url);
        let body = SearchNearbyBody {
            location_restriction: LocationArea::circle(query.location, query.radius_meters),
            max_result_count: query.max_result_count,
            rank_preference: RankPreference::Distance,
            included_types: query.included_types.clone(),
        };

        let response: PlacesResponse = self
            .post_json(&url, Some(SEARCH_FIELD_MASK), &body, "Nearby search")
            .await?;
        Ok(response.places)
    }

    #[tracing::instrument(skip(self))]
    async fn place_details(&self, id: &PlaceId) -> Result<Place, ProviderError> {
        let url = format!("{}/places/{}", self.places_base_url, id.as_str());
        self.get_json(&url, DETAIL_FIELD_MASK, "Place details").await
    }

    #[tracing::instrument(skip(self))]
    async fn autocomplete(
        &self,
        input: &str,
        location: Option<LatLng>,
    ) -> Result<Vec<Suggestion>, ProviderError> {
        if input.chars().count() < AUTOCOMPLETE_MIN_INPUT {
            return Ok(Vec::new());
        }

        let url = format!("{}/places:autocomplete", self.places_base_url);
        let body = AutocompleteBody {
            input: input.to_string(),
            location_bias: location
                .map(|center| LocationArea::circle(center, AUTOCOMPLETE_BIAS_RADIUS_M)),
        };

        match self
            .post_json::<_, AutocompleteResponse>(&url, None, &body, "Autocomplete")
            .await
        {
            Ok(response) => Ok(convert_suggestions(response.suggestions)),
            Err(e @ ProviderError::Api { .. }) => {
                tracing::warn!(error = %e, "Autocomplete failed, returning no suggestions");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

impl RouteProvider for GoogleMapsClient {
    #[tracing::instrument(skip(self, request), fields(
        intermediates = request.intermediates.len(),
        mode = %request.travel_mode,
        optimize = request.optimize_waypoint_order,
    ))]
    async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResponse, ProviderError> {
        let url = format!("{}/directions/v2:computeRoutes", self.routes_base_url);
        let body = ComputeRoutesBody {
            origin: Waypoint::from(request.origin),
            destination: Waypoint::from(request.destination),
            intermediates: request.intermediates.iter().copied().map(Waypoint::from).collect(),
            travel_mode: request.travel_mode,
            routing_preference: request.travel_mode.routing_preference(),
            optimize_waypoint_order: request.optimize_waypoint_order,
            compute_alternative_routes: false,
            language_code: "en-US",
            units: "IMPERIAL",
        };

        let response: ComputeRoutesResponse = self
            .post_json(&url, Some(ROUTE_FIELD_MASK), &body, "Route computation")
            .await?;

        convert_routes(response).map_err(|e| ProviderError::Json {
            message: e.to_string(),
            body: None,
        })
    }
}
