//! Place and route provider.
//!
//! This module defines the provider contract used by the rest of the
//! crate and two implementations:
//!
//! - `GoogleMapsClient`: HTTP client for the Google Places API (New) and
//!   the Routes API
//! - `MockProvider`: serves places from a JSON file and estimates routes
//!   from straight-line distances, for offline development
//!
//! All calls are plain request/response; nothing is streamed.

mod client;
mod convert;
mod error;
mod mock;
mod query;
mod types;

use std::future::Future;

use crate::domain::{LatLng, Place, PlaceId, RouteRequest, RouteResponse, Suggestion};

pub use client::{DEFAULT_PHOTO_WIDTH, GoogleMapsClient, GoogleMapsConfig};
pub use convert::ConversionError;
pub use error::ProviderError;
pub use mock::MockProvider;
pub use query::{NearbyQuery, PlaceQuery, RankPreference};

/// Source of places.
///
/// This abstraction allows the web layer and caches to be tested with
/// mock data.
pub trait PlaceProvider {
    /// Free-text search biased towards a location.
    fn search_places(
        &self,
        query: &PlaceQuery,
    ) -> impl Future<Output = Result<Vec<Place>, ProviderError>> + Send;

    /// Places within a radius, nearest first.
    fn nearby_search(
        &self,
        query: &NearbyQuery,
    ) -> impl Future<Output = Result<Vec<Place>, ProviderError>> + Send;

    /// Full details for one place.
    fn place_details(
        &self,
        id: &PlaceId,
    ) -> impl Future<Output = Result<Place, ProviderError>> + Send;

    /// Predictions for partially typed input.
    fn autocomplete(
        &self,
        input: &str,
        location: Option<LatLng>,
    ) -> impl Future<Output = Result<Vec<Suggestion>, ProviderError>> + Send;
}

/// Source of computed routes.
pub trait RouteProvider {
    /// Compute a route through the request's waypoints.
    fn compute_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<RouteResponse, ProviderError>> + Send;
}

/// The provider selected at startup.
#[derive(Debug, Clone)]
pub enum Provider {
    Google(GoogleMapsClient),
    Mock(MockProvider),
}

impl PlaceProvider for Provider {
    async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<Place>, ProviderError> {
        match self {
            Provider::Google(p) => p.search_places(query).await,
            Provider::Mock(p) => p.search_places(query).await,
        }
    }

    async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<Place>, ProviderError> {
        match self {
            Provider::Google(p) => p.nearby_search(query).await,
            Provider::Mock(p) => p.nearby_search(query).await,
        }
    }

    async fn place_details(&self, id: &PlaceId) -> Result<Place, ProviderError> {
        match self {
            Provider::Google(p) => p.place_details(id).await,
            Provider::Mock(p) => p.place_details(id).await,
        }
    }

    async fn autocomplete(
        &self,
        input: &str,
        location: Option<LatLng>,
    ) -> Result<Vec<Suggestion>, ProviderError> {
        match self {
            Provider::Google(p) => p.autocomplete(input, location).await,
            Provider::Mock(p) => p.autocomplete(input, location).await,
        }
    }
}

impl RouteProvider for Provider {
    async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResponse, ProviderError> {
        match self {
            Provider::Google(p) => p.compute_route(request).await,
            Provider::Mock(p) => p.compute_route(request).await,
        }
    }
}
