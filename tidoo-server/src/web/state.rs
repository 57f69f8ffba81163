//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::cache::{CacheConfig, CachedPlaceProvider};
use crate::config::ServerConfig;
use crate::itinerary::ItinerarySession;
use crate::provider::{
    DEFAULT_PHOTO_WIDTH, GoogleMapsClient, GoogleMapsConfig, MockProvider, Provider, ProviderError,
};
use crate::store::{
    ApiKey, CredentialStore, ItineraryStore, PlaceCache, PlaceCacheConfig, StoreError,
};

/// The place/route provider as seen by handlers.
pub type Places = CachedPlaceProvider<Provider>;

/// Where the active provider's credentials came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    Environment,
    Stored,
    Mock,
}

/// Errors that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

struct ActiveProvider {
    places: Places,
    source: KeySource,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The active itinerary.
    pub session: Arc<Mutex<ItinerarySession>>,

    /// Saved itineraries.
    pub itineraries: ItineraryStore,

    /// Stored API key.
    pub credentials: CredentialStore,

    provider: Arc<RwLock<Option<ActiveProvider>>>,
    place_cache: PlaceCache,
    cache_config: CacheConfig,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// A mock places file wins over any key; otherwise the environment key
    /// wins over the stored one. With neither, the server starts without a
    /// provider and waits for a key to be configured.
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        let itineraries = ItineraryStore::in_data_dir(&config.data_dir);
        let credentials = CredentialStore::in_data_dir(&config.data_dir);
        let place_cache = PlaceCache::new(PlaceCacheConfig::in_data_dir(&config.data_dir));

        let state = Self {
            session: Arc::new(Mutex::new(ItinerarySession::default())),
            itineraries,
            credentials,
            provider: Arc::new(RwLock::new(None)),
            place_cache,
            cache_config: CacheConfig::default(),
            config: Arc::new(config),
        };

        let active = state.initial_provider()?;
        if let Some(active) = &active {
            info!(source = ?active.source, "Place provider configured");
        } else {
            info!("No API key configured; waiting for onboarding");
        }

        Ok(Self {
            provider: Arc::new(RwLock::new(active)),
            ..state
        })
    }

    fn initial_provider(&self) -> Result<Option<ActiveProvider>, StartupError> {
        if let Some(path) = &self.config.mock_places {
            let mock = MockProvider::load(path)?;
            info!(places = mock.len(), path = %path.display(), "Using mock place provider");
            return Ok(Some(self.wrap(Provider::Mock(mock), KeySource::Mock)));
        }

        if let Some(key) = &self.config.api_key {
            let client = self.google_client(key)?;
            return Ok(Some(self.wrap(Provider::Google(client), KeySource::Environment)));
        }

        match self.credentials.load() {
            Ok(Some(key)) => {
                let client = self.google_client(key.expose())?;
                Ok(Some(self.wrap(Provider::Google(client), KeySource::Stored)))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable stored credentials");
                Ok(None)
            }
        }
    }

    fn google_client(&self, key: &str) -> Result<GoogleMapsClient, ProviderError> {
        let config = GoogleMapsConfig::new(key)
            .with_timeout(self.config.provider_timeout_secs)
            .with_max_concurrent(self.config.provider_max_concurrent);
        GoogleMapsClient::new(config)
    }

    fn wrap(&self, provider: Provider, source: KeySource) -> ActiveProvider {
        ActiveProvider {
            places: CachedPlaceProvider::new(
                provider,
                &self.cache_config,
                Some(self.place_cache.clone()),
            ),
            source,
        }
    }

    /// The configured provider, or `None` before onboarding.
    pub async fn places(&self) -> Option<Places> {
        self.provider.read().await.as_ref().map(|a| a.places.clone())
    }

    /// Where the active key came from, if a provider is configured.
    pub async fn key_source(&self) -> Option<KeySource> {
        self.provider.read().await.as_ref().map(|a| a.source)
    }

    /// Validate a key against the provider, then store and activate it.
    ///
    /// An invalid key is neither stored nor activated.
    pub async fn install_api_key(&self, key: ApiKey) -> Result<(), ProviderError> {
        let client = self.google_client(key.expose())?;
        client.validate_key().await?;

        self.credentials
            .save(&key)
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;

        let active = self.wrap(Provider::Google(client), KeySource::Stored);
        *self.provider.write().await = Some(active);
        info!("API key stored and activated");
        Ok(())
    }

    /// Remove the stored key.
    ///
    /// A provider configured from the environment or a mock file stays active.
    pub async fn clear_api_key(&self) -> Result<(), StoreError> {
        self.credentials.clear()?;

        let mut provider = self.provider.write().await;
        if provider.as_ref().is_some_and(|a| a.source == KeySource::Stored) {
            *provider = None;
            info!("Stored API key removed");
        }
        Ok(())
    }

    /// Public media URL for a place photo, when the live provider is active.
    pub fn photo_url(places: &Places, photo_name: &str) -> Option<String> {
        match places.inner() {
            Provider::Google(client) => Some(client.photo_url(photo_name, DEFAULT_PHOTO_WIDTH)),
            Provider::Mock(_) => None,
        }
    }

    #[cfg(test)]
    pub(crate) async fn set_provider(&self, provider: Provider) {
        *self.provider.write().await = Some(self.wrap(provider, KeySource::Mock));
    }
}
