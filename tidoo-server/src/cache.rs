//! Caching layer for place lookups.
//!
//! Place details rarely change, so they are cached for a day: in memory
//! (moka) and on disk (`PlaceCache`), so a restart does not refetch every
//! place in saved itineraries. Concurrent requests for the same place
//! share a single provider call.
//!
//! Searches, nearby lookups and autocomplete depend on the user's position
//! and input, and are passed through uncached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use crate::domain::{LatLng, Place, PlaceId, Suggestion};
use crate::provider::{NearbyQuery, PlaceProvider, PlaceQuery, ProviderError};
use crate::store::PlaceCache;

/// Configuration for the in-memory cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 1000,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A place held in memory, with the lifetime it was admitted for.
#[derive(Clone)]
struct Fresh {
    place: Arc<Place>,
    expires_in: Duration,
}

/// Expires each entry after its own lifetime, so a place loaded from disk
/// keeps the age it already had there.
struct RemainingLifetime;

impl Expiry<PlaceId, Fresh> for RemainingLifetime {
    fn expire_after_create(
        &self,
        _key: &PlaceId,
        value: &Fresh,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expires_in)
    }
}

/// Place provider with cached detail lookups.
///
/// Wraps any `PlaceProvider`; the disk cache is optional.
#[derive(Clone)]
pub struct CachedPlaceProvider<P> {
    inner: P,
    details: MokaCache<PlaceId, Fresh>,
    ttl: Duration,
    disk: Option<PlaceCache>,
}

impl<P> CachedPlaceProvider<P> {
    /// Create a new cached provider.
    pub fn new(inner: P, config: &CacheConfig, disk: Option<PlaceCache>) -> Self {
        let details = MokaCache::builder()
            .expire_after(RemainingLifetime)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            details,
            ttl: config.ttl,
            disk,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of places held in memory.
    pub fn entry_count(&self) -> u64 {
        self.details.entry_count()
    }
}

impl<P: PlaceProvider + Sync> CachedPlaceProvider<P> {
    /// Fetch details, trying the disk cache before the provider.
    async fn fetch_details(&self, id: &PlaceId) -> Result<Fresh, ProviderError> {
        if let Some((place, remaining)) = self.disk.as_ref().and_then(|d| d.load(id)) {
            debug!(place = %id, ?remaining, "Place details from disk cache");
            return Ok(Fresh {
                place: Arc::new(place),
                expires_in: remaining.min(self.ttl),
            });
        }

        let place = self.inner.place_details(id).await?;
        if let Some(disk) = &self.disk
            && let Err(e) = disk.save(&place)
        {
            warn!(place = %id, error = %e, "Failed to persist place details");
        }
        Ok(Fresh {
            place: Arc::new(place),
            expires_in: self.ttl,
        })
    }
}

impl<P: PlaceProvider + Send + Sync> PlaceProvider for CachedPlaceProvider<P> {
    async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<Place>, ProviderError> {
        self.inner.search_places(query).await
    }

    async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<Place>, ProviderError> {
        self.inner.nearby_search(query).await
    }

    async fn place_details(&self, id: &PlaceId) -> Result<Place, ProviderError> {
        let fresh = self
            .details
            .try_get_with(id.clone(), self.fetch_details(id))
            .await
            .map_err(|e| Arc::try_unwrap(e).unwrap_or_else(ProviderError::Shared))?;
        Ok(Place::clone(&fresh.place))
    }

    async fn autocomplete(
        &self,
        input: &str,
        location: Option<LatLng>,
    ) -> Result<Vec<Suggestion>, ProviderError> {
        self.inner.autocomplete(input, location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use crate::store::PlaceCacheConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Counts detail lookups and delegates to a mock.
    struct Counting {
        mock: MockProvider,
        calls: Arc<AtomicUsize>,
    }

    impl PlaceProvider for Counting {
        async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<Place>, ProviderError> {
            self.mock.search_places(query).await
        }

        async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<Place>, ProviderError> {
            self.mock.nearby_search(query).await
        }

        async fn place_details(&self, id: &PlaceId) -> Result<Place, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.mock.place_details(id).await
        }

        async fn autocomplete(
            &self,
            input: &str,
            location: Option<LatLng>,
        ) -> Result<Vec<Suggestion>, ProviderError> {
            self.mock.autocomplete(input, location).await
        }
    }

    fn pid(s: &str) -> PlaceId {
        PlaceId::parse(s).unwrap()
    }

    fn counting() -> (Counting, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = MockProvider::from_places(vec![Place::new(
            pid("louvre"),
            "Louvre",
            LatLng::new(48.8606, 2.3376).unwrap(),
        )]);
        (
            Counting {
                mock,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[tokio::test]
    async fn details_cached_in_memory() {
        let (provider, calls) = counting();
        let cached = CachedPlaceProvider::new(provider, &CacheConfig::default(), None);

        let first = cached.place_details(&pid("louvre")).await.unwrap();
        let second = cached.place_details(&pid("louvre")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_fetch() {
        let (provider, calls) = counting();
        let cached = CachedPlaceProvider::new(provider, &CacheConfig::default(), None);
        let id = pid("louvre");

        let (a, b, c) = tokio::join!(
            cached.place_details(&id),
            cached.place_details(&id),
            cached.place_details(&id),
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let (provider, calls) = counting();
        let cached = CachedPlaceProvider::new(provider, &CacheConfig::default(), None);

        let err = cached.place_details(&pid("missing")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(cached.place_details(&pid("missing")).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disk_cache_survives_restart() {
        let dir = tempdir().unwrap();
        let disk = PlaceCache::new(PlaceCacheConfig::in_data_dir(dir.path()));

        let (provider, calls) = counting();
        let cached = CachedPlaceProvider::new(provider, &CacheConfig::default(), Some(disk.clone()));
        cached.place_details(&pid("louvre")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Fresh in-memory cache, same disk
        let (provider, calls) = counting();
        let cached = CachedPlaceProvider::new(provider, &CacheConfig::default(), Some(disk));
        let place = cached.place_details(&pid("louvre")).await.unwrap();
        assert_eq!(place.name(), "Louvre");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disk_entry_keeps_its_age_in_memory() {
        let dir = tempdir().unwrap();
        let disk = PlaceCache::new(
            PlaceCacheConfig::in_data_dir(dir.path()).with_ttl(Duration::from_secs(2)),
        );
        let louvre = Place::new(pid("louvre"), "Louvre", LatLng::new(48.8606, 2.3376).unwrap());
        disk.save(&louvre).unwrap();

        let (provider, calls) = counting();
        let cached = CachedPlaceProvider::new(provider, &CacheConfig::default(), Some(disk));
        cached.place_details(&pid("louvre")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Past the disk lifetime, well inside the memory TTL
        tokio::time::sleep(Duration::from_millis(2100)).await;
        cached.place_details(&pid("louvre")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
