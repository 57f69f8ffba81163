//! Disk cache for place details.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::domain::{Place, PlaceId};

use super::{StoreError, write_json};

/// Default cache TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached place data with metadata.
#[derive(Debug, Serialize, Deserialize)]
struct CachedPlace {
    /// Unix timestamp when the entry was written.
    cached_at_secs: u64,
    place: Place,
}

/// Configuration for the place disk cache.
#[derive(Debug, Clone)]
pub struct PlaceCacheConfig {
    /// Directory holding one file per place.
    pub dir: PathBuf,
    /// How long an entry remains valid.
    pub ttl: Duration,
}

impl PlaceCacheConfig {
    /// Create a new cache config with the given directory and default TTL (24 hours).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// The `places` subdirectory of a data directory.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("places"))
    }

    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Disk cache for place details.
#[derive(Debug, Clone)]
pub struct PlaceCache {
    config: PlaceCacheConfig,
}

fn unix_now() -> Option<u64> {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

impl PlaceCache {
    pub fn new(config: PlaceCacheConfig) -> Self {
        Self { config }
    }

    fn path_for(&self, id: &PlaceId) -> PathBuf {
        self.config.dir.join(format!("{id}.json"))
    }

    /// Load a place from the cache, along with how long it stays valid.
    ///
    /// Returns `None` if the entry doesn't exist, is invalid, or has expired.
    pub fn load(&self, id: &PlaceId) -> Option<(Place, Duration)> {
        let contents = std::fs::read_to_string(self.path_for(id)).ok()?;
        let cached: CachedPlace = serde_json::from_str(&contents).ok()?;

        let expires_at = SystemTime::UNIX_EPOCH
            .checked_add(Duration::from_secs(cached.cached_at_secs))?
            .checked_add(self.config.ttl)?;
        let remaining = expires_at.duration_since(SystemTime::now()).ok()?;
        if remaining.is_zero() {
            return None;
        }

        Some((cached.place, remaining))
    }

    /// Save a place to the cache.
    pub fn save(&self, place: &Place) -> Result<(), StoreError> {
        let cached = CachedPlace {
            cached_at_secs: unix_now().ok_or(StoreError::Clock)?,
            place: place.clone(),
        };
        write_json(&self.path_for(&place.id), &cached)
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }
}
