//! Persistent store.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <data dir>/
//!   itineraries/<itinerary id>.json
//!   places/<place id>.json
//!   credentials.json
//! ```
//!
//! Directories are created on first write. Records are pretty-printed JSON
//! so they can be inspected and edited by hand.

mod credentials;
mod error;
mod itineraries;
mod place_cache;

use std::path::Path;

use serde::Serialize;

pub use credentials::{ApiKey, CredentialStore};
pub use error::StoreError;
pub use itineraries::ItineraryStore;
pub use place_cache::{PlaceCache, PlaceCacheConfig};

/// Serialize `value` to `path`, creating parent directories if needed.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::io("create directory", parent, e))?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::serde(path, e))?;
    std::fs::write(path, json).map_err(|e| StoreError::io("write", path, e))
}

/// Remove `path`, treating a missing file as success.
fn remove_file(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io("delete", path, e)),
    }
}
