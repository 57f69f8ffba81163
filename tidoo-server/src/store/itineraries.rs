//! Saved itineraries, one JSON file per itinerary.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::{Itinerary, ItineraryId};

use super::{StoreError, remove_file, write_json};

/// Disk store for itineraries.
#[derive(Debug, Clone)]
pub struct ItineraryStore {
    dir: PathBuf,
}

impl ItineraryStore {
    /// Store itineraries under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store itineraries in the `itineraries` subdirectory of a data directory.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("itineraries"))
    }

    fn path_for(&self, id: ItineraryId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write an itinerary, replacing any previous version with the same id.
    pub fn save(&self, itinerary: &Itinerary) -> Result<(), StoreError> {
        write_json(&self.path_for(itinerary.id()), itinerary)
    }

    /// Read an itinerary. Returns `None` if no itinerary has that id.
    pub fn get(&self, id: ItineraryId) -> Result<Option<Itinerary>, StoreError> {
        let path = self.path_for(id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io("read", path, e)),
        };
        let itinerary = serde_json::from_str(&contents).map_err(|e| StoreError::serde(&path, e))?;
        Ok(Some(itinerary))
    }

    /// All saved itineraries, most recently updated first.
    ///
    /// Files that cannot be read or parsed are skipped with a warning.
    pub fn list_all(&self) -> Result<Vec<Itinerary>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("list", &self.dir, e)),
        };

        let mut itineraries = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str::<Itinerary>(&c).map_err(|e| e.to_string()));
            match parsed {
                Ok(itinerary) => itineraries.push(itinerary),
                Err(error) => warn!(path = %path.display(), %error, "Skipping invalid itinerary file"),
            }
        }

        itineraries.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(itineraries)
    }

    /// Delete an itinerary. Deleting an unknown id is not an error.
    pub fn delete(&self, id: ItineraryId) -> Result<(), StoreError> {
        remove_file(&self.path_for(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Endpoint, LatLng, Place, PlaceId, RouteDuration, TravelMode};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::tempdir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn place(id: &str) -> Place {
        Place::new(PlaceId::parse(id).unwrap(), id, LatLng::new(48.85, 2.35).unwrap())
            .with_address("1 Rue Example")
            .with_rating(4.5)
    }

    fn sample(at: DateTime<Utc>) -> Itinerary {
        Itinerary::new(at)
            .add_stop(place("A"), at)
            .add_stop(place("B"), at)
            .with_travel_mode(TravelMode::Walk, at)
            .with_start(
                Some(Endpoint::current_location(LatLng::new(48.8, 2.3).unwrap())),
                at,
            )
            .with_route(Vec::new(), 2500, RouteDuration::new("1800s"), None, at)
            .renamed("Paris day", at)
    }

    #[test]
    fn save_and_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = ItineraryStore::in_data_dir(dir.path());
        let itinerary = sample(t0());

        store.save(&itinerary).unwrap();
        let loaded = store.get(itinerary.id()).unwrap().unwrap();

        assert_eq!(loaded, itinerary);
        assert!(loaded.route().is_some());
    }

    #[test]
    fn get_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = ItineraryStore::in_data_dir(dir.path());
        assert!(store.get(ItineraryId::new()).unwrap().is_none());
    }

    #[test]
    fn save_overwrites_by_id() {
        let dir = tempdir().unwrap();
        let store = ItineraryStore::in_data_dir(dir.path());
        let first = sample(t0());
        let second = first.renamed("Renamed", t0() + Duration::hours(1));

        store.save(&first).unwrap();
        store.save(&second).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name(), "Renamed");
    }

    #[test]
    fn list_sorted_newest_first() {
        let dir = tempdir().unwrap();
        let store = ItineraryStore::in_data_dir(dir.path());
        let old = sample(t0());
        let new = sample(t0() + Duration::days(1));
        let mid = sample(t0() + Duration::hours(3));

        for it in [&old, &new, &mid] {
            store.save(it).unwrap();
        }

        let ids: Vec<_> = store.list_all().unwrap().iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![new.id(), mid.id(), old.id()]);
    }

    #[test]
    fn list_skips_invalid_files() {
        let dir = tempdir().unwrap();
        let store = ItineraryStore::in_data_dir(dir.path());
        store.save(&sample(t0())).unwrap();

        let itineraries_dir = dir.path().join("itineraries");
        std::fs::write(itineraries_dir.join("broken.json"), "{not json").unwrap();
        std::fs::write(itineraries_dir.join("notes.txt"), "ignore me").unwrap();

        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn list_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let store = ItineraryStore::new(dir.path().join("nope"));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn delete_removes_and_tolerates_missing() {
        let dir = tempdir().unwrap();
        let store = ItineraryStore::in_data_dir(dir.path());
        let itinerary = sample(t0());
        store.save(&itinerary).unwrap();

        store.delete(itinerary.id()).unwrap();
        assert!(store.get(itinerary.id()).unwrap().is_none());
        store.delete(itinerary.id()).unwrap();
    }

    #[test]
    fn corrupt_record_is_an_error_on_get() {
        let dir = tempdir().unwrap();
        let store = ItineraryStore::in_data_dir(dir.path());
        let itinerary = sample(t0());
        store.save(&itinerary).unwrap();

        let path = dir
            .path()
            .join("itineraries")
            .join(format!("{}.json", itinerary.id()));
        std::fs::write(&path, "[]").unwrap();

        assert!(matches!(
            store.get(itinerary.id()),
            Err(StoreError::Serde { .. })
        ));
    }
}
