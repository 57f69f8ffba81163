//! Stored provider API key.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{StoreError, remove_file, write_json};

/// A provider API key. Never printed in full.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKey(String);

impl ApiKey {
    /// Trim surrounding whitespace and reject empty keys.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreError::EmptyApiKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKey {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ApiKey> for String {
    fn from(key: ApiKey) -> Self {
        key.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Credentials {
    google_maps_api_key: ApiKey,
}

/// Disk store for the provider API key.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `credentials.json` in a data directory.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("credentials.json"))
    }

    /// Persist a key, replacing any stored one.
    pub fn save(&self, key: &ApiKey) -> Result<(), StoreError> {
        write_json(
            &self.path,
            &Credentials {
                google_maps_api_key: key.clone(),
            },
        )
    }

    /// The stored key, if any.
    pub fn load(&self) -> Result<Option<ApiKey>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io("read", &self.path, e)),
        };
        let credentials: Credentials =
            serde_json::from_str(&contents).map_err(|e| StoreError::serde(&self.path, e))?;
        Ok(Some(credentials.google_maps_api_key))
    }

    /// Remove the stored key. Clearing when nothing is stored is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        remove_file(&self.path)
    }

    pub fn has_key(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }
}
