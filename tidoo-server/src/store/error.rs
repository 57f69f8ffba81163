//! Persistent store error types.

use std::path::PathBuf;

/// Errors from reading or writing the on-disk store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored record could not be (de)serialized
    #[error("invalid record {}: {source}", path.display())]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An API key was empty after trimming
    #[error("API key must not be empty")]
    EmptyApiKey,

    /// System clock is before the Unix epoch
    #[error("system time before unix epoch")]
    Clock,
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serde(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Serde {
            path: path.into(),
            source,
        }
    }
}
