//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Default data directory, relative to the working directory.
const DEFAULT_DATA_DIR: &str = ".tidoo";

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROVIDER_MAX_CONCURRENT: usize = 5;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration for the server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,

    /// Directory for saved itineraries, cached places and credentials.
    pub data_dir: PathBuf,

    /// API key from the environment; takes precedence over the stored key.
    pub api_key: Option<String>,

    /// Serve places from this JSON file instead of the live provider.
    pub mock_places: Option<PathBuf>,

    /// Provider request timeout in seconds.
    pub provider_timeout_secs: u64,

    /// Maximum concurrent provider requests.
    pub provider_max_concurrent: usize,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("mock_places", &self.mock_places)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("provider_max_concurrent", &self.provider_max_concurrent)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            api_key: None,
            mock_places: None,
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            provider_max_concurrent: DEFAULT_PROVIDER_MAX_CONCURRENT,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Unset and blank variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = parse(
            "TIDOO_BIND_ADDR",
            get("TIDOO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let provider_timeout_secs = match get("TIDOO_PROVIDER_TIMEOUT_SECS") {
            Some(v) => parse("TIDOO_PROVIDER_TIMEOUT_SECS", v)?,
            None => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };

        let provider_max_concurrent = match get("TIDOO_PROVIDER_MAX_CONCURRENT") {
            Some(v) => {
                let n: usize = parse("TIDOO_PROVIDER_MAX_CONCURRENT", v.clone())?;
                if n == 0 {
                    return Err(ConfigError::Invalid {
                        name: "TIDOO_PROVIDER_MAX_CONCURRENT",
                        value: v,
                        reason: "must be at least 1".to_string(),
                    });
                }
                n
            }
            None => DEFAULT_PROVIDER_MAX_CONCURRENT,
        };

        Ok(Self {
            bind_addr,
            data_dir: get("TIDOO_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            api_key: get("GOOGLE_MAPS_API_KEY"),
            mock_places: get("TIDOO_MOCK_PLACES").map(PathBuf::from),
            provider_timeout_secs,
            provider_max_concurrent,
        })
    }
}

fn parse<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}
