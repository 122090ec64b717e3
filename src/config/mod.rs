//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `PLAYLENS_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use crate::constants::DEFAULT_EMBED_TIMEOUT_SECS;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `PLAYLENS_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `5002`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Collection holding the game catalog. Default: `games`.
    pub collection: String,

    /// Named vector used for similarity search. Default: `combined_embedding`.
    pub vector_name: String,

    /// Base URL of the embedding service (`POST {url}/embed`). Default: `http://localhost:5000`.
    pub embedder_url: String,

    /// Embedder round-trip deadline. Default: 10 seconds.
    pub embed_timeout: Duration,

    /// Use the deterministic in-process embedder instead of the HTTP service.
    pub stub_embedder: bool,
}

/// Default Qdrant URL used when `PLAYLENS_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
/// Default embedding service URL used when `PLAYLENS_EMBEDDER_URL` is not set.
pub const DEFAULT_EMBEDDER_URL: &str = "http://localhost:5000";
/// Default catalog collection.
pub const DEFAULT_COLLECTION: &str = "games";
/// Default named vector (the similarity index).
pub const DEFAULT_VECTOR_NAME: &str = "combined_embedding";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5002,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            vector_name: DEFAULT_VECTOR_NAME.to_string(),
            embedder_url: DEFAULT_EMBEDDER_URL.to_string(),
            embed_timeout: Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
            stub_embedder: false,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "PLAYLENS_PORT";
    const ENV_BIND_ADDR: &'static str = "PLAYLENS_BIND_ADDR";
    const ENV_QDRANT_URL: &'static str = "PLAYLENS_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "PLAYLENS_COLLECTION";
    const ENV_VECTOR_NAME: &'static str = "PLAYLENS_VECTOR_NAME";
    const ENV_EMBEDDER_URL: &'static str = "PLAYLENS_EMBEDDER_URL";
    const ENV_EMBED_TIMEOUT_SECS: &'static str = "PLAYLENS_EMBED_TIMEOUT_SECS";
    const ENV_STUB_EMBEDDER: &'static str = "PLAYLENS_STUB_EMBEDDER";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let collection = Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection);
        let vector_name = Self::parse_string_from_env(Self::ENV_VECTOR_NAME, defaults.vector_name);
        let embedder_url =
            Self::parse_string_from_env(Self::ENV_EMBEDDER_URL, defaults.embedder_url);
        let embed_timeout = Self::parse_timeout_from_env(defaults.embed_timeout)?;
        let stub_embedder = env::var_os(Self::ENV_STUB_EMBEDDER).is_some_and(|v| !v.is_empty());

        Ok(Self {
            port,
            bind_addr,
            qdrant_url,
            collection,
            vector_name,
            embedder_url,
            embed_timeout,
            stub_embedder,
        })
    }

    /// Validates basic invariants (does not contact any service).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                name: Self::ENV_COLLECTION,
            });
        }

        if self.vector_name.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                name: Self::ENV_VECTOR_NAME,
            });
        }

        for (name, url) in [
            (Self::ENV_QDRANT_URL, &self.qdrant_url),
            (Self::ENV_EMBEDDER_URL, &self.embedder_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl {
                    name,
                    value: url.clone(),
                });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_timeout_from_env(default: Duration) -> Result<Duration, ConfigError> {
        match env::var(Self::ENV_EMBED_TIMEOUT_SECS) {
            Ok(value) => {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::TimeoutParseError {
                        value: value.clone(),
                        source: e,
                    })?;

                if secs == 0 {
                    return Err(ConfigError::InvalidTimeout { value });
                }

                Ok(Duration::from_secs(secs))
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }
}
