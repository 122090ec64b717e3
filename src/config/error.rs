//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Embed timeout string could not be parsed as whole seconds.
    #[error("failed to parse embed timeout '{value}': {source}")]
    TimeoutParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Embed timeout of zero seconds.
    #[error("invalid embed timeout '{value}': must be at least 1 second")]
    InvalidTimeout { value: String },

    /// URL without an http(s) scheme.
    #[error("invalid URL for {name}: '{value}' (expected http:// or https://)")]
    InvalidUrl { name: &'static str, value: String },

    /// A setting resolved to an empty string.
    #[error("{name} must not be empty")]
    EmptyValue { name: &'static str },
}
