//! Client configuration.
//!
//! Endpoint, credentials and transport settings for the operations API.
//! Configuration is loaded from environment variables with defaults for a
//! local development instance.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Missing required setting.
    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Connection settings for one HarperDB instance.
///
/// Neither `Debug` nor serialization ever emits the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Operations API endpoint (e.g., "https://db.example.com:9925").
    pub endpoint: String,

    /// Super-user name used for HTTP Basic authentication.
    pub username: Option<String>,

    /// Super-user password.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Whether to verify TLS certificates (disable only for testing).
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9925".to_string(),
            username: None,
            password: None,
            timeout_secs: 30,
            verify_tls: true,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration for an endpoint with no credentials.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set Basic authentication credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HARPERDB_ENDPOINT`: Operations API URL (default: http://localhost:9925)
    /// - `HARPERDB_USERNAME`: Super-user name
    /// - `HARPERDB_PASSWORD`: Super-user password
    /// - `HARPERDB_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `HARPERDB_VERIFY_TLS`: Whether to verify TLS (default: true)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            endpoint: std::env::var("HARPERDB_ENDPOINT").unwrap_or(default.endpoint),
            username: std::env::var("HARPERDB_USERNAME").ok(),
            password: std::env::var("HARPERDB_PASSWORD").ok(),
            timeout_secs: std::env::var("HARPERDB_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            verify_tls: std::env::var("HARPERDB_VERIFY_TLS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.verify_tls),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether Basic authentication credentials are configured.
    pub fn has_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Check the configuration before a client is built from it.
    ///
    /// The endpoint must be an http(s) URL, and username and password must be
    /// supplied together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingSetting("HARPERDB_ENDPOINT".to_string()));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "endpoint".to_string(),
                message: format!("expected an http(s) URL, got '{}'", endpoint),
            });
        }
        match (&self.username, &self.password) {
            (Some(_), None) => Err(ConfigError::MissingSetting("HARPERDB_PASSWORD".to_string())),
            (None, Some(_)) => Err(ConfigError::MissingSetting("HARPERDB_USERNAME".to_string())),
            _ => Ok(()),
        }
    }
}
