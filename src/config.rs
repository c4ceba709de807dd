//! Core configuration.
//!
//! API endpoint, network timeouts, and attribute naming, loaded from
//! environment variables with sensible fallbacks.

use std::env;
use std::time::Duration;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of retries for idempotent reads.
const DEFAULT_READ_RETRIES: u32 = 2;

/// Name of the identity attribute holding the comma-joined followed-club ids.
const DEFAULT_CLUBS_ATTRIBUTE: &str = "custom:clubs";

/// Configuration for the clubs core.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the clubs backend API.
    pub api_base_url: String,
    /// Per-request network timeout.
    pub request_timeout: Duration,
    /// Fixed retry count for idempotent reads (directory fetch, attribute
    /// get). Writes are never retried: the members-count read-modify-write
    /// could double-apply.
    pub read_retries: u32,
    /// Name of the identity attribute that stores the followed-club roster.
    pub clubs_attribute: String,
    /// Directory for persisting the session. None = in-memory only.
    /// Consumed by `SessionStore::from_config`.
    pub data_dir: Option<String>,
}

impl CoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let api_base_url =
            env::var("CLUBS_API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let request_timeout = env::var("CLUBS_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let read_retries = env::var("CLUBS_READ_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_READ_RETRIES);

        let clubs_attribute = env::var("CLUBS_ATTRIBUTE_NAME")
            .unwrap_or_else(|_| DEFAULT_CLUBS_ATTRIBUTE.to_string());

        Self {
            api_base_url,
            request_timeout,
            read_retries,
            clubs_attribute,
            data_dir: env::var("CLUBS_DATA_DIR").ok(),
        }
    }

    /// Base URL with any trailing slash removed, for joining paths.
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            read_retries: DEFAULT_READ_RETRIES,
            clubs_attribute: DEFAULT_CLUBS_ATTRIBUTE.to_string(),
            data_dir: None,
        }
    }
}
