//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the console
//! client. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable that overrides [`ApiConfig::base_url`] at start-up.
pub const BASE_URL_ENV: &str = "SELLER_API_BASE_URL";

/// Root configuration for the seller console client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend location and fixed auth endpoints.
    pub api: ApiConfig,

    /// Session handling (login route, poller).
    pub session: SessionConfig,

    /// Refresh-and-retry behaviour.
    pub recovery: RecoveryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ClientConfig {
    /// Replace values with those found in the process environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                tracing::debug!(env = BASE_URL_ENV, "Base URL taken from environment");
                self.api.base_url = base_url;
            }
        }
    }
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL all relative paths are resolved against.
    pub base_url: String,

    /// Session refresh endpoint (POST, empty body).
    pub refresh_path: String,

    /// Login endpoint; never subject to refresh-and-retry.
    pub login_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            refresh_path: "/api/v1/auth/refresh".to_string(),
            login_path: "/api/v1/auth/login".to_string(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Route of the hosted login page, announced when a session expires.
    pub login_route: String,

    /// Origin of the hosted application. Falls back to the API base URL.
    pub app_origin: Option<String>,

    /// Keep-alive poller settings.
    pub poller: PollerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_route: "/login".to_string(),
            app_origin: None,
            poller: PollerConfig::default(),
        }
    }
}

/// Session keep-alive poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Start the poller alongside the client.
    pub enabled: bool,

    /// Refresh interval in seconds.
    pub interval_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 600,
        }
    }
}

/// Which retry failures end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutPolicy {
    /// Any failure of the retried request forces a logout.
    AnyFailure,
    /// Only 401/403 or transport failures of the retry force a logout.
    AuthFailure,
}

/// Refresh-and-retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Run the refresh-and-retry sequence on 401 responses.
    pub enabled: bool,

    /// Share one in-flight refresh between concurrent 401 handlers.
    pub single_flight: bool,

    /// Which retry failures force a logout.
    pub logout_on_retry: LogoutPolicy,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            single_flight: false,
            logout_on_retry: LogoutPolicy::AnyFailure,
        }
    }
}

/// Timeout configuration. Unset values inherit the transport defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Use the compact single-line log format.
    pub compact_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            compact_logs: false,
        }
    }
}
