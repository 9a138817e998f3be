//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! The APM section is validated separately (see `validation.rs`) because an
//! unusable APM section must never stop the server from starting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Application name reported to the backend when none is configured.
pub const DEFAULT_APP_NAME: &str = "axum-api";

/// Root configuration for the demo server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and timeout settings.
    pub server: ServerConfig,

    /// APM instrumentation settings.
    pub apm: ApmConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// APM instrumentation settings.
///
/// Immutable once handed to [`crate::middleware::ApmLayer`].
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApmConfig {
    /// Backend credential (license key). Required; an empty value disables
    /// instrumentation.
    pub credential: String,

    /// Application name reported to the backend.
    pub app_name: String,

    /// Whether the backend should actually record telemetry.
    pub enabled: bool,

    /// Transport recorded in request metadata: `"HTTP"` or `"HTTPS"`
    /// (case-sensitive). Anything else falls back to `"HTTP"`.
    pub transport: String,

    /// Name transactions after the matched axum route template
    /// (`GET /users/{id}`) instead of the raw request path.
    pub route_names: bool,
}

impl Default for ApmConfig {
    fn default() -> Self {
        Self {
            credential: String::new(),
            app_name: DEFAULT_APP_NAME.to_string(),
            enabled: false,
            transport: TransportKind::default().as_str().to_string(),
            route_names: false,
        }
    }
}

impl ApmConfig {
    /// Create a config with the given credential and application name.
    pub fn new(credential: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_transport(mut self, transport: impl Into<String>) -> Self {
        self.transport = transport.into();
        self
    }

    pub fn with_route_names(mut self, route_names: bool) -> Self {
        self.route_names = route_names;
        self
    }

    /// Effective transport, falling back to the default for unrecognized values.
    pub fn transport_kind(&self) -> TransportKind {
        TransportKind::parse(&self.transport).unwrap_or_default()
    }
}

// The credential never shows up in logs.
impl fmt::Debug for ApmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApmConfig")
            .field("credential", &if self.credential.is_empty() { "" } else { "<redacted>" })
            .field("app_name", &self.app_name)
            .field("enabled", &self.enabled)
            .field("transport", &self.transport)
            .field("route_names", &self.route_names)
            .finish()
    }
}

/// Transport of the inbound request as recorded by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportKind {
    #[default]
    Http,
    Https,
}

impl TransportKind {
    /// Parse the exact literals `"HTTP"` and `"HTTPS"`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HTTP" => Some(TransportKind::Http),
            "HTTPS" => Some(TransportKind::Https),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Http => "HTTP",
            TransportKind::Https => "HTTPS",
        }
    }

    /// URL scheme used when reconstructing the request URL.
    pub fn scheme(&self) -> &'static str {
        match self {
            TransportKind::Http => "http",
            TransportKind::Https => "https",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Default log filter, overridden by `RUST_LOG`.
    pub log_filter: String,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_filter: "request_apm=debug,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
