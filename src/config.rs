//! Service configuration loaded from environment variables.

use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;

use crate::error::{Result, ServiceError};

/// Prefix shared by every environment variable the service reads.
pub const ENV_PREFIX: &str = "AI_SERVICE_";

/// Wildcard entry accepted by the CORS method and header lists.
pub const WILDCARD: &str = "*";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    // === Server ===
    /// Interface the HTTP listener binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP listener port.
    #[serde(default = "default_port")]
    pub port: u16,

    // === Cross-Origin Policy ===
    /// Origins allowed to read responses (exact match).
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Whether cookies and auth headers may accompany cross-origin requests.
    #[serde(default = "default_true")]
    pub cors_allow_credentials: bool,

    /// Allowed methods, or `*` for all.
    #[serde(default = "default_wildcard")]
    pub cors_methods: Vec<String>,

    /// Allowed request headers, or `*` for all.
    #[serde(default = "default_wildcard")]
    pub cors_headers: Vec<String>,

    // === Optional Surfaces ===
    /// Serve `/openapi.json` and the Swagger UI at `/docs`.
    #[serde(default)]
    pub enable_docs: bool,

    /// Serve Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub expose_metrics: bool,

    // === Logging ===
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_wildcard() -> Vec<String> {
    vec![WILDCARD.to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            cors_allow_credentials: default_true(),
            cors_methods: default_wildcard(),
            cors_headers: default_wildcard(),
            enable_docs: false,
            expose_metrics: false,
            log_json: false,
        }
    }
}

impl Settings {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> std::result::Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed(ENV_PREFIX).from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.port == 0 {
            return Err("AI_SERVICE_PORT must be non-zero".to_string());
        }

        if self.host.parse::<IpAddr>().is_err() {
            return Err(format!(
                "AI_SERVICE_HOST must be an IP address, got {:?}",
                self.host
            ));
        }

        if self.cors_origins.is_empty() {
            return Err("AI_SERVICE_CORS_ORIGINS must list at least one origin".to_string());
        }

        if self.cors_origins.iter().any(|o| o.trim().is_empty()) {
            return Err("AI_SERVICE_CORS_ORIGINS contains a blank origin".to_string());
        }

        Ok(())
    }

    /// Address the listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ServiceError::InvalidConfig(format!("invalid host {:?}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Read-only source of [`Settings`], consulted once at initialization.
pub trait ConfigSource {
    /// Produce validated settings.
    fn load(&self) -> Result<Settings>;
}

/// Settings from the process environment (and `.env`, when present).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn load(&self) -> Result<Settings> {
        let settings = Settings::load()?;
        settings.validate().map_err(ServiceError::InvalidConfig)?;
        Ok(settings)
    }
}

/// Compiled-in defaults; no environment lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfig;

impl ConfigSource for DefaultConfig {
    fn load(&self) -> Result<Settings> {
        Ok(Settings::default())
    }
}
