use std::env;
use std::time::Duration;

use openback::constants::DEFAULT_UPSTREAM_TIMEOUT_SECS;
use openback::ClientCredentials;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;

#[derive(Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute, per client IP
    pub rate_limit_rpm: u32,
    /// Bearer token required for /metrics endpoint (None = public)
    pub metrics_token: Option<String>,
    /// Timeout applied to every Open Payments request
    pub upstream_timeout: Duration,
    /// Talk plain HTTP to Open Payments servers (local test networks)
    pub use_http: bool,
    /// Identity this service presents to authorization servers
    pub credentials: ClientCredentials,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("upstream_timeout", &self.upstream_timeout)
            .field("use_http", &self.use_http)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let credentials = ClientCredentials::from_lookup(&lookup)?;

        let port = match var("PORT") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                reason: format!("{s:?} is not a port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let allowed_origins: Vec<String> = var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let rate_limit_rpm = match var("RATE_LIMIT_RPM") {
            Some(s) => s
                .trim()
                .parse()
                .ok()
                .filter(|n: &u32| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    var: "RATE_LIMIT_RPM",
                    reason: format!("{s:?} is not a positive integer"),
                })?,
            None => DEFAULT_RATE_LIMIT_RPM,
        };

        let upstream_timeout_secs = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(s) => s
                .trim()
                .parse()
                .ok()
                .filter(|n: &u64| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    var: "UPSTREAM_TIMEOUT_SECS",
                    reason: format!("{s:?} is not a positive integer"),
                })?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        let use_http = var("OPEN_PAYMENTS_USE_HTTP")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let metrics_token = var("METRICS_TOKEN");
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set, /metrics endpoint is publicly accessible");
        }
        if allowed_origins.iter().any(|o| o == "*") {
            tracing::warn!("wildcard CORS origin configured, any site may call this API");
        }

        Ok(Self {
            port,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            use_http,
            credentials,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Credentials(#[from] openback::ConfigError),

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}
