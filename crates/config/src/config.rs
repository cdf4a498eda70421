//! Centralized configuration for cohortgate
//!
//! `Config` is immutable after [`ConfigLoader::load`](crate::ConfigLoader::load)
//! and is shared behind an `Arc` by every component.

use cohortgate_core::{
    Error, Result, AUTH_COOKIE_NAME, CSRF_COOKIE_NAME, CSRF_HEADER_NAME, DEFAULT_MAX_BODY_BYTES,
    MIN_JWT_SECRET_BYTES,
};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub rate_limit: RateLimitSettings,
    pub audit: AuditSettings,
    pub csrf: CsrfSettings,
    pub sessions: SessionSettings,
}

/// Deployment environment; production turns on HSTS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: SocketAddr,
    pub environment: Environment,
    /// Value of `Access-Control-Allow-Origin`
    pub allowed_origins: String,
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            environment: Environment::Development,
            allowed_origins: "*".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// HMAC secret for credential verification; never printed
#[derive(Clone)]
pub struct JwtSecret(Zeroizing<String>);

impl Default for JwtSecret {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret(***)")
    }
}

impl<'de> Deserialize<'de> for JwtSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(JwtSecret::new)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: JwtSecret,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    /// Clock skew tolerated on `exp`
    pub leeway_secs: u64,
    pub cookie_name: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::default(),
            issuer: None,
            audience: Vec::new(),
            leeway_secs: 0,
            cookie_name: AUTH_COOKIE_NAME.to_string(),
        }
    }
}

/// One fixed-window budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowSettings {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl WindowSettings {
    pub const fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// What to do with requests whose client address cannot be determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnidentifiedClientPolicy {
    /// Count them all against one loopback-keyed bucket
    #[default]
    SharedBucket,
    /// Refuse them before the limiter runs
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub global: WindowSettings,
    pub auth: WindowSettings,
    pub api: WindowSettings,
    pub unidentified_clients: UnidentifiedClientPolicy,
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            global: WindowSettings::new(100, 60_000),
            auth: WindowSettings::new(5, 60_000),
            api: WindowSettings::new(50, 60_000),
            unidentified_clients: UnidentifiedClientPolicy::default(),
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    pub enabled: bool,
    /// Entries buffered for the background writer before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsrfSettings {
    pub enabled: bool,
    pub cookie_name: String,
    pub header_name: String,
    pub excluded_paths: Vec<String>,
}

impl Default for CsrfSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            cookie_name: CSRF_COOKIE_NAME.to_string(),
            header_name: CSRF_HEADER_NAME.to_string(),
            excluded_paths: vec!["/health".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub purge_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            purge_interval_secs: 15 * 60,
        }
    }
}

impl Config {
    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(Error::configuration(format!(
                "jwt secret must be at least {MIN_JWT_SECRET_BYTES} bytes"
            )));
        }
        if self.auth.cookie_name.trim().is_empty() {
            return Err(Error::configuration("auth cookie name must not be empty"));
        }

        for (class, window) in [
            ("global", self.rate_limit.global),
            ("auth", self.rate_limit.auth),
            ("api", self.rate_limit.api),
        ] {
            if window.max_requests == 0 || window.window_ms == 0 {
                return Err(Error::configuration(format!(
                    "rate limit '{class}' needs a non-zero budget and window"
                )));
            }
        }

        if self.server.max_body_bytes == 0 {
            return Err(Error::configuration("max body size must be non-zero"));
        }
        if self.audit.enabled && self.audit.queue_capacity == 0 {
            return Err(Error::configuration("audit queue capacity must be non-zero"));
        }
        if self.csrf.enabled && self.csrf.header_name.trim().is_empty() {
            return Err(Error::configuration("csrf header name must not be empty"));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }
}
