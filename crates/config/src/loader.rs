//! Configuration loader for cohortgate
//!
//! Loading happens once at startup: an optional JSON file provides the base,
//! `COHORTGATE_*` variables override individual settings, then the result is
//! validated.

use crate::config::{Config, Environment, JwtSecret, UnidentifiedClientPolicy, WindowSettings};
use cohortgate_core::{Error, Result, ENV_PREFIX};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Unprefixed fallback for the signing secret
const LEGACY_SECRET_VAR: &str = "JWT_SECRET";

/// Configuration loader that handles all startup configuration
pub struct ConfigLoader {
    /// Optional JSON file providing the base configuration
    file: Option<PathBuf>,
    /// Variables to read overrides from; the process environment when `None`
    vars: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            file: None,
            vars: None,
        }
    }

    /// Read base settings from a JSON file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Take overrides from `vars` instead of the process environment
    pub fn vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = Some(vars);
        self
    }

    /// Load, override and validate the configuration
    pub fn load(self) -> Result<Config> {
        let mut config = match &self.file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::configuration(format!(
                        "failed to read config file '{}': {e}",
                        path.display()
                    ))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    Error::configuration(format!(
                        "failed to parse config file '{}': {e}",
                        path.display()
                    ))
                })?
            }
            None => Config::default(),
        };

        let vars = self.vars.unwrap_or_else(|| std::env::vars().collect());
        apply_overrides(&mut config, &vars)?;
        config.validate()?;

        tracing::debug!(
            bind_address = %config.server.bind_address,
            environment = ?config.server.environment,
            "configuration loaded"
        );
        Ok(config)
    }
}

fn apply_overrides(config: &mut Config, vars: &HashMap<String, String>) -> Result<()> {
    let get = |name: &str| vars.get(&format!("{ENV_PREFIX}{name}")).map(String::as_str);

    if let Some(v) = get("BIND_ADDRESS") {
        config.server.bind_address = parse("BIND_ADDRESS", v)?;
    }
    if let Some(v) = get("ENVIRONMENT") {
        config.server.environment = match v.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" => Environment::Development,
            other => {
                return Err(Error::configuration(format!(
                    "{ENV_PREFIX}ENVIRONMENT: unknown environment '{other}'"
                )))
            }
        };
    }
    if let Some(v) = get("ALLOWED_ORIGINS") {
        config.server.allowed_origins = v.to_string();
    }
    if let Some(v) = get("MAX_BODY_BYTES") {
        config.server.max_body_bytes = parse("MAX_BODY_BYTES", v)?;
    }

    if let Some(v) = get("JWT_SECRET").or_else(|| vars.get(LEGACY_SECRET_VAR).map(String::as_str))
    {
        config.auth.jwt_secret = JwtSecret::new(v);
    }
    if let Some(v) = get("JWT_ISSUER") {
        config.auth.issuer = Some(v.to_string());
    }
    if let Some(v) = get("JWT_AUDIENCE") {
        config.auth.audience = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(v) = get("JWT_LEEWAY_SECS") {
        config.auth.leeway_secs = parse("JWT_LEEWAY_SECS", v)?;
    }
    if let Some(v) = get("AUTH_COOKIE") {
        config.auth.cookie_name = v.to_string();
    }

    if let Some(v) = get("RATE_LIMIT_GLOBAL") {
        config.rate_limit.global = parse_window("RATE_LIMIT_GLOBAL", v)?;
    }
    if let Some(v) = get("RATE_LIMIT_AUTH") {
        config.rate_limit.auth = parse_window("RATE_LIMIT_AUTH", v)?;
    }
    if let Some(v) = get("RATE_LIMIT_API") {
        config.rate_limit.api = parse_window("RATE_LIMIT_API", v)?;
    }
    if let Some(v) = get("UNIDENTIFIED_CLIENTS") {
        config.rate_limit.unidentified_clients = match v.to_lowercase().as_str() {
            "shared_bucket" | "shared" => UnidentifiedClientPolicy::SharedBucket,
            "reject" => UnidentifiedClientPolicy::Reject,
            other => {
                return Err(Error::configuration(format!(
                    "{ENV_PREFIX}UNIDENTIFIED_CLIENTS: unknown policy '{other}'"
                )))
            }
        };
    }

    if let Some(v) = get("AUDIT_ENABLED") {
        config.audit.enabled = parse_bool("AUDIT_ENABLED", v)?;
    }
    if let Some(v) = get("AUDIT_QUEUE_CAPACITY") {
        config.audit.queue_capacity = parse("AUDIT_QUEUE_CAPACITY", v)?;
    }
    if let Some(v) = get("CSRF_ENABLED") {
        config.csrf.enabled = parse_bool("CSRF_ENABLED", v)?;
    }
    if let Some(v) = get("SESSION_PURGE_INTERVAL_SECS") {
        config.sessions.purge_interval_secs = parse("SESSION_PURGE_INTERVAL_SECS", v)?;
    }

    Ok(())
}

fn parse<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        Error::configuration(format!("{ENV_PREFIX}{name}: invalid value '{value}': {e}"))
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::configuration(format!(
            "{ENV_PREFIX}{name}: expected a boolean, got '{value}'"
        ))),
    }
}

/// `"<max_requests>/<window_ms>"`, e.g. `5/60000`
fn parse_window(name: &str, value: &str) -> Result<WindowSettings> {
    let (max, window) = value.split_once('/').ok_or_else(|| {
        Error::configuration(format!(
            "{ENV_PREFIX}{name}: expected '<max_requests>/<window_ms>', got '{value}'"
        ))
    })?;
    Ok(WindowSettings::new(parse(name, max)?, parse(name, window)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .vars(vars(&[
                ("COHORTGATE_JWT_SECRET", SECRET),
                ("COHORTGATE_ENVIRONMENT", "production"),
                ("COHORTGATE_RATE_LIMIT_AUTH", "10/30000"),
                ("COHORTGATE_JWT_AUDIENCE", "portal, admin ,"),
                ("COHORTGATE_UNIDENTIFIED_CLIENTS", "reject"),
                ("COHORTGATE_CSRF_ENABLED", "yes"),
            ]))
            .load()
            .unwrap();

        assert!(config.is_production());
        assert_eq!(config.rate_limit.auth, WindowSettings::new(10, 30_000));
        assert_eq!(config.auth.audience, vec!["portal", "admin"]);
        assert_eq!(
            config.rate_limit.unidentified_clients,
            UnidentifiedClientPolicy::Reject
        );
        assert!(config.csrf.enabled);
        assert_eq!(config.auth.jwt_secret.expose(), SECRET.as_bytes());
    }

    #[test]
    fn test_missing_secret_fails_validation() {
        let err = ConfigLoader::new().vars(HashMap::new()).load().unwrap_err();
        assert!(err.to_string().contains("jwt secret"));
    }

    #[test]
    fn test_legacy_secret_variable() {
        let config = ConfigLoader::new()
            .vars(vars(&[("JWT_SECRET", SECRET)]))
            .load()
            .unwrap();
        assert_eq!(config.auth.jwt_secret.len(), 32);
    }

    #[test]
    fn test_malformed_window() {
        let err = ConfigLoader::new()
            .vars(vars(&[
                ("COHORTGATE_JWT_SECRET", SECRET),
                ("COHORTGATE_RATE_LIMIT_API", "fifty"),
            ]))
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_API"));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"auth": {{"jwt_secret": "{SECRET}", "leeway_secs": 5}}, "server": {{"bind_address": "0.0.0.0:8080"}}}}"#
        )
        .unwrap();

        let config = ConfigLoader::new()
            .file(file.path())
            .vars(vars(&[("COHORTGATE_JWT_LEEWAY_SECS", "2")]))
            .load()
            .unwrap();

        assert_eq!(config.server.bind_address.port(), 8080);
        assert_eq!(config.auth.leeway_secs, 2);
    }

    #[test]
    fn test_unreadable_file() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here.json")
            .vars(HashMap::new())
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    #[serial]
    fn test_process_environment() {
        std::env::set_var("COHORTGATE_JWT_SECRET", SECRET);
        std::env::set_var("COHORTGATE_MAX_BODY_BYTES", "2048");
        let config = ConfigLoader::new().load();
        std::env::remove_var("COHORTGATE_JWT_SECRET");
        std::env::remove_var("COHORTGATE_MAX_BODY_BYTES");

        assert_eq!(config.unwrap().server.max_body_bytes, 2048);
    }
}
