//! Configuration management.
//!
//! [`RedisSettings`] is the raw, all-optional form read from builders, TOML
//! files and the environment. [`RedisStoreConfig`] is the validated form a
//! store is built from; converting one into the other is the only place
//! configuration errors are raised.

use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "message_store:";

/// Idle connections kept by a store when none is configured.
pub const DEFAULT_MAX_IDLE: usize = 8;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CHAT_MEMORY_CONFIG_PATH";

const ENV_HOST: &str = "CHAT_MEMORY_REDIS_HOST";
const ENV_PORT: &str = "CHAT_MEMORY_REDIS_PORT";
const ENV_USER: &str = "CHAT_MEMORY_REDIS_USER";
const ENV_PASSWORD: &str = "CHAT_MEMORY_REDIS_PASSWORD";
const ENV_KEY_PREFIX: &str = "CHAT_MEMORY_REDIS_KEY_PREFIX";
const ENV_TTL: &str = "CHAT_MEMORY_REDIS_TTL";

/// Unvalidated Redis store settings.
///
/// Mirrors the `[redis]` section of the config file. Every field is optional
/// here; [`RedisStoreConfig::try_from`] enforces the required ones.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    /// Redis server host.
    pub host: Option<String>,
    /// Redis server port.
    pub port: Option<u16>,
    /// ACL username, only used together with `password`.
    pub user: Option<String>,
    /// Password; when present the connection authenticates.
    pub password: Option<String>,
    /// Prefix prepended to every conversation key.
    pub key_prefix: Option<String>,
    /// Key expiration in seconds.
    pub ttl: Option<i64>,
    /// Read/write timeout for each connection, in seconds.
    pub command_timeout_secs: Option<u64>,
    /// Maximum idle connections kept for reuse.
    pub max_idle: Option<usize>,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            user: None,
            password: None,
            key_prefix: Some(DEFAULT_KEY_PREFIX.to_string()),
            ttl: None,
            command_timeout_secs: None,
            max_idle: None,
        }
    }
}

impl fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("key_prefix", &self.key_prefix)
            .field("ttl", &self.ttl)
            .field("command_timeout_secs", &self.command_timeout_secs)
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

impl RedisSettings {
    /// Overrides fields from `CHAT_MEMORY_REDIS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a numeric variable does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = Some(host);
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = Some(parse_env(ENV_PORT, &port)?);
        }
        if let Some(user) = lookup(ENV_USER) {
            self.user = Some(user);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
            self.key_prefix = Some(prefix);
        }
        if let Some(ttl) = lookup(ENV_TTL) {
            self.ttl = Some(parse_env(ENV_TTL, &ttl)?);
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("{name}={value:?}: {e}")))
}

/// Validated, immutable Redis store configuration.
#[derive(Debug)]
pub struct RedisStoreConfig {
    /// Redis server host.
    pub host: String,
    /// Redis server port.
    pub port: u16,
    /// ACL username, only used together with `password`.
    pub user: Option<String>,
    /// Password; when present the connection authenticates.
    pub password: Option<SecretString>,
    /// Prefix prepended to every conversation key.
    pub key_prefix: String,
    /// Key expiration in seconds, always positive.
    pub ttl: Option<u64>,
    /// Read/write timeout for each connection.
    pub command_timeout: Option<Duration>,
    /// Maximum idle connections kept for reuse.
    pub max_idle: usize,
}

impl TryFrom<RedisSettings> for RedisStoreConfig {
    type Error = Error;

    fn try_from(settings: RedisSettings) -> Result<Self> {
        let host = settings
            .host
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("host cannot be null or blank".to_string()))?;
        let port = settings
            .port
            .ok_or_else(|| Error::InvalidConfig("port cannot be null".to_string()))?;
        let key_prefix = settings
            .key_prefix
            .ok_or_else(|| Error::InvalidConfig("keyPrefix cannot be null".to_string()))?;
        let ttl = settings.ttl.map(validate_ttl).transpose()?;

        Ok(Self {
            host,
            port,
            user: settings.user,
            password: settings.password.map(SecretString::from),
            key_prefix,
            ttl,
            command_timeout: settings.command_timeout_secs.map(Duration::from_secs),
            max_idle: settings.max_idle.unwrap_or(DEFAULT_MAX_IDLE),
        })
    }
}

fn validate_ttl(ttl: i64) -> Result<u64> {
    u64::try_from(ttl)
        .ok()
        .filter(|t| *t > 0)
        .ok_or_else(|| Error::InvalidConfig(format!("ttl must be greater than zero, but is: {ttl}")))
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Default level when `RUST_LOG` is unset.
    pub level: Option<String>,
    /// Log file path; stderr when absent.
    pub file: Option<String>,
}

/// Configuration for the `chat-memory` binary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Redis connection and store settings.
    pub redis: RedisSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;

        toml::from_str(&contents)
            .map_err(|e| Error::InvalidConfig(format!("cannot parse {}: {e}", path.display())))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `CHAT_MEMORY_CONFIG_PATH`, then the platform config dir
    /// (`chat-memory/config.toml`). Returns defaults when neither exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load_default() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Self::load_from_file(Path::new(&path));
            }
        }

        let Some(dirs) = directories::ProjectDirs::from("", "", "chat-memory") else {
            return Ok(Self::default());
        };
        let path = dirs.config_dir().join("config.toml");
        if path.exists() {
            return Self::load_from_file(&path);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use test_case::test_case;

    fn settings(host: Option<&str>, port: Option<u16>, ttl: Option<i64>) -> RedisSettings {
        RedisSettings {
            host: host.map(str::to_string),
            port,
            ttl,
            ..RedisSettings::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = RedisStoreConfig::try_from(settings(Some("localhost"), Some(6379), None))
            .unwrap();
        assert_eq!(config.key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(config.ttl, None);
        assert!(config.password.is_none());
        assert_eq!(config.max_idle, DEFAULT_MAX_IDLE);
        assert_eq!(config.command_timeout, None);
    }

    #[test_case(None, Some(6379), None, "host" ; "missing host")]
    #[test_case(Some(""), Some(6379), None, "host" ; "empty host")]
    #[test_case(Some("   "), Some(6379), None, "host" ; "blank host")]
    #[test_case(Some("localhost"), None, None, "port" ; "missing port")]
    #[test_case(Some("localhost"), Some(6379), Some(0), "ttl" ; "zero ttl")]
    #[test_case(Some("localhost"), Some(6379), Some(-5), "ttl" ; "negative ttl")]
    fn test_invalid_settings(host: Option<&str>, port: Option<u16>, ttl: Option<i64>, field: &str) {
        let err = RedisStoreConfig::try_from(settings(host, port, ttl)).unwrap_err();
        match err {
            Error::InvalidConfig(msg) => assert!(msg.contains(field), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_key_prefix_rejected() {
        let mut raw = settings(Some("localhost"), Some(6379), None);
        raw.key_prefix = None;
        let err = RedisStoreConfig::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("keyPrefix"));
    }

    #[test]
    fn test_empty_key_prefix_allowed() {
        let mut raw = settings(Some("localhost"), Some(6379), None);
        raw.key_prefix = Some(String::new());
        let config = RedisStoreConfig::try_from(raw).unwrap();
        assert_eq!(config.key_prefix, "");
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut raw = settings(Some("localhost"), Some(6379), None);
        raw.password = Some("hunter2".to_string());
        let debug = format!("{raw:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));

        let config = RedisStoreConfig::try_from(raw).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_HOST, "redis.internal"),
            (ENV_PORT, "6380"),
            (ENV_PASSWORD, "secret"),
            (ENV_TTL, "60"),
        ]
        .into_iter()
        .collect();

        let mut raw = RedisSettings::default();
        raw.apply_overrides(|name| env.get(name).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(raw.host.as_deref(), Some("redis.internal"));
        assert_eq!(raw.port, Some(6380));
        assert_eq!(raw.password.as_deref(), Some("secret"));
        assert_eq!(raw.ttl, Some(60));
        assert_eq!(raw.key_prefix.as_deref(), Some(DEFAULT_KEY_PREFIX));
    }

    #[test]
    fn test_env_override_rejects_bad_port() {
        let mut raw = RedisSettings::default();
        let err = raw
            .apply_overrides(|name| (name == ENV_PORT).then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_PORT));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[redis]
host = "localhost"
port = 6379
key_prefix = "chat:memories:"
ttl = 1000

[logging]
format = "json"
level = "debug"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.redis.host.as_deref(), Some("localhost"));
        assert_eq!(config.redis.key_prefix.as_deref(), Some("chat:memories:"));
        assert_eq!(config.redis.ttl, Some(1000));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_file_without_key_prefix_uses_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[redis]\nhost = \"localhost\"\nport = 6379").unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.redis.key_prefix.as_deref(), Some(DEFAULT_KEY_PREFIX));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = AppConfig::load_from_file(Path::new("/nonexistent/chat-memory.toml")).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
