//! Configuration management for session-gate.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::session::SigningKey;
use crate::users::UserSeed;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Session token and lifetime settings.
    pub session: SessionSection,
    /// Session store backend.
    pub store: StoreSection,
    /// Logging configuration.
    pub logging: LoggingSection,
    /// Users loaded into the in-memory user store.
    pub users: Vec<UserSeed>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

/// Session configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Key used to sign session tokens. Required.
    pub signing_key: SigningKey,
    /// Seconds an unused session stays alive.
    pub duration_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            signing_key: SigningKey::default(),
            duration_secs: 3600,
        }
    }
}

impl SessionSection {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

/// Which session store to run with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

/// Session store configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Store backend.
    pub backend: StoreBackend,
    /// Redis connection URL.
    pub redis_url: String,
    /// Deadline for a single store command in milliseconds.
    pub op_timeout_ms: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            op_timeout_ms: 2000,
        }
    }
}

impl StoreSection {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or filter directives.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Unparseable numeric or backend values are ignored.
    pub fn apply_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("SESSION_GATE_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("SESSION_GATE_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(key) = var("SESSION_GATE_SIGNING_KEY") {
            if !key.is_empty() {
                self.session.signing_key = SigningKey::new(key);
            }
        }

        if let Some(secs) = var("SESSION_GATE_SESSION_SECS").and_then(|s| s.parse().ok()) {
            self.session.duration_secs = secs;
        }

        if let Some(url) = var("SESSION_GATE_REDIS_URL") {
            self.store.redis_url = url;
        }

        if let Some(backend) = var("SESSION_GATE_STORE").and_then(|b| b.parse().ok()) {
            self.store.backend = backend;
        }

        if let Some(level) = var("SESSION_GATE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref key) = args.signing_key {
            self.session.signing_key = SigningKey::new(key.clone());
        }

        if let Some(secs) = args.session_secs {
            self.session.duration_secs = secs;
        }

        if let Some(ref url) = args.redis_url {
            self.store.redis_url = url.clone();
            self.store.backend = StoreBackend::Redis;
        }

        if args.memory_store {
            self.store.backend = StoreBackend::Memory;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Config::default();

        // Load from config file if specified
        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        // Apply environment variable overrides
        config.apply_env();

        // Apply CLI argument overrides (highest priority)
        config.apply_args(args);

        config.validate()?;
        Ok(config)
    }

    /// Check settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.signing_key.is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }
        if self.session.duration_secs == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        if self.store.op_timeout_ms == 0 {
            return Err(ConfigError::InvalidOpTimeout);
        }
        Ok(())
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }

        Ok(server_config)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid host address.
    #[error("invalid host address: {0}")]
    InvalidHost(String),

    /// Unknown session store backend.
    #[error("unknown session store backend: {0} (expected redis or memory)")]
    InvalidBackend(String),

    /// No signing key was configured.
    #[error("a session signing key is required (--signing-key or SESSION_GATE_SIGNING_KEY)")]
    MissingSigningKey,

    /// Session duration of zero.
    #[error("session duration must be at least one second")]
    InvalidDuration,

    /// Store command timeout of zero.
    #[error("store op_timeout_ms must be at least one millisecond")]
    InvalidOpTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.session.signing_key.is_empty());
        assert_eq!(config.session.duration(), Duration::from_secs(3600));
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_default_config_requires_key() {
        assert!(matches!(
            Config::default().validate(),
            Err(ConfigError::MissingSigningKey)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "server": {
                "host": "0.0.0.0",
                "port": 8080
            },
            "session": {
                "signing_key": "file-key",
                "duration_secs": 600
            },
            "store": {
                "backend": "memory"
            },
            "users": [
                {"id": 7, "email": "ada@example.com", "pass_hash": "$argon2id$x", "user_name": "ada"}
            ]
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.signing_key, SigningKey::new("file-key"));
        assert_eq!(config.session.duration_secs, 600);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.redis_url, "redis://127.0.0.1:6379"); // Default
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].id, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{
            "server": {
                "port": 9000
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1"); // Default
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_config_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_apply_vars() {
        let mut config = Config::default();
        config.apply_vars(vars(&[
            ("SESSION_GATE_HOST", "10.0.0.1"),
            ("SESSION_GATE_PORT", "4443"),
            ("SESSION_GATE_SIGNING_KEY", "env-key"),
            ("SESSION_GATE_SESSION_SECS", "120"),
            ("SESSION_GATE_REDIS_URL", "redis://cache:6379"),
            ("SESSION_GATE_STORE", "memory"),
            ("RUST_LOG", "warn"),
        ]));

        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4443);
        assert_eq!(config.session.signing_key, SigningKey::new("env-key"));
        assert_eq!(config.session.duration_secs, 120);
        assert_eq!(config.store.redis_url, "redis://cache:6379");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_apply_vars_ignores_bad_values() {
        let mut config = Config::default();
        config.apply_vars(vars(&[
            ("SESSION_GATE_PORT", "not-a-port"),
            ("SESSION_GATE_STORE", "etcd"),
            ("SESSION_GATE_SIGNING_KEY", ""),
        ]));

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert!(config.session.signing_key.is_empty());
    }

    #[test]
    fn test_log_level_precedence() {
        let mut config = Config::default();
        config.apply_vars(vars(&[
            ("SESSION_GATE_LOG_LEVEL", "debug"),
            ("RUST_LOG", "warn"),
        ]));
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            host: Some("192.168.1.1".parse().unwrap()),
            port: Some(5000),
            signing_key: Some("cli-key".to_string()),
            memory_store: true,
            session_secs: Some(90),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.session.signing_key, SigningKey::new("cli-key"));
        assert_eq!(config.session.duration_secs, 90);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_apply_args_keeps_unset_values() {
        let mut config = Config::default();
        config.server.port = 9999;

        config.apply_args(&Args::default());
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut config = Config::default();
        config.session.signing_key = SigningKey::new("k");
        config.session.duration_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDuration)));
    }

    #[test]
    fn test_zero_op_timeout_rejected() {
        let mut config = Config::default();
        config.session.signing_key = SigningKey::new("k");
        config.store.op_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOpTimeout)
        ));

        config.store.op_timeout_ms = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_server_config() {
        let config = Config::default();
        let server_config = config.to_server_config().unwrap();

        assert_eq!(server_config.host, "127.0.0.1");
        assert_eq!(server_config.port, 3000);
        assert!(server_config.graceful_shutdown);
    }

    #[test]
    fn test_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();

        let result = config.to_server_config();
        assert!(matches!(result, Err(ConfigError::InvalidHost(_))));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Redis".parse::<StoreBackend>().unwrap(), StoreBackend::Redis);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("etcd".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_debug_output_hides_signing_key() {
        let mut config = Config::default();
        config.session.signing_key = SigningKey::new("super-secret-value");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-value"));
    }
}
