//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use tripwise_ai::AiConfig;
use tripwise_map::MapConfig;
use tripwise_voice::VoiceConfig;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Speech recognition vendor credentials.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// LLM vendor credentials.
    #[serde(default)]
    pub ai: AiConfig,

    /// Map vendor key.
    #[serde(default)]
    pub map: MapConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed by CORS, the address the frontend is served from.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tripwise_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Token signing and password hashing.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,

    /// Token lifetime such as `"7d"`, `"12h"` or a number of seconds.
    #[serde(default = "default_jwt_expires_in")]
    pub jwt_expires_in: String,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Accounts registered with one of these emails get the admin role.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

/// Fixed-window request limit applied per client IP.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_db_path() -> String {
    "tripwise.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_jwt_expires_in() -> String {
    "7d".to_string()
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_url: default_frontend_url(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expires_in: default_jwt_expires_in(),
            bcrypt_cost: default_bcrypt_cost(),
            admin_emails: Vec::new(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expires_in", &self.jwt_expires_in)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("admin_emails", &self.admin_emails)
            .finish()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `TRIPWISE_HOST`, `TRIPWISE_PORT` override `server.host` / `server.port`
/// - `FRONTEND_URL` overrides `server.frontend_url`
/// - `TRIPWISE_DB_PATH` overrides `database.path`
/// - `TRIPWISE_LOG_LEVEL`, `TRIPWISE_LOG_JSON` override `logging.*`
/// - `JWT_SECRET`, `JWT_EXPIRES_IN` override `auth.*`
/// - `IFLYTEK_APP_ID`, `IFLYTEK_API_KEY`, `IFLYTEK_API_SECRET` override `voice.*`
/// - `ALIYUN_BAILIAN_ACCESS_KEY_ID`, `ALIYUN_BAILIAN_ACCESS_KEY_SECRET`,
///   `ALIYUN_BAILIAN_ENDPOINT`, `ALIYUN_BAILIAN_MODEL` override `ai.*`
/// - `AMAP_API_KEY` overrides `map.api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(parsed) = var("TRIPWISE_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = var("TRIPWISE_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(url) = var("FRONTEND_URL") {
        config.server.frontend_url = url;
    }
    if let Some(path) = var("TRIPWISE_DB_PATH") {
        config.database.path = path;
    }
    if let Some(level) = var("TRIPWISE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("TRIPWISE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    let secrets: [(&str, &mut String); 10] = [
        ("JWT_SECRET", &mut config.auth.jwt_secret),
        ("JWT_EXPIRES_IN", &mut config.auth.jwt_expires_in),
        ("IFLYTEK_APP_ID", &mut config.voice.app_id),
        ("IFLYTEK_API_KEY", &mut config.voice.api_key),
        ("IFLYTEK_API_SECRET", &mut config.voice.api_secret),
        ("ALIYUN_BAILIAN_ACCESS_KEY_ID", &mut config.ai.access_key_id),
        ("ALIYUN_BAILIAN_ACCESS_KEY_SECRET", &mut config.ai.access_key_secret),
        ("ALIYUN_BAILIAN_ENDPOINT", &mut config.ai.endpoint),
        ("ALIYUN_BAILIAN_MODEL", &mut config.ai.model),
        ("AMAP_API_KEY", &mut config.map.api_key),
    ];
    for (name, slot) in secrets {
        if let Some(value) = var(name) {
            *slot = value;
        }
    }
}
