use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

const APP_DIR: &str = "kneadback";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 3;
pub const MAX_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DRAIN_BACKOFF_MS: u64 = 200;
pub const MAX_DRAIN_BACKOFF_MS: u64 = 10_000;
pub const DEFAULT_MAX_LIST_LIMIT: i64 = 1000;

pub const ENV_API_URL: &str = "KNEADBACK_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "KNEADBACK_TIMEOUT_SECS";
pub const ENV_HOST: &str = "KNEADBACK_HOST";
pub const ENV_PORT: &str = "KNEADBACK_PORT";
pub const ENV_DB_PATH: &str = "KNEADBACK_DB_PATH";
pub const ENV_QUEUE_PATH: &str = "KNEADBACK_QUEUE_PATH";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: Option<PathBuf>,
    pub max_list_limit: i64,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub timeout_secs: u64,
    pub queue_path: Option<PathBuf>,
    pub drain_backoff_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: None,
            max_list_limit: DEFAULT_MAX_LIST_LIMIT,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            queue_path: None,
            drain_backoff_ms: DEFAULT_DRAIN_BACKOFF_MS,
        }
    }
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default api url is a valid literal")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("invalid api_url {value:?}: {reason}")]
    InvalidApiUrl { value: String, reason: String },
    #[error("invalid timeout_secs value: {0} (expected 1-60)")]
    InvalidTimeout(u64),
    #[error("invalid drain_backoff_ms value: {0} (expected at most 10000)")]
    InvalidBackoff(u64),
    #[error("invalid port value: {0}")]
    InvalidPort(String),
    #[error("invalid max_list_limit value: {0}")]
    InvalidListLimit(i64),
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    server: Option<ServerFile>,
    client: Option<ClientFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerFile {
    host: Option<String>,
    port: Option<u16>,
    db_path: Option<PathBuf>,
    max_list_limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClientFile {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    queue_path: Option<PathBuf>,
    drain_backoff_ms: Option<u64>,
}

/// Loads the config file (required only when a path is given explicitly) and
/// then applies `KNEADBACK_*` environment overrides.
pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let config = load_file(config_path)?;
    apply_env(config, |name| env::var(name).ok())
}

fn load_file(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(server) = parsed.server {
        if let Some(host) = server.host {
            config.server.host = host;
        }
        if let Some(port) = server.port {
            config.server.port = validate_port(port)?;
        }
        if let Some(db_path) = server.db_path {
            config.server.db_path = Some(db_path);
        }
        if let Some(limit) = server.max_list_limit {
            if limit < 1 {
                return Err(ConfigError::InvalidListLimit(limit));
            }
            config.server.max_list_limit = limit;
        }
    }

    if let Some(client) = parsed.client {
        if let Some(api_url) = client.api_url {
            config.client.api_url = parse_api_url(&api_url)?;
        }
        if let Some(timeout) = client.timeout_secs {
            config.client.timeout_secs = validate_timeout(timeout)?;
        }
        if let Some(queue_path) = client.queue_path {
            config.client.queue_path = Some(queue_path);
        }
        if let Some(backoff) = client.drain_backoff_ms {
            config.client.drain_backoff_ms = validate_backoff(backoff)?;
        }
    }

    Ok(config)
}

/// Environment values win over the config file. `lookup` is `env::var` outside tests.
pub fn apply_env<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig>
where
    F: Fn(&'static str) -> Option<String>,
{
    let read = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(value) = read(ENV_API_URL) {
        config.client.api_url = parse_api_url(&value)?;
    }
    if let Some(value) = read(ENV_TIMEOUT_SECS) {
        let timeout = value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidEnv {
                name: ENV_TIMEOUT_SECS,
                value: value.clone(),
            })?;
        config.client.timeout_secs = validate_timeout(timeout)?;
    }
    if let Some(value) = read(ENV_HOST) {
        config.server.host = value.trim().to_string();
    }
    if let Some(value) = read(ENV_PORT) {
        let port = value
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(value.clone()))?;
        config.server.port = validate_port(port)?;
    }
    if let Some(value) = read(ENV_DB_PATH) {
        config.server.db_path = Some(PathBuf::from(value));
    }
    if let Some(value) = read(ENV_QUEUE_PATH) {
        config.client.queue_path = Some(PathBuf::from(value));
    }

    Ok(config)
}

pub fn parse_api_url(raw: &str) -> Result<Url> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        value: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_string()));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

pub fn validate_timeout(timeout_secs: u64) -> Result<u64> {
    if timeout_secs == 0 || timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::InvalidTimeout(timeout_secs));
    }
    Ok(timeout_secs)
}

fn validate_backoff(backoff_ms: u64) -> Result<u64> {
    if backoff_ms > MAX_DRAIN_BACKOFF_MS {
        return Err(ConfigError::InvalidBackoff(backoff_ms));
    }
    Ok(backoff_ms)
}

pub fn validate_port(port: u16) -> Result<u16> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port.to_string()));
    }
    Ok(port)
}
