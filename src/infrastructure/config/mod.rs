use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};

pub const CONFIG_FILE: &str = "directory-admin.toml";
pub const ENV_PREFIX: &str = "DIRECTORY_ADMIN_";

/// Service configuration. Sources, lowest priority first: built-in defaults,
/// `directory-admin.toml`, `DIRECTORY_ADMIN_*` environment variables (nested
/// keys separated by `__`, e.g. `DIRECTORY_ADMIN_SERVER__PORT`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,

    #[validate(nested)]
    pub store: StoreConfig,

    #[validate(nested)]
    pub import: ImportConfig,

    /// tracing-subscriber EnvFilter directive
    #[validate(length(min = 1))]
    pub log_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// sqlx connection string, e.g. `sqlite://directory.db` or `sqlite::memory:`
    #[validate(length(min = 1))]
    pub sqlite_url: String,

    /// Hosted backend base URL (PostgREST-compatible)
    #[validate(url)]
    pub rest_url: Option<String>,

    #[validate(length(min = 1))]
    pub rest_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImportConfig {
    /// Enum-like text longer than this is treated as corrupted and dropped
    #[validate(range(min = 1))]
    pub enum_max_chars: usize,

    /// Largest accepted upload body in bytes
    #[validate(range(min = 1024))]
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            store: StoreConfig {
                backend: StoreBackend::Sqlite,
                sqlite_url: "sqlite://directory.db".to_string(),
                rest_url: None,
                rest_api_key: None,
            },
            import: ImportConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            enum_max_chars: 20,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

pub struct ConfigService;

impl ConfigService {
    /// Load from `.env`, the config file in the working directory, and the
    /// environment.
    pub fn load() -> Result<AppConfig> {
        let _ = dotenvy::dotenv();
        Self::load_from(Self::figment(Path::new(CONFIG_FILE)))
    }

    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load_from(figment: Figment) -> Result<AppConfig> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &AppConfig) -> Result<()> {
        config
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid configuration: {}", e)))?;

        if config.store.backend == StoreBackend::Rest
            && (config.store.rest_url.is_none() || config.store.rest_api_key.is_none())
        {
            return Err(AppError::ConfigError(
                "store.rest_url and store.rest_api_key are required for the rest backend"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
