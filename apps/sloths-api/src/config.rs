//! API server configuration.
//!
//! Values are layered, later sources winning:
//! 1. Built-in defaults
//! 2. `sloths.toml` in the working directory, or the file named by
//!    `SLOTHS_CONFIG` (which must then exist)
//! 3. Environment variables prefixed `SLOTHS_`, e.g. `SLOTHS_HTTP_PORT=8080`

use std::env;
use std::net::SocketAddr;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Secret used when nothing else is configured. `main` warns about it.
pub const DEV_JWT_SECRET: &str = "sloths-dev-secret-change-in-production";

const DEFAULT_CONFIG_FILE: &str = "sloths.toml";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to listen on
    pub bind_addr: String,

    /// HTTP port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Upper bound of the connection pool
    pub max_connections: u32,

    /// HS256 signing secret for access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl ApiConfig {
    /// Loads configuration from defaults, the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let (path, required) = match env::var("SLOTHS_CONFIG") {
            Ok(path) => (path, true),
            Err(_) => (DEFAULT_CONFIG_FILE.to_string(), false),
        };

        let config = Self::defaults()?
            .add_source(File::new(&path, FileFormat::Toml).required(required))
            .add_source(Environment::with_prefix("SLOTHS").try_parsing(true))
            .build()?;

        Self::from_config(config)
    }

    /// Builder preloaded with the default values.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("bind_addr", "0.0.0.0")?
            .set_default("http_port", 8000_i64)?
            .set_default("database_path", "./sloths.db")?
            .set_default("max_connections", 5_i64)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_access_lifetime_secs", 3600_i64)?
            .set_default("log_level", "info")?;
        Ok(builder)
    }

    /// Deserializes and validates an assembled [`Config`].
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let api: ApiConfig = config.try_deserialize()?;
        api.validate()?;
        Ok(api)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt_access_lifetime_secs must be positive".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "max_connections must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Address the server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.http_port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("bind_addr '{}'", self.bind_addr)))
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
