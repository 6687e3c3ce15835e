//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// PostgreSQL connection parameters.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
}

/// Redis connection parameters.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Marks auth cookies `Secure` when set.
    pub is_prod: bool,
    pub cors_origin: String,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt_secret: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));

        // --- Server Settings ---
        let bind_address_str = get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = get("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let is_prod = match get("IS_PROD") {
            Some(v) => parse_bool("IS_PROD", &v)?,
            None => false,
        };

        let cors_origin =
            get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Database Settings ---
        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            port: parse_or("DB_PORT", get("DB_PORT"), 5432)?,
            user: required("DB_USER")?,
            password: get("DB_PASSWORD").unwrap_or_default(),
            name: required("DB_NAME")?,
            ssl_mode: parse_or("DB_SSL_MODE", get("DB_SSL_MODE"), PgSslMode::Disable)?,
            max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 10)?,
        };

        // --- Cache Settings ---
        let redis = RedisConfig {
            host: required("REDIS_HOST")?,
            port: get("REDIS_PORT")
                .ok_or_else(|| ConfigError::MissingVar("REDIS_PORT".to_string()))
                .and_then(|v| parse_value("REDIS_PORT", &v))?,
            password: get("REDIS_PASSWORD"),
        };

        // --- Auth Settings ---
        let jwt_secret = required("JWT_SECRET")?;

        Ok(Self {
            bind_address,
            log_level,
            is_prod,
            cors_origin,
            database,
            redis,
            jwt_secret,
        })
    }

    /// Postgres connect options built field by field, so credentials need no escaping.
    pub fn pg_connect_options(&self) -> PgConnectOptions {
        let db = &self.database;
        let options = PgConnectOptions::new()
            .host(&db.host)
            .port(db.port)
            .username(&db.user)
            .database(&db.name)
            .ssl_mode(db.ssl_mode);
        if db.password.is_empty() {
            options
        } else {
            options.password(&db.password)
        }
    }

    /// Redis connection info for logical database 0.
    pub fn redis_connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.redis.host.clone(), self.redis.port),
            redis: RedisConnectionInfo {
                db: 0,
                password: self.redis.password.clone(),
                ..Default::default()
            },
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}
