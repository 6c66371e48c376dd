//! Service configuration loaded from environment variables.
//!
//! - `DATABASE_URL` (required)
//! - `DATABASE_MAX_CONNECTIONS` (default: 10)
//! - `HOST` (default: 0.0.0.0)
//! - `PORT` (default: 3000)
//! - `APP_ENV` - `development` or `production` (default: development)
//! - `AUTH_TOKEN_TTL_HOURS` (default: 168, at most 87600)

use std::net::{IpAddr, SocketAddr};

use chrono::Duration;
use thiserror::Error;

/// Ten years.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of an issued bearer token.
    pub token_ttl: Duration,
}

/// Load configuration from the process environment.
pub fn load() -> Result<AppConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build configuration from an arbitrary key lookup.
pub fn from_lookup<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let environment = match lookup("APP_ENV").as_deref() {
        None | Some("development") | Some("dev") => Environment::Development,
        Some("production") | Some("prod") => Environment::Production,
        Some(other) => {
            return Err(ConfigError::InvalidEnvVar(
                "APP_ENV".into(),
                format!("unknown environment '{other}'"),
            ));
        }
    };

    let url = lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".into()))?;
    let max_connections = parse_or_default(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
    let host = parse_or_default(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?;
    let port = parse_or_default(&lookup, "PORT", 3000u16)?;

    let ttl_hours = parse_or_default(&lookup, "AUTH_TOKEN_TTL_HOURS", 168i64)?;
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&ttl_hours) {
        return Err(ConfigError::InvalidEnvVar(
            "AUTH_TOKEN_TTL_HOURS".into(),
            format!("must be between 1 and {MAX_TOKEN_TTL_HOURS}"),
        ));
    }
    let token_ttl = Duration::try_hours(ttl_hours).ok_or_else(|| {
        ConfigError::InvalidEnvVar("AUTH_TOKEN_TTL_HOURS".into(), "out of range".into())
    })?;

    Ok(AppConfig {
        environment,
        server: ServerConfig { host, port },
        database: DatabaseConfig {
            url,
            max_connections,
        },
        auth: AuthConfig { token_ttl },
    })
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
