use std::env;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

/// Secret shipped in the defaults; refused when running in production.
pub const DEFAULT_JWT_SECRET: &str = "change_this_secret_in_production";

/// Upper bound for `ACCESS_TOKEN_EXPIRE_MINUTES` (one day).
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 24 * 60;

/// Upper bound for `REFRESH_TOKEN_EXPIRE_DAYS`.
pub const MAX_REFRESH_TOKEN_DAYS: i64 = 365;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Unsupported JWT algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("JWT_SECRET must be set to a non-default value in production")]
    InsecureSecret,

    #[error("{name} must be between 1 and {max}, got {value}")]
    TokenLifetime {
        name: &'static str,
        value: i64,
        max: i64,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any variable source; `from_env` passes the process env.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match var("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides(&var)?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self, var: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(port) = var("STAFF_PORTAL_PORT")
            .or_else(|| var("PORT"))
            .and_then(|s| s.trim().parse::<u16>().ok())
        {
            self.port = port;
        }

        // Database overrides
        if let Some(v) = var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Some(v) = var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = var("JWT_ALGORITHM") {
            self.security.jwt_algorithm = parse_algorithm(&v)?;
        }
        if let Some(v) = var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.security.access_token_expire_minutes =
                v.trim().parse().unwrap_or(self.security.access_token_expire_minutes);
        }
        if let Some(v) = var("REFRESH_TOKEN_EXPIRE_DAYS") {
            self.security.refresh_token_expire_days =
                v.trim().parse().unwrap_or(self.security.refresh_token_expire_days);
        }
        if let Some(v) = var("CORS_ORIGINS") {
            self.security.cors_origins = parse_origins(&v);
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.environment == Environment::Production
            && self.security.jwt_secret == DEFAULT_JWT_SECRET
        {
            return Err(ConfigError::InsecureSecret);
        }
        check_lifetime(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            self.security.access_token_expire_minutes,
            MAX_ACCESS_TOKEN_MINUTES,
        )?;
        check_lifetime(
            "REFRESH_TOKEN_EXPIRE_DAYS",
            self.security.refresh_token_expire_days,
            MAX_REFRESH_TOKEN_DAYS,
        )?;
        Ok(())
    }

    /// Connection string, required by anything that talks to Postgres.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database
            .url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            port: 8000,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig::defaults(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            port: 8000,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig::defaults(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            port: 8000,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig::defaults(),
        }
    }
}

impl SecurityConfig {
    fn defaults() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            cors_origins: vec!["*".to_string()],
        }
    }
}

fn check_lifetime(name: &'static str, value: i64, max: i64) -> Result<(), ConfigError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::TokenLifetime { name, value, max })
    }
}

/// Only the HMAC family is accepted since tokens are signed with a shared secret.
pub fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(value.trim())
        .map_err(|_| ConfigError::UnsupportedAlgorithm(value.to_string()))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(ConfigError::UnsupportedAlgorithm(value.to_string())),
    }
}

pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
impl AppConfig {
    /// Development defaults with a fixed secret, independent of the process env.
    pub fn for_tests() -> Self {
        let mut config = Self::development();
        config.security.jwt_secret = "test-secret-key-12345".to_string();
        config
    }
}
