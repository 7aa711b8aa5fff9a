//! Centralized configuration for the identity service.
//!
//! All configuration is loaded from environment variables (a `.env` file is
//! honored) and validated at startup.

use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Minimum accepted `JWT_SECRET` length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable not set
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    /// Variable set but unusable
    #[error("Invalid {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Where users are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process memory; lost on restart
    Memory,
    /// PostgreSQL via `DATABASE_URL`
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

/// Identity service configuration.
#[derive(Debug)]
pub struct Config {
    /// Service name used in logs
    pub app_name: String,

    // Listeners
    /// HTTP bind host
    pub http_host: String,
    /// HTTP bind port
    pub http_port: u16,
    /// gRPC bind host
    pub grpc_host: String,
    /// gRPC bind port
    pub grpc_port: u16,
    /// Grace period for in-flight work after the shutdown signal
    pub shutdown_timeout: Duration,

    // Logging
    /// Log filter directive
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,

    // Storage
    /// Storage implementation
    pub storage_backend: StorageBackend,
    /// PostgreSQL connection string
    pub database_url: Option<String>,
    /// Pool size
    pub database_pool_max: u32,
    /// Redis URL; unset selects the in-process cache
    pub redis_url: Option<String>,
    /// Lifetime of cached user lookups
    pub user_cache_ttl: Duration,

    // Tokens
    /// HMAC signing secret
    pub jwt_secret: SecretString,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,

    // Credentials
    /// Argon2 memory cost in KiB
    pub password_memory_kib: u32,
    /// Argon2 iteration count
    pub password_iterations: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let jwt_secret = vars
            .get("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let config = Self {
            app_name: vars.get_or("APP_NAME", "identity-service"),
            http_host: vars.get_or("HTTP_HOST", "0.0.0.0"),
            http_port: vars.parse("HTTP_PORT", 8080)?,
            grpc_host: vars.get_or("GRPC_HOST", "0.0.0.0"),
            grpc_port: vars.parse("GRPC_PORT", 9090)?,
            shutdown_timeout: Duration::from_secs(vars.parse("SHUTDOWN_TIMEOUT", 30)?),
            log_level: vars.get_or("LOG_LEVEL", "info"),
            log_json: vars.parse("LOG_JSON", false)?,
            storage_backend: vars.parse("STORAGE_BACKEND", StorageBackend::Memory)?,
            database_url: vars.get("DATABASE_URL").filter(|s| !s.is_empty()),
            database_pool_max: vars.parse("DATABASE_POOL_MAX", 10)?,
            redis_url: vars.get("REDIS_URL").filter(|s| !s.is_empty()),
            user_cache_ttl: Duration::from_secs(vars.parse("USER_CACHE_TTL", 300)?),
            jwt_secret: SecretString::from(jwt_secret),
            access_token_ttl: Duration::from_secs(vars.parse("ACCESS_TOKEN_TTL", 900)?),
            refresh_token_ttl: Duration::from_secs(vars.parse("REFRESH_TOKEN_TTL", 1800)?),
            password_memory_kib: vars
                .parse("PASSWORD_MEMORY_KIB", argon2::Params::DEFAULT_M_COST)?,
            password_iterations: vars
                .parse("PASSWORD_ITERATIONS", argon2::Params::DEFAULT_T_COST)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port == 0 {
            return Err(ConfigError::invalid("HTTP_PORT", "must be non-zero"));
        }
        if self.grpc_port == 0 {
            return Err(ConfigError::invalid("GRPC_PORT", "must be non-zero"));
        }
        if self.http_port == self.grpc_port && self.http_host == self.grpc_host {
            return Err(ConfigError::invalid("GRPC_PORT", "must differ from HTTP_PORT"));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::invalid("SHUTDOWN_TIMEOUT", "must be non-zero"));
        }
        if self.jwt_secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(ConfigError::invalid(
                "JWT_SECRET",
                format!("must be at least {MIN_SECRET_LEN} bytes"),
            ));
        }
        if self.access_token_ttl.is_zero() {
            return Err(ConfigError::invalid("ACCESS_TOKEN_TTL", "must be non-zero"));
        }
        if self.refresh_token_ttl < self.access_token_ttl {
            return Err(ConfigError::invalid(
                "REFRESH_TOKEN_TTL",
                "must not be shorter than ACCESS_TOKEN_TTL",
            ));
        }
        if self.user_cache_ttl.is_zero() {
            return Err(ConfigError::invalid("USER_CACHE_TTL", "must be non-zero"));
        }
        if self.storage_backend == StorageBackend::Postgres && self.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.database_pool_max == 0 {
            return Err(ConfigError::invalid("DATABASE_POOL_MAX", "must be non-zero"));
        }
        Ok(())
    }

    /// HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// gRPC bind address.
    #[must_use]
    pub fn grpc_addr(&self) -> String {
        format!("{}:{}", self.grpc_host, self.grpc_port)
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(val) => val
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(name, e.to_string())),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.app_name, "identity-service");
        assert_eq!(config.http_addr(), "0.0.0.0:8080");
        assert_eq!(config.grpc_addr(), "0.0.0.0:9090");
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(1800));
        assert_eq!(config.user_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        assert!(config.redis_url.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_secret_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            load(&[("JWT_SECRET", "short")]),
            Err(ConfigError::Invalid { name: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn test_unparsable_port() {
        assert!(matches!(
            load(&[("JWT_SECRET", SECRET), ("HTTP_PORT", "eighty")]),
            Err(ConfigError::Invalid { name: "HTTP_PORT", .. })
        ));
    }

    #[test]
    fn test_refresh_shorter_than_access_rejected() {
        assert!(matches!(
            load(&[
                ("JWT_SECRET", SECRET),
                ("ACCESS_TOKEN_TTL", "600"),
                ("REFRESH_TOKEN_TTL", "60"),
            ]),
            Err(ConfigError::Invalid { name: "REFRESH_TOKEN_TTL", .. })
        ));
    }

    #[test]
    fn test_postgres_needs_url() {
        assert_eq!(
            load(&[("JWT_SECRET", SECRET), ("STORAGE_BACKEND", "postgres")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );

        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("STORAGE_BACKEND", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/identity"),
        ])
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
    }

    #[test]
    fn test_same_listener_address_rejected() {
        assert!(load(&[("JWT_SECRET", SECRET), ("GRPC_PORT", "8080")]).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{config:?}").contains(SECRET));
    }
}
