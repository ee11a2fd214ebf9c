//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use std::str::FromStr;
use tourney::db::DatabaseConfig;

/// Bind address used when neither `SERVER_BIND` nor `PORT` is set
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    3000,
);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `skip_migrations` - Do not migrate on startup (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        skip_migrations: bool,
    ) -> Result<Self, ConfigError> {
        // Bind address: explicit address, then a bare port on all interfaces
        let bind = match bind_override {
            Some(addr) => addr,
            None => match parse_env::<SocketAddr>("SERVER_BIND")? {
                Some(addr) => addr,
                None => parse_env::<u16>("PORT")?
                    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
                    .unwrap_or(DEFAULT_BIND),
            },
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let metrics_bind = parse_env("METRICS_BIND")?;

        Ok(Self {
            bind,
            database,
            metrics_bind,
            run_migrations: !skip_migrations,
        })
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.database.database_url;
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL".to_string(),
                reason: "Must be a postgres:// or postgresql:// URL".to_string(),
            });
        }

        // Validate pool sizing
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.database.connection_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_CONNECTION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional environment variable; present but malformed is an error
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var: key.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
