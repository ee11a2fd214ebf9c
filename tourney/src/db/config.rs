//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use std::env;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string. When unset the URL is
    ///   assembled from `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD` and `DB_NAME`
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT_SECS`: Acquire timeout in seconds (default: 60)
    /// - `DB_IDLE_TIMEOUT_SECS`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME_SECS`: Max lifetime in seconds (default: 1800)
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::development();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            Self::url_from_parts(
                &env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
                env_or("DB_PORT", 5432),
                &env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
                &env::var("DB_PASSWORD").unwrap_or_default(),
                &env::var("DB_NAME").unwrap_or_else(|_| "tourney".to_string()),
            )
        });

        Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        }
    }

    /// Build a connection URL from its parts. An empty password is omitted.
    pub fn url_from_parts(host: &str, port: u16, user: &str, password: &str, name: &str) -> String {
        if password.is_empty() {
            format!("postgres://{user}@{host}:{port}/{name}")
        } else {
            format!("postgres://{user}:{password}@{host}:{port}/{name}")
        }
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost:5432/tourney` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: Self::url_from_parts("localhost", 5432, "postgres", "", "tourney"),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 60,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
