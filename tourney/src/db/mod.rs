//! Database module providing PostgreSQL connection pooling and the stores.
//!
//! [`Database`] owns the connection pool. [`PgStore`] implements every
//! repository trait on top of it; [`MemoryStore`] implements the same traits
//! in process for tests and local experiments.

use log::info;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{
    MatchRepository, PlayerRepository, RankingRepository, SortOrder, StatisticsRepository,
    TournamentRepository,
};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Arguments
    ///
    /// * `config` - Database configuration
    ///
    /// # Returns
    ///
    /// * `Result<Database, sqlx::Error>` - Database instance or error
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tourney::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::from_env();
    ///     let db = Database::new(&config).await?;
    ///     db.health_check().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Store backed by this pool
    pub fn store(&self) -> PgStore {
        PgStore::new(self.pool.clone())
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Check if the database connection is healthy
    ///
    /// # Returns
    ///
    /// * `Result<(), sqlx::Error>` - Ok if healthy, error otherwise
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
