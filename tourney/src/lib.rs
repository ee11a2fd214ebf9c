//! # Tourney
//!
//! Backend library for tracking competitive gaming tournaments: player
//! registration, tournament enrollment, match results, per-player statistics
//! and leaderboards.
//!
//! ## Architecture
//!
//! Each domain module pairs plain data models with a manager that validates
//! input and delegates storage to a repository trait:
//!
//! - [`player`]: player accounts, points and enrolled tournaments
//! - [`tournament`]: tournaments, the enrollment gate and placements
//! - [`matches`]: match scheduling and finalization
//! - [`stats`]: win/loss/streak counters and the statistics aggregator
//! - [`ranking`]: leaderboard, standings and tournament summaries
//! - [`db`]: repository traits, the PostgreSQL store and an in-memory store
//!
//! Operations that touch several rows (enrolling into a capped tournament,
//! finalizing a match together with both players' statistics, recording a
//! placement) are single repository calls so each store can run them
//! atomically.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tourney::db::MemoryStore;
//! use tourney::player::{NewPlayer, PlayerManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tourney::TourneyError> {
//!     let store = Arc::new(MemoryStore::new());
//!     let players = PlayerManager::new(store.clone(), store);
//!
//!     let player = players
//!         .create_player(&NewPlayer {
//!             nickname: "ace".to_string(),
//!             email: "ace@example.com".to_string(),
//!             full_name: None,
//!             country: None,
//!         })
//!         .await?;
//!     assert_eq!(player.total_points, 0);
//!     Ok(())
//! }
//! ```

/// Repository traits and their PostgreSQL and in-memory implementations.
pub mod db;

pub mod errors;
pub use errors::{TourneyError, TourneyResult};

pub mod matches;
pub mod player;
pub mod ranking;
pub mod stats;
pub mod tournament;

pub use matches::MatchManager;
pub use player::PlayerManager;
pub use ranking::RankingCalculator;
pub use stats::StatisticsAggregator;
pub use tournament::TournamentManager;
