//! Tournaments, enrollments and placements.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use tourney::db::{Database, DatabaseConfig};
//! use tourney::tournament::{NewTournament, TournamentManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let manager = TournamentManager::new(Arc::new(db.store()));
//!
//!     let day = NaiveDate::from_ymd_opt(2025, 6, 1).ok_or("bad date")?;
//!     let tournament = manager
//!         .create_tournament(&NewTournament {
//!             name: "Spring Open".to_string(),
//!             game: "Chess".to_string(),
//!             description: None,
//!             start_date: day,
//!             end_date: day,
//!             total_prize: 500,
//!             max_participants: 16,
//!         })
//!         .await?;
//!
//!     manager.enroll_player(tournament.id, 1).await?;
//!     Ok(())
//! }
//! ```

pub mod enrollment;
pub mod manager;
pub mod models;

pub use enrollment::{check_admission, check_champion};
pub use manager::TournamentManager;
pub use models::{
    DEFAULT_MAX_PARTICIPANTS, Enrollment, EnrollmentStatus, NewTournament, Placement,
    PlacementUpdate, Tournament, TournamentFilter, TournamentId, TournamentPatch,
    TournamentStatus,
};
