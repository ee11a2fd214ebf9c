//! Repository trait definitions for testability and dependency injection.
//!
//! Managers depend only on these traits. [`crate::db::PgStore`] implements
//! them over PostgreSQL and [`crate::db::MemoryStore`] over in-process maps.
//! Operations whose invariants span several rows (enrollment, match
//! finalization, placements) are single trait methods so each store can run
//! them as one unit of work.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{TourneyError, TourneyResult};
use crate::matches::{Match, MatchDetail, MatchFilter, MatchId, MatchPatch, MatchUpdate, NewMatch};
use crate::player::{NewPlayer, Player, PlayerFilter, PlayerId, PlayerPatch, PlayerTournament};
use crate::ranking::{RankingEntry, StandingEntry, TournamentStats};
use crate::stats::{AppliedResult, MatchOutcome, PlayerStatistics, StatisticsSummary};
use crate::tournament::{
    Enrollment, NewTournament, Placement, PlacementUpdate, Tournament, TournamentFilter,
    TournamentId, TournamentPatch,
};

/// Listing order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = TourneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(TourneyError::Validation(format!(
                "order must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }
}

/// Trait for player repository operations
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// List players matching `filter`
    async fn list_players(&self, filter: &PlayerFilter) -> TourneyResult<Vec<Player>>;

    /// Find player by ID
    async fn find_player(&self, id: PlayerId) -> TourneyResult<Option<Player>>;

    /// Create a player together with its zeroed statistics row
    async fn create_player(&self, input: &NewPlayer) -> TourneyResult<Player>;

    /// Merge `patch` onto a stored player; `None` if it does not exist
    async fn update_player(&self, id: PlayerId, patch: &PlayerPatch)
    -> TourneyResult<Option<Player>>;

    /// Delete a player and everything that belongs to it
    async fn delete_player(&self, id: PlayerId) -> TourneyResult<bool>;

    /// Tournaments the player is enrolled in, newest start first
    async fn player_tournaments(&self, id: PlayerId) -> TourneyResult<Vec<PlayerTournament>>;
}

/// Trait for tournament and enrollment repository operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// List tournaments matching `filter`
    async fn list_tournaments(&self, filter: &TournamentFilter) -> TourneyResult<Vec<Tournament>>;

    /// Find tournament by ID
    async fn find_tournament(&self, id: TournamentId) -> TourneyResult<Option<Tournament>>;

    /// Create a pending tournament
    async fn create_tournament(&self, input: &NewTournament) -> TourneyResult<Tournament>;

    /// Merge `patch` onto a stored tournament; `None` if it does not exist
    async fn update_tournament(
        &self,
        id: TournamentId,
        patch: &TournamentPatch,
    ) -> TourneyResult<Option<Tournament>>;

    /// Delete a tournament with its enrollments and matches
    async fn delete_tournament(&self, id: TournamentId) -> TourneyResult<bool>;

    /// Enroll a player, serialized per tournament against concurrent enrollments
    async fn enroll_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> TourneyResult<Enrollment>;

    /// Record a final placement and carry its points and title to the player
    async fn record_placement(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        placement: &Placement,
    ) -> TourneyResult<PlacementUpdate>;
}

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// List matches matching `filter`, joined with names
    async fn list_matches(&self, filter: &MatchFilter) -> TourneyResult<Vec<MatchDetail>>;

    /// Find match by ID, joined with names
    async fn find_match(&self, id: MatchId) -> TourneyResult<Option<MatchDetail>>;

    /// Schedule a new match
    async fn create_match(&self, input: &NewMatch) -> TourneyResult<Match>;

    /// Merge a result update, applying statistics in the same unit of work
    /// when the update decides the match
    async fn update_match(&self, id: MatchId, patch: &MatchPatch) -> TourneyResult<MatchUpdate>;

    /// Delete a match
    async fn delete_match(&self, id: MatchId) -> TourneyResult<bool>;
}

/// Trait for player statistics repository operations
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Get statistics for a player
    async fn find_statistics(&self, player_id: PlayerId) -> TourneyResult<Option<PlayerStatistics>>;

    /// Get statistics joined with the player's nickname and points
    async fn statistics_summary(
        &self,
        player_id: PlayerId,
    ) -> TourneyResult<Option<StatisticsSummary>>;

    /// Apply a decided result to both players atomically
    async fn apply_match_result(&self, outcome: &MatchOutcome) -> TourneyResult<AppliedResult>;
}

/// Trait for read-only ranking queries
#[async_trait]
pub trait RankingRepository: Send + Sync {
    /// Active players by total points, at most `limit`
    async fn ranking(&self, limit: i64) -> TourneyResult<Vec<RankingEntry>>;

    /// Summary for a tournament; `None` if it does not exist
    async fn tournament_stats(&self, id: TournamentId) -> TourneyResult<Option<TournamentStats>>;

    /// Enrolled players in any order; `None` if the tournament does not exist
    async fn tournament_standings(
        &self,
        id: TournamentId,
    ) -> TourneyResult<Option<Vec<StandingEntry>>>;
}
