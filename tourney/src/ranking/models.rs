//! Read-side views: leaderboard rows, tournament standings and summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::PlayerId;
use crate::tournament::{EnrollmentStatus, TournamentId, TournamentStatus};

/// Default number of leaderboard rows
pub const DEFAULT_RANKING_LIMIT: i64 = 10;

/// Largest leaderboard page served
pub const MAX_RANKING_LIMIT: i64 = 100;

/// Leaderboard row for an active player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub player_id: PlayerId,
    pub nickname: String,
    pub country: Option<String>,
    pub total_points: i64,
    pub games_won: i32,
    pub games_lost: i32,
    pub tournaments_won: i32,
    pub best_streak: i32,
    /// `None` until the player has finished a game
    pub win_percentage: Option<f64>,
}

/// Enrolled player's row in a tournament's standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub player_id: PlayerId,
    pub nickname: String,
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub total_points: i64,
    pub enrolled_at: DateTime<Utc>,
    pub final_position: Option<i32>,
    pub points_obtained: i32,
    pub status: EnrollmentStatus,
}

/// Participation and match summary for one tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentStats {
    pub tournament_id: TournamentId,
    pub name: String,
    pub game: String,
    pub status: TournamentStatus,
    pub total_participants: i64,
    pub total_matches: i64,
    pub finished_matches: i64,
    /// Mean over matches with a recorded duration, two decimals
    pub average_duration_minutes: Option<f64>,
}
