//! Leaderboard, tournament standings and tournament summaries.

pub mod calculator;
pub mod models;

pub use calculator::{RankingCalculator, resolve_limit, sort_standings};
pub use models::{
    DEFAULT_RANKING_LIMIT, MAX_RANKING_LIMIT, RankingEntry, StandingEntry, TournamentStats,
};
