//! Ranking calculator.

use std::cmp::Ordering;
use std::sync::Arc;

use super::models::{
    DEFAULT_RANKING_LIMIT, MAX_RANKING_LIMIT, RankingEntry, StandingEntry, TournamentStats,
};
use crate::db::RankingRepository;
use crate::errors::{TourneyError, TourneyResult};
use crate::tournament::TournamentId;

/// Leaderboard page size for a requested `limit`, capped at [`MAX_RANKING_LIMIT`]
pub fn resolve_limit(limit: Option<i64>) -> TourneyResult<i64> {
    match limit {
        None => Ok(DEFAULT_RANKING_LIMIT),
        Some(n) if n < 1 => Err(TourneyError::Validation(
            "limit must be a positive integer".to_string(),
        )),
        Some(n) => Ok(n.min(MAX_RANKING_LIMIT)),
    }
}

fn standing_order(a: &StandingEntry, b: &StandingEntry) -> Ordering {
    let by_position = match (a.final_position, b.final_position) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_position
        .then_with(|| b.total_points.cmp(&a.total_points))
        .then_with(|| a.nickname.cmp(&b.nickname))
}

/// Order standings by final position with unplaced players last, then by
/// total points descending, then nickname
pub fn sort_standings(standings: &mut [StandingEntry]) {
    standings.sort_by(standing_order);
}

#[derive(Clone)]
pub struct RankingCalculator {
    repository: Arc<dyn RankingRepository>,
}

impl RankingCalculator {
    pub fn new(repository: Arc<dyn RankingRepository>) -> Self {
        Self { repository }
    }

    /// Active players by total points, ties by id
    pub async fn get_ranking(&self, limit: Option<i64>) -> TourneyResult<Vec<RankingEntry>> {
        let limit = resolve_limit(limit)?;
        self.repository.ranking(limit).await
    }

    pub async fn get_tournament_stats(&self, id: TournamentId) -> TourneyResult<TournamentStats> {
        self.repository
            .tournament_stats(id)
            .await?
            .ok_or_else(|| TourneyError::not_found("Tournament", id))
    }

    pub async fn get_tournament_standings(
        &self,
        id: TournamentId,
    ) -> TourneyResult<Vec<StandingEntry>> {
        let mut standings = self
            .repository
            .tournament_standings(id)
            .await?
            .ok_or_else(|| TourneyError::not_found("Tournament", id))?;
        sort_standings(&mut standings);
        Ok(standings)
    }
}
