//! Statistics aggregator.
//!
//! Match finalization goes through [`crate::db::MatchRepository::update_match`],
//! which applies the result inside the match's own transaction. This type is
//! the standalone entry point for applying a result between two players.

use std::sync::Arc;

use super::models::{AppliedResult, MatchOutcome, PlayerStatistics};
use crate::db::StatisticsRepository;
use crate::errors::{TourneyError, TourneyResult};
use crate::player::PlayerId;

#[derive(Clone)]
pub struct StatisticsAggregator {
    repository: Arc<dyn StatisticsRepository>,
}

impl StatisticsAggregator {
    pub fn new(repository: Arc<dyn StatisticsRepository>) -> Self {
        Self { repository }
    }

    /// Record one win for `winner_id` and one loss for `loser_id`.
    ///
    /// Both rows change together or not at all.
    ///
    /// # Errors
    ///
    /// * [`TourneyError::Validation`] if both ids are the same player
    /// * [`TourneyError::NotFound`] if either statistics row is missing
    pub async fn apply_match_result(
        &self,
        winner_id: PlayerId,
        loser_id: PlayerId,
    ) -> TourneyResult<AppliedResult> {
        let outcome = MatchOutcome::new(winner_id, loser_id)?;
        let applied = self.repository.apply_match_result(&outcome).await?;

        log::debug!(
            "Applied result: player {} (streak {}) beat player {}",
            winner_id,
            applied.winner.current_streak,
            loser_id
        );
        Ok(applied)
    }

    pub async fn get_statistics(&self, player_id: PlayerId) -> TourneyResult<PlayerStatistics> {
        self.repository
            .find_statistics(player_id)
            .await?
            .ok_or_else(|| TourneyError::not_found("Player statistics", player_id))
    }
}
