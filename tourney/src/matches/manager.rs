//! Match manager for scheduling matches and recording their results.

use std::sync::Arc;

use super::models::{Match, MatchDetail, MatchFilter, MatchId, MatchPatch, MatchUpdate, NewMatch};
use crate::db::MatchRepository;
use crate::errors::{TourneyError, TourneyResult};

/// Match manager
#[derive(Clone)]
pub struct MatchManager {
    repository: Arc<dyn MatchRepository>,
}

impl MatchManager {
    /// Create a new match manager
    pub fn new(repository: Arc<dyn MatchRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_matches(&self, filter: &MatchFilter) -> TourneyResult<Vec<MatchDetail>> {
        self.repository.list_matches(filter).await
    }

    pub async fn get_match(&self, id: MatchId) -> TourneyResult<MatchDetail> {
        self.repository
            .find_match(id)
            .await?
            .ok_or_else(|| TourneyError::not_found("Match", id))
    }

    /// Schedule a match between two different players
    pub async fn create_match(&self, input: &NewMatch) -> TourneyResult<Match> {
        input.validate()?;
        let created = self.repository.create_match(input).await?;

        log::info!(
            "Scheduled match {} in tournament {}: {} vs {}",
            created.id,
            created.tournament_id,
            created.player1_id,
            created.player2_id
        );
        Ok(created)
    }

    /// Merge a result update into a match.
    ///
    /// When the update finishes the match with a winner, both players'
    /// statistics are updated in the same transaction as the match row.
    pub async fn update_match(&self, id: MatchId, patch: &MatchPatch) -> TourneyResult<MatchUpdate> {
        patch.validate()?;
        let update = self.repository.update_match(id, patch).await?;

        if let Some(applied) = &update.applied {
            log::info!(
                "Match {} finalized: player {} beat player {}",
                id,
                applied.winner.player_id,
                applied.loser.player_id
            );
        }
        Ok(update)
    }

    pub async fn delete_match(&self, id: MatchId) -> TourneyResult<()> {
        if !self.repository.delete_match(id).await? {
            return Err(TourneyError::not_found("Match", id));
        }
        Ok(())
    }
}
