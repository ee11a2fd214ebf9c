//! Player manager for registering and maintaining players.

use std::sync::Arc;

use super::models::{NewPlayer, Player, PlayerFilter, PlayerId, PlayerPatch, PlayerTournament};
use crate::db::{PlayerRepository, StatisticsRepository};
use crate::errors::{TourneyError, TourneyResult};
use crate::stats::StatisticsSummary;

/// Player manager
#[derive(Clone)]
pub struct PlayerManager {
    players: Arc<dyn PlayerRepository>,
    statistics: Arc<dyn StatisticsRepository>,
}

impl PlayerManager {
    /// Create a new player manager
    pub fn new(
        players: Arc<dyn PlayerRepository>,
        statistics: Arc<dyn StatisticsRepository>,
    ) -> Self {
        Self {
            players,
            statistics,
        }
    }

    /// List players ordered by total points
    pub async fn list_players(&self, filter: &PlayerFilter) -> TourneyResult<Vec<Player>> {
        if filter.limit <= 0 {
            return Err(TourneyError::Validation(
                "limit must be a positive integer".to_string(),
            ));
        }
        self.players.list_players(filter).await
    }

    /// Get a player by ID
    pub async fn get_player(&self, id: PlayerId) -> TourneyResult<Player> {
        self.players
            .find_player(id)
            .await?
            .ok_or_else(|| TourneyError::not_found("Player", id))
    }

    /// Register a new player together with an empty statistics row
    pub async fn create_player(&self, input: &NewPlayer) -> TourneyResult<Player> {
        input.validate()?;
        let player = self.players.create_player(&input.normalized()).await?;

        log::info!("Registered player {} '{}'", player.id, player.nickname);
        Ok(player)
    }

    /// Apply a partial update to a player
    pub async fn update_player(&self, id: PlayerId, patch: &PlayerPatch) -> TourneyResult<Player> {
        if patch.is_empty() {
            return self.get_player(id).await;
        }
        self.players
            .update_player(id, patch)
            .await?
            .ok_or_else(|| TourneyError::not_found("Player", id))
    }

    /// Delete a player with their statistics, enrollments and matches
    pub async fn delete_player(&self, id: PlayerId) -> TourneyResult<()> {
        if !self.players.delete_player(id).await? {
            return Err(TourneyError::not_found("Player", id));
        }

        log::info!("Deleted player {}", id);
        Ok(())
    }

    /// Statistics of a player, annotated with their win percentage
    pub async fn get_statistics(&self, id: PlayerId) -> TourneyResult<StatisticsSummary> {
        self.statistics
            .statistics_summary(id)
            .await?
            .ok_or_else(|| TourneyError::not_found("Player", id))
    }

    /// Tournaments a player is enrolled in, newest first
    pub async fn get_tournaments(&self, id: PlayerId) -> TourneyResult<Vec<PlayerTournament>> {
        self.get_player(id).await?;
        self.players.player_tournaments(id).await
    }
}
