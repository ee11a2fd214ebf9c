//! Tournament manager for creating tournaments, enrolling players and
//! recording final placements.

use std::sync::Arc;

use super::models::{
    Enrollment, NewTournament, Placement, PlacementUpdate, Tournament, TournamentFilter,
    TournamentId, TournamentPatch,
};
use crate::db::TournamentRepository;
use crate::errors::{TourneyError, TourneyResult};
use crate::player::PlayerId;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    repository: Arc<dyn TournamentRepository>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(repository: Arc<dyn TournamentRepository>) -> Self {
        Self { repository }
    }

    /// List tournaments ordered by start date
    pub async fn list_tournaments(
        &self,
        filter: &TournamentFilter,
    ) -> TourneyResult<Vec<Tournament>> {
        self.repository.list_tournaments(filter).await
    }

    /// Get a tournament by ID
    pub async fn get_tournament(&self, id: TournamentId) -> TourneyResult<Tournament> {
        self.repository
            .find_tournament(id)
            .await?
            .ok_or_else(|| TourneyError::not_found("Tournament", id))
    }

    /// Create a new tournament in pending status
    pub async fn create_tournament(&self, input: &NewTournament) -> TourneyResult<Tournament> {
        input.validate()?;
        let tournament = self.repository.create_tournament(input).await?;

        log::info!(
            "Created tournament {} '{}' ({} seats)",
            tournament.id,
            tournament.name,
            tournament.max_participants
        );
        Ok(tournament)
    }

    /// Apply a partial update to a tournament
    pub async fn update_tournament(
        &self,
        id: TournamentId,
        patch: &TournamentPatch,
    ) -> TourneyResult<Tournament> {
        let tournament = self
            .repository
            .update_tournament(id, patch)
            .await?
            .ok_or_else(|| TourneyError::not_found("Tournament", id))?;

        if patch.status.is_some() {
            log::info!("Tournament {} is now {}", id, tournament.status);
        }
        Ok(tournament)
    }

    /// Delete a tournament with its enrollments and matches
    pub async fn delete_tournament(&self, id: TournamentId) -> TourneyResult<()> {
        if !self.repository.delete_tournament(id).await? {
            return Err(TourneyError::not_found("Tournament", id));
        }

        log::info!("Deleted tournament {}", id);
        Ok(())
    }

    /// Enroll a player in a pending tournament that still has a free seat.
    ///
    /// # Errors
    ///
    /// * [`TourneyError::NotFound`] if the tournament does not exist
    /// * [`TourneyError::State`] if the tournament is no longer pending
    /// * [`TourneyError::Capacity`] if every seat is taken
    /// * [`TourneyError::Conflict`] if the player is already enrolled
    /// * [`TourneyError::InvalidReference`] if the player does not exist
    pub async fn enroll_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> TourneyResult<Enrollment> {
        let enrollment = self
            .repository
            .enroll_player(tournament_id, player_id)
            .await?;

        log::info!(
            "Player {} enrolled in tournament {}",
            player_id,
            tournament_id
        );
        Ok(enrollment)
    }

    /// Record a player's final position and points in a running or finished tournament
    pub async fn record_placement(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        placement: &Placement,
    ) -> TourneyResult<PlacementUpdate> {
        placement.validate()?;
        let update = self
            .repository
            .record_placement(tournament_id, player_id, placement)
            .await?;

        log::info!(
            "Tournament {}: player {} placed {:?} with {} points",
            tournament_id,
            player_id,
            update.enrollment.final_position,
            update.enrollment.points_obtained
        );
        Ok(update)
    }
}
