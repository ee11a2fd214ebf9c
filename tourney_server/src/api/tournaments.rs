//! Tournament API handlers: administration, enrollment, placements and
//! per-tournament views.
//!
//! # Examples
//!
//! Enroll a player:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/tournaments/1/enroll \
//!   -H "Content-Type: application/json" \
//!   -d '{"player_id": 7}'
//! ```

use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;
use tourney::db::SortOrder;
use tourney::player::PlayerId;
use tourney::ranking::{StandingEntry, TournamentStats};
use tourney::tournament::{
    DEFAULT_MAX_PARTICIPANTS, Enrollment, NewTournament, Placement, PlacementUpdate, Tournament,
    TournamentFilter, TournamentId, TournamentPatch, TournamentStatus,
};

use super::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::response::{ApiError, ApiResult, created, ok};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct ListTournamentsQuery {
    pub status: Option<TournamentStatus>,
    pub game: Option<String>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: Option<String>,
    pub game: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_prize: Option<i64>,
    pub max_participants: Option<i32>,
}

impl TryFrom<CreateTournamentRequest> for NewTournament {
    type Error = ApiError;

    fn try_from(req: CreateTournamentRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(game), Some(start_date), Some(end_date)) =
            (req.name, req.game, req.start_date, req.end_date)
        else {
            return Err(ApiError::validation(
                "name, game, start_date and end_date are required",
            ));
        };
        Ok(NewTournament {
            name,
            game,
            description: req.description,
            start_date,
            end_date,
            total_prize: req.total_prize.unwrap_or(0),
            max_participants: req.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub player_id: Option<PlayerId>,
}

/// List tournaments ordered by start date.
///
/// Query: `status`, `game` (case-insensitive substring), `order` (`asc`/`desc`).
pub async fn list_tournaments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListTournamentsQuery>,
) -> ApiResult<Vec<Tournament>> {
    let filter = TournamentFilter {
        status: query.status,
        game: query.game.filter(|g| !g.trim().is_empty()),
        order: query.order.unwrap_or_default(),
    };
    let tournaments = state.tournaments.list_tournaments(&filter).await?;
    let message = format!("{} tournaments found", tournaments.len());
    ok(tournaments, message)
}

pub async fn create_tournament(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateTournamentRequest>,
) -> ApiResult<Tournament> {
    let input = NewTournament::try_from(req)?;
    let tournament = state.tournaments.create_tournament(&input).await?;
    created(tournament, "Tournament created")
}

pub async fn get_tournament(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<Tournament> {
    let tournament = state.tournaments.get_tournament(id).await?;
    ok(tournament, "Tournament found")
}

pub async fn update_tournament(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
    ApiJson(patch): ApiJson<TournamentPatch>,
) -> ApiResult<Tournament> {
    let tournament = state.tournaments.update_tournament(id, &patch).await?;
    ok(tournament, "Tournament updated")
}

pub async fn delete_tournament(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<()> {
    state.tournaments.delete_tournament(id).await?;
    ok((), "Tournament deleted")
}

/// Enroll a player in a pending tournament.
///
/// # Errors
///
/// - `400 Bad Request`: missing `player_id`, tournament not pending, tournament
///   full, player already enrolled or unknown
/// - `404 Not Found`: unknown tournament
pub async fn enroll_player(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
    ApiJson(req): ApiJson<EnrollRequest>,
) -> ApiResult<Enrollment> {
    let player_id = req
        .player_id
        .ok_or_else(|| ApiError::validation("player_id is required"))?;

    match state.tournaments.enroll_player(id, player_id).await {
        Ok(enrollment) => {
            metrics::enrollments_total("ok");
            created(enrollment, "Player enrolled")
        }
        Err(e) => {
            metrics::enrollments_total(e.kind());
            Err(e.into())
        }
    }
}

/// Enrolled players ordered by final position.
pub async fn get_standings(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<Vec<StandingEntry>> {
    let standings = state.ranking.get_tournament_standings(id).await?;
    let message = format!("{} players enrolled", standings.len());
    ok(standings, message)
}

/// Record a player's final position, points and enrollment status.
pub async fn record_placement(
    State(state): State<AppState>,
    ApiPath((id, player_id)): ApiPath<(TournamentId, PlayerId)>,
    ApiJson(placement): ApiJson<Placement>,
) -> ApiResult<PlacementUpdate> {
    let update = state
        .tournaments
        .record_placement(id, player_id, &placement)
        .await?;
    metrics::placements_recorded_total();
    ok(update, "Placement recorded")
}

pub async fn get_stats(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<TournamentStats> {
    let stats = state.ranking.get_tournament_stats(id).await?;
    ok(stats, "Tournament statistics")
}
