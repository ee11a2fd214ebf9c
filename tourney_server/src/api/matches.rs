//! Match API handlers.
//!
//! Finishing a match with a winner updates both players' statistics in the
//! same request:
//! ```bash
//! curl -X PUT http://localhost:3000/api/v1/matches/3 \
//!   -H "Content-Type: application/json" \
//!   -d '{"player1_points": 3, "player2_points": 1, "winner_id": 7, "status": "finished"}'
//! ```

use axum::extract::State;
use serde::Deserialize;
use tourney::db::SortOrder;
use tourney::matches::{
    Match, MatchDetail, MatchFilter, MatchId, MatchPatch, MatchStatus, MatchUpdate, NewMatch,
};
use tourney::player::PlayerId;
use tourney::tournament::TournamentId;

use super::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::response::{ApiError, ApiResult, created, ok};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct ListMatchesQuery {
    pub tournament_id: Option<TournamentId>,
    pub status: Option<MatchStatus>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub tournament_id: Option<TournamentId>,
    pub player1_id: Option<PlayerId>,
    pub player2_id: Option<PlayerId>,
    pub round: Option<i32>,
}

impl TryFrom<CreateMatchRequest> for NewMatch {
    type Error = ApiError;

    fn try_from(req: CreateMatchRequest) -> Result<Self, Self::Error> {
        let (Some(tournament_id), Some(player1_id), Some(player2_id)) =
            (req.tournament_id, req.player1_id, req.player2_id)
        else {
            return Err(ApiError::validation(
                "tournament_id, player1_id and player2_id are required",
            ));
        };
        Ok(NewMatch {
            tournament_id,
            player1_id,
            player2_id,
            round: req.round,
        })
    }
}

/// List matches ordered by play time.
///
/// Query: `tournament_id`, `status`, `order` (`asc`/`desc`).
pub async fn list_matches(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListMatchesQuery>,
) -> ApiResult<Vec<MatchDetail>> {
    let filter = MatchFilter {
        tournament_id: query.tournament_id,
        status: query.status,
        order: query.order.unwrap_or_default(),
    };
    let matches = state.matches.list_matches(&filter).await?;
    let message = format!("{} matches found", matches.len());
    ok(matches, message)
}

pub async fn create_match(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateMatchRequest>,
) -> ApiResult<Match> {
    let input = NewMatch::try_from(req)?;
    let created_match = state.matches.create_match(&input).await?;
    created(created_match, "Match created")
}

pub async fn get_match(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MatchId>,
) -> ApiResult<MatchDetail> {
    let detail = state.matches.get_match(id).await?;
    ok(detail, "Match found")
}

/// Merge scores, winner, duration or status into a match.
///
/// # Errors
///
/// - `400 Bad Request`: negative values, a winner who did not play, or an
///   attempt to reopen or re-decide a finished match
/// - `404 Not Found`: unknown match
pub async fn update_match(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MatchId>,
    ApiJson(patch): ApiJson<MatchPatch>,
) -> ApiResult<MatchUpdate> {
    let update = state.matches.update_match(id, &patch).await?;
    if update.applied.is_some() {
        metrics::matches_finalized_total();
    }
    ok(update, "Match updated")
}

pub async fn delete_match(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MatchId>,
) -> ApiResult<()> {
    state.matches.delete_match(id).await?;
    ok((), "Match deleted")
}
