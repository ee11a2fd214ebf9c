//! Player API handlers.
//!
//! # Examples
//!
//! Register a player:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/players \
//!   -H "Content-Type: application/json" \
//!   -d '{"nickname": "ace", "email": "ace@example.com", "country": "PL"}'
//! ```
//!
//! Top ten:
//! ```bash
//! curl http://localhost:3000/api/v1/players/ranking?limit=10
//! ```

use axum::extract::State;
use serde::Deserialize;
use tourney::db::SortOrder;
use tourney::player::{
    DEFAULT_PLAYER_LIMIT, NewPlayer, Player, PlayerFilter, PlayerId, PlayerPatch, PlayerStatus,
    PlayerTournament,
};
use tourney::ranking::RankingEntry;
use tourney::stats::StatisticsSummary;

use super::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::response::{ApiError, ApiResult, created, ok};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct ListPlayersQuery {
    pub status: Option<PlayerStatus>,
    pub order: Option<SortOrder>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub country: Option<String>,
}

impl TryFrom<CreatePlayerRequest> for NewPlayer {
    type Error = ApiError;

    fn try_from(req: CreatePlayerRequest) -> Result<Self, Self::Error> {
        let (Some(nickname), Some(email)) = (req.nickname, req.email) else {
            return Err(ApiError::validation("nickname and email are required"));
        };
        Ok(NewPlayer {
            nickname,
            email,
            full_name: req.full_name,
            country: req.country,
        })
    }
}

/// List players ordered by total points.
///
/// Query: `status` (`active`/`inactive`), `order` (`asc`/`desc`, default
/// `desc`), `limit` (default 50).
pub async fn list_players(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPlayersQuery>,
) -> ApiResult<Vec<Player>> {
    let filter = PlayerFilter {
        status: query.status,
        order: query.order.unwrap_or_default(),
        limit: query.limit.unwrap_or(DEFAULT_PLAYER_LIMIT),
    };
    let players = state.players.list_players(&filter).await?;
    let message = format!("{} players found", players.len());
    ok(players, message)
}

/// Register a player.
///
/// # Errors
///
/// - `400 Bad Request`: missing nickname/email, malformed email, or duplicate nickname/email
pub async fn create_player(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePlayerRequest>,
) -> ApiResult<Player> {
    let input = NewPlayer::try_from(req)?;
    let player = state.players.create_player(&input).await?;
    metrics::players_registered_total();
    created(player, "Player created")
}

/// Leaderboard of active players.
pub async fn get_ranking(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RankingQuery>,
) -> ApiResult<Vec<RankingEntry>> {
    let ranking = state.ranking.get_ranking(query.limit).await?;
    let message = format!("Top {} players", ranking.len());
    ok(ranking, message)
}

pub async fn get_player(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PlayerId>,
) -> ApiResult<Player> {
    let player = state.players.get_player(id).await?;
    ok(player, "Player found")
}

/// Update `full_name`, `country` or `status`; omitted fields are kept.
pub async fn update_player(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PlayerId>,
    ApiJson(patch): ApiJson<PlayerPatch>,
) -> ApiResult<Player> {
    let player = state.players.update_player(id, &patch).await?;
    ok(player, "Player updated")
}

pub async fn delete_player(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PlayerId>,
) -> ApiResult<()> {
    state.players.delete_player(id).await?;
    ok((), "Player deleted")
}

pub async fn get_player_statistics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PlayerId>,
) -> ApiResult<StatisticsSummary> {
    let summary = state.players.get_statistics(id).await?;
    ok(summary, "Statistics retrieved")
}

pub async fn get_player_tournaments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PlayerId>,
) -> ApiResult<Vec<PlayerTournament>> {
    let tournaments = state.players.get_tournaments(id).await?;
    let message = format!("{} tournaments found", tournaments.len());
    ok(tournaments, message)
}
