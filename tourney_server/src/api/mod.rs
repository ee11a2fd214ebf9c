//! HTTP API for the tournament tracker.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP
//! - **Tower**: Middleware for CORS and request correlation
//! - **Managers**: every handler delegates to a `tourney` manager, which owns
//!   validation and talks to the store through repository traits
//!
//! # Modules
//!
//! - [`players`]: player accounts, statistics and the leaderboard
//! - [`tournaments`]: tournaments, enrollment, placements and standings
//! - [`matches`]: match scheduling and results
//! - [`response`]: response envelope and error-to-status mapping
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tourney_server::api::{create_router, AppState};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_router(AppState::in_memory());
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod extract;
pub mod matches;
pub mod players;
pub mod request_id;
pub mod response;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use serde_json::json;
use std::sync::Arc;
use tourney::db::{
    Database, MatchRepository, MemoryStore, PlayerRepository, RankingRepository,
    StatisticsRepository, TournamentRepository,
};
use tourney::{MatchManager, PlayerManager, RankingCalculator, TournamentManager};
use tower_http::cors::CorsLayer;

use request_id::RequestId;
use response::ApiResponse;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request (cheap due to Arc wrappers).
///
/// # Fields
///
/// - `players`: player registry and statistics
/// - `tournaments`: tournaments, enrollment and placements
/// - `matches`: match lifecycle
/// - `ranking`: leaderboard, standings and tournament summaries
/// - `database`: pool used by the health check; `None` for in-memory state
#[derive(Clone)]
pub struct AppState {
    pub players: Arc<PlayerManager>,
    pub tournaments: Arc<TournamentManager>,
    pub matches: Arc<MatchManager>,
    pub ranking: Arc<RankingCalculator>,
    pub database: Option<Database>,
}

impl AppState {
    /// Build every manager on top of one store
    pub fn new<S>(store: Arc<S>, database: Option<Database>) -> Self
    where
        S: PlayerRepository
            + TournamentRepository
            + MatchRepository
            + StatisticsRepository
            + RankingRepository
            + 'static,
    {
        Self {
            players: Arc::new(PlayerManager::new(store.clone(), store.clone())),
            tournaments: Arc::new(TournamentManager::new(store.clone())),
            matches: Arc::new(MatchManager::new(store.clone())),
            ranking: Arc::new(RankingCalculator::new(store)),
            database,
        }
    }

    /// State backed by PostgreSQL
    pub fn postgres(database: Database) -> Self {
        Self::new(Arc::new(database.store()), Some(database))
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), None)
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET    /                                        - Service banner
/// GET    /health                                  - Health check
/// GET    /api/v1/players                          - List players
/// POST   /api/v1/players                          - Register player
/// GET    /api/v1/players/ranking                  - Leaderboard
/// GET    /api/v1/players/{id}                     - Get player
/// PUT    /api/v1/players/{id}                     - Update player
/// DELETE /api/v1/players/{id}                     - Delete player
/// GET    /api/v1/players/{id}/statistics          - Player statistics
/// GET    /api/v1/players/{id}/tournaments         - Player tournaments
/// GET    /api/v1/tournaments                      - List tournaments
/// POST   /api/v1/tournaments                      - Create tournament
/// GET    /api/v1/tournaments/{id}                 - Get tournament
/// PUT    /api/v1/tournaments/{id}                 - Update tournament
/// DELETE /api/v1/tournaments/{id}                 - Delete tournament
/// GET    /api/v1/tournaments/{id}/players         - Standings
/// PUT    /api/v1/tournaments/{id}/players/{pid}   - Record placement
/// POST   /api/v1/tournaments/{id}/enroll          - Enroll player
/// GET    /api/v1/tournaments/{id}/stats           - Tournament statistics
/// GET    /api/v1/matches                          - List matches
/// POST   /api/v1/matches                          - Create match
/// GET    /api/v1/matches/{id}                     - Get match
/// PUT    /api/v1/matches/{id}                     - Update match
/// DELETE /api/v1/matches/{id}                     - Delete match
/// ```
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .fallback(route_not_found)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    let player_routes = Router::new()
        .route(
            "/players",
            get(players::list_players).post(players::create_player),
        )
        // Static segment wins over the `{id}` capture
        .route("/players/ranking", get(players::get_ranking))
        .route(
            "/players/{id}",
            get(players::get_player)
                .put(players::update_player)
                .delete(players::delete_player),
        )
        .route(
            "/players/{id}/statistics",
            get(players::get_player_statistics),
        )
        .route(
            "/players/{id}/tournaments",
            get(players::get_player_tournaments),
        );

    let tournament_routes = Router::new()
        .route(
            "/tournaments",
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route(
            "/tournaments/{id}",
            get(tournaments::get_tournament)
                .put(tournaments::update_tournament)
                .delete(tournaments::delete_tournament),
        )
        .route("/tournaments/{id}/players", get(tournaments::get_standings))
        .route(
            "/tournaments/{id}/players/{player_id}",
            put(tournaments::record_placement),
        )
        .route("/tournaments/{id}/enroll", post(tournaments::enroll_player))
        .route("/tournaments/{id}/stats", get(tournaments::get_stats));

    let match_routes = Router::new()
        .route(
            "/matches",
            get(matches::list_matches).post(matches::create_match),
        )
        .route(
            "/matches/{id}",
            get(matches::get_match)
                .put(matches::update_match)
                .delete(matches::delete_match),
        );

    Router::new()
        .merge(player_routes)
        .merge(tournament_routes)
        .merge(match_routes)
}

/// Service banner with the endpoint index
async fn index() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Tournament tracker API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "players": "/api/v1/players",
            "tournaments": "/api/v1/tournaments",
            "matches": "/api/v1/matches",
            "health": "/health",
        },
    }))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers, `503 Service Unavailable`
/// otherwise. In-memory state is always healthy.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"0.1.0","database":true,"store":"postgres","timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (store, db_healthy) = match &state.database {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "store": store,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

async fn route_not_found(request_id: RequestId, uri: Uri) -> impl IntoResponse {
    tracing::debug!(request_id = %request_id.as_str(), "No route for {}", uri);
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure(
            format!("Route not found: {}", uri.path()),
            "not_found",
        )),
    )
}
