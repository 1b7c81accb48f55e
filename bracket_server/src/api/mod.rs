//! HTTP API for the bracket server.
//!
//! # Endpoints Overview
//!
//! ## Tournaments
//! - `GET /api/tournaments` - List active brackets
//! - `POST /api/tournaments/create-from-config` - Generate and validate a bracket
//! - `GET /api/tournaments/{id}` - Current bracket, validation and records
//! - `DELETE /api/tournaments/{id}` - Close a bracket
//! - `GET /api/tournaments/{id}/standings` - Standings, leaderboard, prediction scores
//!
//! ## Progression
//! - `POST /api/tournaments/{id}/matches/{match_id}/start` - Start a ready match
//! - `POST /api/tournaments/{id}/matches/{match_id}/result` - Record `{winner, score}`
//! - `POST /api/tournaments/{id}/leaderboard` - Record `{participant, value}`
//! - `POST /api/tournaments/{id}/predictions` - Submit `{predictor, matchId, pick}`
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bracket_server::api::{AppState, create_router};
//! use bracket_engine::bracket::BracketManager;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     manager: Arc::new(BracketManager::default()),
//! };
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use bracket_engine::bracket::BracketManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; the manager is shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<BracketManager>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let tournament_routes = Router::new()
        .route("/", get(tournaments::list_tournaments))
        .route("/create-from-config", post(tournaments::create_from_config))
        .route(
            "/{tournament_id}",
            get(tournaments::get_tournament).delete(tournaments::close_tournament),
        )
        .route("/{tournament_id}/standings", get(tournaments::get_standings))
        .route(
            "/{tournament_id}/matches/{match_id}/start",
            post(tournaments::start_match),
        )
        .route(
            "/{tournament_id}/matches/{match_id}/result",
            post(tournaments::record_result),
        )
        .route(
            "/{tournament_id}/leaderboard",
            post(tournaments::record_measurement),
        )
        .route(
            "/{tournament_id}/predictions",
            post(tournaments::submit_prediction),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/tournaments", tournament_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","brackets":{"active_count":2},...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.manager.count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "brackets": {
            "active_count": active
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
