//! Tournament API handlers.
//!
//! Generation, inspection and progression of brackets. Every failure is
//! answered with `{success: false, error}` and a status derived from the
//! engine error.
//!
//! # Examples
//!
//! Create a bracket:
//! ```bash
//! curl -X POST http://localhost:6969/api/tournaments/create-from-config \
//!   -H "Content-Type: application/json" \
//!   -d '{"config":{"stages":[{"engine":"double"}]},"participants":["A","B","C","D"]}'
//! ```
//!
//! Report a result:
//! ```bash
//! curl -X POST http://localhost:6969/api/tournaments/ID/matches/1/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"winner": 1, "score": {"a": 3, "b": 1}}'
//! ```

use super::AppState;
use super::request_id::RequestId;
use crate::{logging, metrics};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use bracket_engine::bracket::{BracketSnapshot, BracketSummary, ManagerError, TournamentId};
use bracket_engine::graph::{
    Leaderboard, Match, Participant, Pool, Predictor, RoundView, Score, Seed,
};
use bracket_engine::progression::ParticipantRecord;
use bracket_engine::standings::StandingsView;
use bracket_engine::{
    BracketError, CreateRequest, Engine, Format, MatchGraph, MatchId, ParticipantId, Progress,
    ValidationReport,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One round of one named bracket
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundEntry {
    pub bracket: String,
    pub round: u32,
    pub schedule_round: u32,
    pub matches: Vec<Match>,
}

impl From<RoundView<'_>> for RoundEntry {
    fn from(view: RoundView<'_>) -> Self {
        Self {
            bracket: view.bracket.to_string(),
            round: view.round,
            schedule_round: view.schedule_round,
            matches: view.matches.into_iter().cloned().collect(),
        }
    }
}

/// Wire shape of a generated bracket
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketStructure {
    pub tournament_type: Format,
    pub config_engine: Engine,
    pub total_rounds: u32,
    pub total_matches: u32,
    pub participants: Vec<Participant>,
    pub seeds: Vec<Seed>,
    pub rounds: Vec<RoundEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lives: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<Pool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Leaderboard>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub predictors: Vec<Predictor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    pub eliminated: Vec<ParticipantId>,
    pub complete: bool,
}

impl From<&MatchGraph> for BracketStructure {
    fn from(graph: &MatchGraph) -> Self {
        Self {
            tournament_type: graph.tournament_type,
            config_engine: graph.config_engine,
            total_rounds: graph.total_rounds,
            total_matches: graph.total_matches,
            participants: graph.participants.clone(),
            seeds: graph.seeds.clone(),
            rounds: graph.rounds().into_iter().map(RoundEntry::from).collect(),
            lives: graph.lives,
            pools: graph.pools.clone(),
            leaderboard: graph.leaderboard.clone(),
            predictors: graph
                .predictions
                .as_ref()
                .map(|pool| pool.predictors.clone())
                .unwrap_or_default(),
            random_seed: graph.random_seed,
            eliminated: graph.eliminated.clone(),
            complete: graph.is_complete(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub success: bool,
    pub tournament_id: TournamentId,
    pub name: String,
    pub bracket_structure: BracketStructure,
    pub validation: ValidationReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResponse {
    pub success: bool,
    pub tournament_id: TournamentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub bracket_structure: BracketStructure,
    pub validation: ValidationReport,
    pub records: Vec<ParticipantRecord>,
}

impl From<BracketSnapshot> for TournamentResponse {
    fn from(snapshot: BracketSnapshot) -> Self {
        Self {
            success: true,
            tournament_id: snapshot.id,
            bracket_structure: BracketStructure::from(&snapshot.graph),
            name: snapshot.name,
            created_at: snapshot.created_at,
            validation: snapshot.validation,
            records: snapshot.records,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub success: bool,
    #[serde(rename = "match")]
    pub started: Match,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub progress: Progress,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    /// Absent or null reports a draw
    #[serde(default)]
    pub winner: Option<ParticipantId>,
    #[serde(default)]
    pub score: Option<Score>,
}

#[derive(Debug, Deserialize)]
pub struct MeasurementRequest {
    pub participant: ParticipantId,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub predictor: String,
    pub match_id: MatchId,
    pub pick: ParticipantId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket_structure: Option<BracketStructure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            bracket_structure: None,
            validation: None,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// HTTP status for an engine error
pub fn status_for(err: &BracketError) -> StatusCode {
    match err {
        BracketError::Configuration(_)
        | BracketError::UnsupportedFormat(_)
        | BracketError::InvalidResult(_) => StatusCode::BAD_REQUEST,
        BracketError::AlreadyResolved(_)
        | BracketError::MeasurementRecorded(_)
        | BracketError::MatchNotReady(_)
        | BracketError::InvalidTransition { .. }
        | BracketError::PredictionLocked(_) => StatusCode::CONFLICT,
        BracketError::MatchNotFound(_)
        | BracketError::UnknownParticipant(_)
        | BracketError::UnknownPredictor(_) => StatusCode::NOT_FOUND,
        BracketError::InternalInvariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ManagerError) -> ApiError {
    match err {
        ManagerError::NotFound(_) => (StatusCode::NOT_FOUND, Json(ErrorResponse::new(err.to_string()))),
        ManagerError::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(err.to_string())),
        ),
        ManagerError::Inconsistent(generated) => {
            let message = format!(
                "Internal invariant violated: {}",
                generated.validation.issues.join("; ")
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    error: message,
                    bracket_structure: Some(BracketStructure::from(&generated.graph)),
                    validation: Some(generated.validation),
                }),
            )
        }
        ManagerError::Bracket(e) => (status_for(&e), Json(ErrorResponse::new(e.to_string()))),
    }
}

/// 400 with the usual error body for a payload axum could not decode
fn rejected_body(context: &str, rejection: JsonRejection) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(format!("{context}: {}", rejection.body_text()))),
    )
}

fn rejection_reason(err: &ManagerError) -> &'static str {
    match err {
        ManagerError::Bracket(BracketError::UnsupportedFormat(_)) => "unsupported_format",
        ManagerError::Bracket(BracketError::Configuration(_)) => "configuration",
        ManagerError::Inconsistent(_) => "inconsistent",
        _ => "internal",
    }
}

/// List all active brackets, newest first.
pub async fn list_tournaments(State(state): State<AppState>) -> Json<Vec<BracketSummary>> {
    Json(state.manager.list().await)
}

/// Generate, validate and register a bracket.
///
/// # Response
///
/// Returns `200 OK` with:
/// ```json
/// {
///   "success": true,
///   "tournamentId": "6f1c...",
///   "bracketStructure": { "rounds": [...], "totalRounds": 6, "totalMatches": 14 },
///   "validation": { "expectedMatches": 14, "actualMatches": 14, "mathematicsCorrect": true }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body, bad configuration or unknown format
/// - `500 Internal Server Error`: Generated bracket failed validation; the
///   body carries the bracket and its report
pub async fn create_from_config(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> ApiResult<CreateResponse> {
    let Json(request) = payload.map_err(|rejection| {
        metrics::generation_rejected_total("invalid_request");
        rejected_body("Configuration error", rejection)
    })?;

    let started = Instant::now();
    let created = state.manager.create(&request).await;
    logging::log_performance("generate", started.elapsed(), Some(request_id.as_str()));

    let snapshot = created.map_err(|err| {
        if let ManagerError::Inconsistent(generated) = &err {
            let tournament_type = generated.graph.tournament_type.to_string();
            logging::log_validation_failure(&tournament_type, &generated.validation.issues);
            metrics::validation_failures_total(&tournament_type);
        } else {
            tracing::warn!(request_id = %request_id.as_str(), "Bracket rejected: {}", err);
        }
        metrics::generation_rejected_total(rejection_reason(&err));
        api_error(err)
    })?;

    let tournament_type = snapshot.graph.tournament_type.to_string();
    logging::log_bracket_generated(
        &snapshot.id.to_string(),
        &tournament_type,
        snapshot.graph.participants.len(),
        snapshot.graph.total_matches,
        snapshot.graph.total_rounds,
    );
    metrics::brackets_generated_total(&tournament_type);
    metrics::bracket_matches(snapshot.graph.total_matches);
    metrics::active_brackets(state.manager.count().await);

    Ok(Json(CreateResponse {
        success: true,
        tournament_id: snapshot.id,
        bracket_structure: BracketStructure::from(&snapshot.graph),
        name: snapshot.name,
        validation: snapshot.validation,
    }))
}

/// Current bracket, validation report and participant records.
///
/// # Errors
///
/// - `404 Not Found`: Unknown tournament
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<TournamentResponse> {
    let snapshot = state
        .manager
        .snapshot(tournament_id)
        .await
        .map_err(api_error)?;
    Ok(Json(TournamentResponse::from(snapshot)))
}

/// Close a bracket and stop its actor.
pub async fn close_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<SuccessResponse> {
    state.manager.close(tournament_id).await.map_err(api_error)?;
    metrics::active_brackets(state.manager.count().await);
    Ok(Json(SuccessResponse { success: true }))
}

/// Standings table, pool tables, leaderboard and prediction scores.
pub async fn get_standings(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<StandingsView> {
    let standings = state
        .manager
        .standings(tournament_id)
        .await
        .map_err(api_error)?;
    Ok(Json(standings))
}

/// Move a ready match to in-progress.
///
/// # Errors
///
/// - `404 Not Found`: Unknown tournament or match
/// - `409 Conflict`: Match not ready, already started or resolved
pub async fn start_match(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, u32)>,
) -> ApiResult<MatchResponse> {
    let started = state
        .manager
        .start_match(tournament_id, MatchId(match_id))
        .await
        .map_err(api_error)?;
    Ok(Json(MatchResponse {
        success: true,
        started,
    }))
}

/// Record a match result and advance the bracket.
///
/// # Request Body
///
/// ```json
/// { "winner": 3, "score": { "a": 2, "b": 1 } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body, winner not in the match, draw where
///   none is allowed, or a score that disagrees with the winner
/// - `404 Not Found`: Unknown tournament or match
/// - `409 Conflict`: Match already resolved or not ready
pub async fn record_result(
    State(state): State<AppState>,
    Path((tournament_id, match_id)): Path<(TournamentId, u32)>,
    payload: Result<Json<ResultRequest>, JsonRejection>,
) -> ApiResult<ProgressResponse> {
    let Json(body) = payload.map_err(|rejection| rejected_body("Invalid result", rejection))?;
    let progress = state
        .manager
        .record_result(tournament_id, MatchId(match_id), body.winner, body.score)
        .await
        .map_err(api_error)?;

    logging::log_result_applied(&tournament_id.to_string(), match_id, progress.completed);
    metrics::results_applied_total();
    if progress.completed {
        metrics::brackets_completed_total();
    }

    Ok(Json(ProgressResponse {
        success: true,
        progress,
    }))
}

/// Record a leaderboard measurement.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body
/// - `404 Not Found`: Unknown tournament or participant
/// - `409 Conflict`: Measurement already recorded
pub async fn record_measurement(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    payload: Result<Json<MeasurementRequest>, JsonRejection>,
) -> ApiResult<ProgressResponse> {
    let Json(body) = payload.map_err(|rejection| rejected_body("Invalid measurement", rejection))?;
    let progress = state
        .manager
        .record_measurement(tournament_id, body.participant, body.value)
        .await
        .map_err(api_error)?;

    if progress.completed {
        metrics::brackets_completed_total();
    }
    Ok(Json(ProgressResponse {
        success: true,
        progress,
    }))
}

/// Submit or replace a prediction.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body
/// - `404 Not Found`: Unknown tournament, predictor, match or participant
/// - `409 Conflict`: Match already started
pub async fn submit_prediction(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let Json(body) = payload.map_err(|rejection| rejected_body("Invalid prediction", rejection))?;
    state
        .manager
        .submit_pick(tournament_id, body.predictor, body.match_id, body.pick)
        .await
        .map_err(api_error)?;
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&BracketError::config("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&BracketError::UnsupportedFormat("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&BracketError::AlreadyResolved(MatchId(1))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&BracketError::MatchNotFound(MatchId(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&BracketError::InternalInvariant("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "error": "nope"}));
    }

    #[test]
    fn test_draw_request_defaults() {
        let body: ResultRequest = serde_json::from_str("{}").unwrap();
        assert!(body.winner.is_none());
        assert!(body.score.is_none());
    }
}
