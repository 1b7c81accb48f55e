//! Bracket actor message types.

use super::TournamentId;
use crate::errors::BracketResult;
use crate::graph::{Match, MatchGraph, MatchId, ParticipantId, Score};
use crate::progression::{ParticipantRecord, Progress};
use crate::standings::StandingsView;
use crate::validator::ValidationReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

/// Messages that can be sent to a BracketActor
#[derive(Debug)]
pub enum BracketMessage {
    /// Full bracket state
    GetSnapshot {
        response: oneshot::Sender<BracketSnapshot>,
    },

    /// Mark a ready match as in progress
    StartMatch {
        match_id: MatchId,
        response: oneshot::Sender<BracketResult<Match>>,
    },

    /// Report a match outcome
    RecordResult {
        match_id: MatchId,
        winner: Option<ParticipantId>,
        score: Option<Score>,
        response: oneshot::Sender<BracketResult<Progress>>,
    },

    /// Record a leaderboard value
    RecordMeasurement {
        participant: ParticipantId,
        value: f64,
        response: oneshot::Sender<BracketResult<Progress>>,
    },

    /// Predictor pick for a match
    SubmitPick {
        predictor: String,
        match_id: MatchId,
        participant: ParticipantId,
        response: oneshot::Sender<BracketResult<()>>,
    },

    GetStandings {
        response: oneshot::Sender<StandingsView>,
    },

    /// Stop the actor
    Close { response: oneshot::Sender<()> },
}

/// Point-in-time copy of a bracket
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSnapshot {
    pub id: TournamentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub graph: MatchGraph,
    pub validation: ValidationReport,
    pub records: Vec<ParticipantRecord>,
}

/// Listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSummary {
    pub id: TournamentId,
    pub name: String,
    pub tournament_type: String,
    pub participant_count: usize,
    pub total_matches: u32,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&BracketSnapshot> for BracketSummary {
    fn from(snapshot: &BracketSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name.clone(),
            tournament_type: snapshot.graph.tournament_type.to_string(),
            participant_count: snapshot.graph.participants.len(),
            total_matches: snapshot.graph.total_matches,
            complete: snapshot.graph.is_complete(),
            created_at: snapshot.created_at,
        }
    }
}
