//! Bracket actor: owns one tournament's graph and serializes every mutation.

use super::TournamentId;
use super::messages::{BracketMessage, BracketSnapshot};
use crate::engine::GeneratedBracket;
use crate::graph::MatchGraph;
use crate::standings;
use crate::validator::ValidationReport;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Default capacity of an actor inbox
pub const DEFAULT_INBOX_SIZE: usize = 100;

/// Bracket actor handle for sending messages
#[derive(Debug, Clone)]
pub struct BracketHandle {
    sender: mpsc::Sender<BracketMessage>,
    id: TournamentId,
}

impl BracketHandle {
    pub fn new(sender: mpsc::Sender<BracketMessage>, id: TournamentId) -> Self {
        Self { sender, id }
    }

    pub fn id(&self) -> TournamentId {
        self.id
    }

    /// Send a message to the bracket
    pub async fn send(&self, message: BracketMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Bracket is closed".to_string())
    }
}

/// Actor managing a single tournament bracket
pub struct BracketActor {
    id: TournamentId,
    name: String,
    created_at: DateTime<Utc>,
    graph: MatchGraph,
    validation: ValidationReport,
    inbox: mpsc::Receiver<BracketMessage>,
    is_closed: bool,
}

impl BracketActor {
    /// Create a new bracket actor
    ///
    /// # Returns
    ///
    /// * `(BracketActor, BracketHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TournamentId,
        name: String,
        generated: GeneratedBracket,
        inbox_size: usize,
    ) -> (Self, BracketHandle) {
        let (sender, inbox) = mpsc::channel(inbox_size.max(1));

        let actor = Self {
            id,
            name,
            created_at: Utc::now(),
            graph: generated.graph,
            validation: generated.validation,
            inbox,
            is_closed: false,
        };

        (actor, BracketHandle::new(sender, id))
    }

    /// Run the bracket actor event loop
    pub async fn run(mut self) {
        log::info!("Bracket {} '{}' starting", self.id, self.name);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.is_closed {
                break;
            }
        }

        log::info!("Bracket {} '{}' closed", self.id, self.name);
    }

    fn handle_message(&mut self, message: BracketMessage) {
        match message {
            BracketMessage::GetSnapshot { response } => {
                let _ = response.send(self.snapshot());
            }

            BracketMessage::StartMatch { match_id, response } => {
                let result = self.graph.start_match(match_id).cloned();
                let _ = response.send(result);
            }

            BracketMessage::RecordResult {
                match_id,
                winner,
                score,
                response,
            } => {
                let result = self.graph.apply_result(match_id, winner, score);
                if let Err(e) = &result {
                    log::debug!("Bracket {}: result for match {} rejected: {}", self.id, match_id, e);
                }
                let _ = response.send(result);
            }

            BracketMessage::RecordMeasurement {
                participant,
                value,
                response,
            } => {
                let result = self.graph.record_measurement(participant, value);
                let _ = response.send(result);
            }

            BracketMessage::SubmitPick {
                predictor,
                match_id,
                participant,
                response,
            } => {
                let result = self.graph.submit_pick(&predictor, match_id, participant);
                let _ = response.send(result);
            }

            BracketMessage::GetStandings { response } => {
                let _ = response.send(standings::summarize(&self.graph));
            }

            BracketMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    fn snapshot(&self) -> BracketSnapshot {
        BracketSnapshot {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
            graph: self.graph.clone(),
            validation: self.validation.clone(),
            records: self.graph.records(),
        }
    }
}
