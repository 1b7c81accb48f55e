//! Bracket manager for spawning and addressing bracket actors.

use super::TournamentId;
use super::actor::{BracketActor, BracketHandle, DEFAULT_INBOX_SIZE};
use super::messages::{BracketMessage, BracketSnapshot, BracketSummary};
use crate::config::Limits;
use crate::engine::{CreateRequest, GeneratedBracket, generate};
use crate::errors::BracketError;
use crate::graph::{Match, MatchId, ParticipantId, Score};
use crate::progression::Progress;
use crate::standings::StandingsView;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::{RwLock, oneshot};
use uuid::Uuid;

const UNTITLED: &str = "Untitled tournament";

/// Errors surfaced by the manager
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Tournament {0} not found")]
    NotFound(TournamentId),

    #[error("Tournament {0} is not responding")]
    Unavailable(TournamentId),

    /// Generated graph failed validation; carries it for inspection
    #[error("Generated bracket failed validation")]
    Inconsistent(Box<GeneratedBracket>),

    #[error(transparent)]
    Bracket(#[from] BracketError),
}

/// Result type for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Bracket manager for managing multiple tournament brackets
#[derive(Clone)]
pub struct BracketManager {
    limits: Limits,
    inbox_size: usize,

    /// Active bracket handles
    brackets: Arc<RwLock<HashMap<TournamentId, BracketHandle>>>,
}

impl Default for BracketManager {
    fn default() -> Self {
        Self::new(Limits::default(), DEFAULT_INBOX_SIZE)
    }
}

impl BracketManager {
    pub fn new(limits: Limits, inbox_size: usize) -> Self {
        Self {
            limits,
            inbox_size,
            brackets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Generate, validate and spawn a bracket
    ///
    /// # Returns
    ///
    /// * `ManagerResult<BracketSnapshot>` - State of the new bracket
    pub async fn create(&self, request: &CreateRequest) -> ManagerResult<BracketSnapshot> {
        let generated = generate(request, &self.limits)?;
        if generated.ensure_consistent().is_err() {
            log::error!(
                "Refusing inconsistent {} bracket: {:?}",
                generated.graph.tournament_type,
                generated.validation.issues
            );
            return Err(ManagerError::Inconsistent(Box::new(generated)));
        }

        let id = Uuid::new_v4();
        let name = match request.config.meta.name.trim() {
            "" => UNTITLED.to_string(),
            name => name.to_string(),
        };
        let (actor, handle) = BracketActor::new(id, name, generated, self.inbox_size);

        let mut brackets = self.brackets.write().await;
        brackets.insert(id, handle);
        drop(brackets);

        tokio::spawn(actor.run());
        log::info!("Created and spawned bracket {}", id);

        self.snapshot(id).await
    }

    pub async fn get_bracket(&self, id: TournamentId) -> Option<BracketHandle> {
        let brackets = self.brackets.read().await;
        brackets.get(&id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.brackets.read().await.len()
    }

    async fn request<T>(
        &self,
        id: TournamentId,
        message: impl FnOnce(oneshot::Sender<T>) -> BracketMessage,
    ) -> ManagerResult<T> {
        let handle = self.get_bracket(id).await.ok_or(ManagerError::NotFound(id))?;

        let (tx, rx) = oneshot::channel();
        handle
            .send(message(tx))
            .await
            .map_err(|_| ManagerError::Unavailable(id))?;
        rx.await.map_err(|_| ManagerError::Unavailable(id))
    }

    pub async fn snapshot(&self, id: TournamentId) -> ManagerResult<BracketSnapshot> {
        self.request(id, |response| BracketMessage::GetSnapshot { response })
            .await
    }

    /// Summaries of every active bracket, newest first
    pub async fn list(&self) -> Vec<BracketSummary> {
        let ids: Vec<TournamentId> = self.brackets.read().await.keys().copied().collect();

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            match self.snapshot(id).await {
                Ok(snapshot) => summaries.push(BracketSummary::from(&snapshot)),
                Err(e) => log::warn!("Skipping bracket {} in listing: {}", id, e),
            }
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    pub async fn start_match(&self, id: TournamentId, match_id: MatchId) -> ManagerResult<Match> {
        let result = self
            .request(id, |response| BracketMessage::StartMatch { match_id, response })
            .await?;
        Ok(result?)
    }

    pub async fn record_result(
        &self,
        id: TournamentId,
        match_id: MatchId,
        winner: Option<ParticipantId>,
        score: Option<Score>,
    ) -> ManagerResult<Progress> {
        let result = self
            .request(id, |response| BracketMessage::RecordResult {
                match_id,
                winner,
                score,
                response,
            })
            .await?;
        Ok(result?)
    }

    pub async fn record_measurement(
        &self,
        id: TournamentId,
        participant: ParticipantId,
        value: f64,
    ) -> ManagerResult<Progress> {
        let result = self
            .request(id, |response| BracketMessage::RecordMeasurement {
                participant,
                value,
                response,
            })
            .await?;
        Ok(result?)
    }

    pub async fn submit_pick(
        &self,
        id: TournamentId,
        predictor: String,
        match_id: MatchId,
        participant: ParticipantId,
    ) -> ManagerResult<()> {
        let result = self
            .request(id, |response| BracketMessage::SubmitPick {
                predictor,
                match_id,
                participant,
                response,
            })
            .await?;
        Ok(result?)
    }

    pub async fn standings(&self, id: TournamentId) -> ManagerResult<StandingsView> {
        self.request(id, |response| BracketMessage::GetStandings { response })
            .await
    }

    /// Stop a bracket's actor and forget it
    pub async fn close(&self, id: TournamentId) -> ManagerResult<()> {
        self.request(id, |response| BracketMessage::Close { response })
            .await?;

        let mut brackets = self.brackets.write().await;
        brackets.remove(&id);
        drop(brackets);

        log::info!("Closed bracket {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(engine: &str, n: usize) -> CreateRequest {
        serde_json::from_value(json!({
            "config": {"meta": {"name": "Club Night"}, "stages": [{"engine": engine}]},
            "participants": (1..=n).map(|i| format!("P{i}")).collect::<Vec<_>>()
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_snapshot() {
        let manager = BracketManager::default();
        let snapshot = manager.create(&request("single", 8)).await.unwrap();

        assert_eq!(snapshot.name, "Club Night");
        assert_eq!(snapshot.graph.total_matches, 7);
        assert_eq!(manager.count().await, 1);

        let again = manager.snapshot(snapshot.id).await.unwrap();
        assert_eq!(again.graph, snapshot.graph);
    }

    #[tokio::test]
    async fn test_results_flow_through_actor() {
        let manager = BracketManager::default();
        let id = manager.create(&request("single", 2)).await.unwrap().id;

        manager.start_match(id, MatchId(1)).await.unwrap();
        let progress = manager
            .record_result(id, MatchId(1), Some(ParticipantId(1)), None)
            .await
            .unwrap();
        assert!(progress.completed);

        let err = manager
            .record_result(id, MatchId(1), Some(ParticipantId(1)), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Bracket(BracketError::AlreadyResolved(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_tournament() {
        let manager = BracketManager::default();
        let missing = Uuid::new_v4();
        assert!(matches!(
            manager.snapshot(missing).await,
            Err(ManagerError::NotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_close_removes_bracket() {
        let manager = BracketManager::default();
        let id = manager.create(&request("round_robin", 4)).await.unwrap().id;
        manager.close(id).await.unwrap();

        assert_eq!(manager.count().await, 0);
        assert!(manager.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_config_errors_are_not_spawned() {
        let manager = BracketManager::default();
        let err = manager.create(&request("single", 1)).await.unwrap_err();
        assert!(matches!(err, ManagerError::Bracket(BracketError::Configuration(_))));
        assert_eq!(manager.count().await, 0);
    }
}
