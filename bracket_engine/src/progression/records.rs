//! Per-participant win/loss records.

use crate::graph::{MatchGraph, MatchStatus, ParticipantId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub participant: ParticipantId,
    pub name: String,
    pub seed: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,

    /// Lives left in a multi-life elimination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lives_remaining: Option<u32>,

    pub eliminated: bool,
}

impl MatchGraph {
    /// Record of every participant in seed order; byes are not counted
    pub fn records(&self) -> Vec<ParticipantRecord> {
        self.seeded_participants()
            .into_iter()
            .map(|participant| {
                let mut record = ParticipantRecord {
                    participant,
                    name: self
                        .participant(participant)
                        .map(|p| p.name.clone())
                        .unwrap_or_default(),
                    seed: self.seed_of(participant).unwrap_or_default(),
                    wins: 0,
                    losses: 0,
                    draws: 0,
                    lives_remaining: None,
                    eliminated: self.eliminated.contains(&participant),
                };

                for m in self
                    .matches
                    .iter()
                    .filter(|m| m.status == MatchStatus::Completed && m.involves(participant))
                {
                    match m.winner() {
                        Some(w) if w == participant => record.wins += 1,
                        Some(_) => record.losses += 1,
                        None => record.draws += 1,
                    }
                }
                record.lives_remaining = self.lives.map(|lives| lives.saturating_sub(record.losses));
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::formats::test_support::build;
    use crate::graph::{MatchId, ParticipantId};
    use serde_json::json;

    #[test]
    fn test_lives_drop_with_losses() {
        let (mut graph, _) = build(4, json!({"engine": "double"}), json!({}));
        graph
            .apply_result(MatchId(1), Some(ParticipantId(4)), None)
            .unwrap();

        let records = graph.records();
        let top_seed = &records[0];
        assert_eq!(top_seed.losses, 1);
        assert_eq!(top_seed.lives_remaining, Some(1));
        assert!(!top_seed.eliminated);

        let bottom_seed = &records[3];
        assert_eq!(bottom_seed.wins, 1);
        assert_eq!(bottom_seed.lives_remaining, Some(2));
    }
}
