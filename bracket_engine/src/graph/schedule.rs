//! Schedule rounds and the round-grouped view of a graph.

use super::models::{Match, MatchGraph, MatchId, Slot};
use serde::Serialize;
use std::collections::HashMap;

impl MatchGraph {
    /// Assign every match its global schedule round
    ///
    /// A match is played one round after the later of its inputs and the
    /// previous round of its own bracket. Runs before any slot is resolved
    /// so references are still visible.
    pub(crate) fn compute_schedule(&mut self) {
        let mut by_id: HashMap<MatchId, u32> = HashMap::with_capacity(self.matches.len());
        let mut by_round: HashMap<(String, u32), u32> = HashMap::new();
        let mut by_bracket: HashMap<String, u32> = HashMap::new();

        for m in &mut self.matches {
            let mut base = by_round
                .get(&(m.bracket.clone(), m.round.saturating_sub(1)))
                .copied()
                .unwrap_or(0);

            for slot in [&m.slot_a, &m.slot_b] {
                match slot {
                    Slot::MatchRef { match_id, .. } => {
                        base = base.max(by_id.get(match_id).copied().unwrap_or(0));
                    }
                    Slot::Placement { pool, .. } => {
                        base = base.max(by_bracket.get(pool).copied().unwrap_or(0));
                    }
                    _ => {}
                }
            }

            m.schedule_round = base + 1;
            by_id.insert(m.id, m.schedule_round);
            let round_max = by_round.entry((m.bracket.clone(), m.round)).or_insert(0);
            *round_max = (*round_max).max(m.schedule_round);
            let bracket_max = by_bracket.entry(m.bracket.clone()).or_insert(0);
            *bracket_max = (*bracket_max).max(m.schedule_round);
        }

        self.refresh_totals();
    }

    /// Push dependants of `source` later after it was rescheduled
    pub(crate) fn reschedule_from(&mut self, source: MatchId) {
        let mut changed = vec![source];
        while let Some(id) = changed.pop() {
            let Some(at) = self.get(id).map(|m| m.schedule_round) else {
                continue;
            };
            for m in &mut self.matches {
                let depends = [&m.slot_a, &m.slot_b]
                    .iter()
                    .any(|slot| matches!(slot, Slot::MatchRef { match_id, .. } if *match_id == id));
                if depends && m.schedule_round <= at {
                    m.schedule_round = at + 1;
                    changed.push(m.id);
                }
            }
        }
        self.refresh_totals();
    }

    pub(crate) fn refresh_totals(&mut self) {
        self.total_matches = self.contested_matches() as u32;
        self.total_rounds = self
            .matches
            .iter()
            .map(|m| m.schedule_round)
            .max()
            .unwrap_or(0)
            // A leaderboard event is one round without matches
            .max(u32::from(self.leaderboard.is_some()));
    }

    /// Matches grouped by bracket and round, in creation order
    pub fn rounds(&self) -> Vec<RoundView<'_>> {
        let mut rounds: Vec<RoundView<'_>> = Vec::new();
        let mut index: HashMap<(&str, u32), usize> = HashMap::new();

        for m in &self.matches {
            let key = (m.bracket.as_str(), m.round);
            match index.get(&key) {
                Some(&idx) => rounds[idx].matches.push(m),
                None => {
                    index.insert(key, rounds.len());
                    rounds.push(RoundView {
                        bracket: &m.bracket,
                        round: m.round,
                        schedule_round: m.schedule_round,
                        matches: vec![m],
                    });
                }
            }
        }

        for round in &mut rounds {
            round.schedule_round = round
                .matches
                .iter()
                .map(|m| m.schedule_round)
                .min()
                .unwrap_or(round.schedule_round);
        }
        rounds.sort_by(|a, b| {
            a.schedule_round
                .cmp(&b.schedule_round)
                .then_with(|| a.matches[0].id.cmp(&b.matches[0].id))
        });
        rounds
    }
}

/// Matches of one round of one named bracket
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView<'a> {
    pub bracket: &'a str,
    pub round: u32,
    pub schedule_round: u32,
    pub matches: Vec<&'a Match>,
}
