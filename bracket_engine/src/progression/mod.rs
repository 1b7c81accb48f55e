//! Progression: applying results and advancing participants.
//!
//! Every mutation goes through [`MatchGraph`] methods so slot substitution,
//! bye cascades, pool placements and Swiss pairing stay in one place. A
//! failed operation leaves the graph untouched.
//!
//! ## Example
//!
//! ```
//! use bracket_engine::config::Limits;
//! use bracket_engine::engine::{CreateRequest, generate};
//! use bracket_engine::graph::MatchId;
//!
//! let request: CreateRequest = serde_json::from_value(serde_json::json!({
//!     "config": { "stages": [{ "engine": "single" }] },
//!     "participants": ["Ada", "Bo", "Cy", "Di"]
//! })).unwrap();
//! let mut graph = generate(&request, &Limits::default()).unwrap().graph;
//!
//! let first = graph.get(MatchId(1)).unwrap().clone();
//! let winner = first.slot_a.participant_id();
//! let progress = graph.apply_result(first.id, winner, None).unwrap();
//! assert!(!progress.completed);
//! ```

pub mod records;

pub use records::ParticipantRecord;

use crate::errors::{BracketError, BracketResult};
use crate::formats::round_robin::ROUND_ROBIN_BRACKET;
use crate::formats::swiss::{PairingInput, SWISS_BRACKET, pair_key, pair_round};
use crate::graph::{
    Match, MatchGraph, MatchId, MatchResult, MatchStatus, ParticipantId, Pick, Score, Slot,
    SlotRole,
};
use crate::standings;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// What changed as a consequence of one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Matches that received a concrete participant in a slot
    pub filled: Vec<MatchId>,

    /// Byes resolved by the cascade
    pub byes: Vec<MatchId>,

    /// Rematches appended under a series rule
    pub appended: Vec<MatchId>,

    pub eliminated: Vec<ParticipantId>,

    /// Swiss round paired by this operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paired_round: Option<u32>,

    pub completed: bool,
}

impl MatchGraph {
    fn find(&self, id: MatchId) -> BracketResult<usize> {
        self.index_of(id).ok_or(BracketError::MatchNotFound(id))
    }

    /// Move a ready match from Scheduled to InProgress
    pub fn start_match(&mut self, id: MatchId) -> BracketResult<&Match> {
        let idx = self.find(id)?;
        let m = &self.matches[idx];
        if m.is_resolved() {
            return Err(BracketError::AlreadyResolved(id));
        }
        if m.status != MatchStatus::Scheduled {
            return Err(BracketError::InvalidTransition {
                match_id: id,
                status: m.status.to_string(),
            });
        }
        if !m.is_ready() {
            return Err(BracketError::MatchNotReady(id));
        }

        self.matches[idx].status = MatchStatus::InProgress;
        log::debug!("Match {} started", id);
        Ok(&self.matches[idx])
    }

    /// Record the outcome of a ready match; `winner == None` is a draw
    pub fn apply_result(
        &mut self,
        id: MatchId,
        winner: Option<ParticipantId>,
        score: Option<Score>,
    ) -> BracketResult<Progress> {
        let idx = self.find(id)?;
        let m = &self.matches[idx];
        if m.is_resolved() {
            return Err(BracketError::AlreadyResolved(id));
        }
        if m.status == MatchStatus::Bye {
            return Err(BracketError::InvalidTransition {
                match_id: id,
                status: m.status.to_string(),
            });
        }
        let (Some(a), Some(b)) = (m.slot_a.participant_id(), m.slot_b.participant_id()) else {
            return Err(BracketError::MatchNotReady(id));
        };

        let loser = match winner {
            Some(w) if w == a => Some(b),
            Some(w) if w == b => Some(a),
            Some(w) => {
                return Err(BracketError::InvalidResult(format!(
                    "participant {w} is not playing in match {id}"
                )));
            }
            None if self.allows_draw(m) => None,
            None => {
                return Err(BracketError::InvalidResult(format!(
                    "match {id} must produce a winner"
                )));
            }
        };

        if let Some(score) = score {
            let consistent = match winner {
                None => score.a == score.b,
                Some(w) if w == a => score.a > score.b,
                Some(_) => score.b > score.a,
            };
            if !consistent {
                return Err(BracketError::InvalidResult(format!(
                    "score {}-{} does not agree with the reported outcome",
                    score.a, score.b
                )));
            }
        }

        let snapshot = self.clone();
        match self.record_result(idx, winner, loser, score) {
            Ok(progress) => Ok(progress),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    fn record_result(
        &mut self,
        idx: usize,
        winner: Option<ParticipantId>,
        loser: Option<ParticipantId>,
        score: Option<Score>,
    ) -> BracketResult<Progress> {
        let id = self.matches[idx].id;
        let series = self.matches[idx].series;
        {
            let m = &mut self.matches[idx];
            m.status = MatchStatus::Completed;
            m.result = Some(MatchResult {
                winner,
                loser,
                score,
            });
        }
        log::info!("Match {} completed, winner {:?}", id, winner);

        let mut progress = Progress::default();

        if let (Some(rule), Some(loser_id)) = (series, loser)
            && self.losses(loser_id) < rule.loser_min_losses
        {
            let rematch = self.append_rematch(idx);
            progress.appended.push(rematch);
        } else {
            let loser_routed = self.is_referenced(id, SlotRole::Loser);
            if let Some(w) = winner {
                self.substitute(id, SlotRole::Winner, w, &mut progress);
            }
            if let Some(l) = loser {
                self.substitute(id, SlotRole::Loser, l, &mut progress);
                if !loser_routed && self.eliminates(&self.matches[idx].bracket) {
                    self.eliminate(l, &mut progress);
                }
            }
        }

        self.settle(&mut progress)?;
        progress.completed = self.is_complete();
        if progress.completed {
            log::info!("Bracket complete after match {}", id);
        }
        Ok(progress)
    }

    /// Record a leaderboard measurement for one participant
    pub fn record_measurement(
        &mut self,
        participant: ParticipantId,
        value: f64,
    ) -> BracketResult<Progress> {
        if !value.is_finite() {
            return Err(BracketError::InvalidResult(
                "measurement must be a finite number".to_string(),
            ));
        }
        let Some(board) = self.leaderboard.as_mut() else {
            return Err(BracketError::InvalidResult(
                "this bracket has no leaderboard".to_string(),
            ));
        };
        let entry = board
            .entries
            .iter_mut()
            .find(|e| e.participant == participant)
            .ok_or(BracketError::UnknownParticipant(participant))?;
        if entry.value.is_some() {
            return Err(BracketError::MeasurementRecorded(participant));
        }
        entry.value = Some(value);
        log::debug!("Recorded {} for participant {}", value, participant);

        Ok(Progress {
            completed: self.is_complete(),
            ..Default::default()
        })
    }

    /// Record (or replace) a predictor's pick for a match that has not started
    pub fn submit_pick(
        &mut self,
        predictor: &str,
        match_id: MatchId,
        participant: ParticipantId,
    ) -> BracketResult<()> {
        let Some(pool) = &self.predictions else {
            return Err(BracketError::InvalidResult(
                "this bracket takes no predictions".to_string(),
            ));
        };
        if !pool.predictors.iter().any(|p| p.id == predictor) {
            return Err(BracketError::UnknownPredictor(predictor.to_string()));
        }
        let m = self.get(match_id).ok_or(BracketError::MatchNotFound(match_id))?;
        if m.status != MatchStatus::Scheduled {
            return Err(BracketError::PredictionLocked(match_id));
        }
        if self.participant(participant).is_none() {
            return Err(BracketError::UnknownParticipant(participant));
        }
        if !m.slots().iter().any(|slot| self.can_reach(slot, participant)) {
            return Err(BracketError::InvalidResult(format!(
                "participant {participant} cannot reach match {match_id}"
            )));
        }

        if let Some(pool) = self.predictions.as_mut() {
            pool.picks
                .retain(|pick| !(pick.predictor == predictor && pick.match_id == match_id));
            pool.picks.push(Pick {
                predictor: predictor.to_string(),
                match_id,
                participant,
            });
        }
        Ok(())
    }

    /// Settle a freshly built graph: schedule, then resolve byes and placements
    pub(crate) fn finalize(&mut self) -> BracketResult<()> {
        self.compute_schedule();
        let mut progress = Progress::default();
        self.settle(&mut progress)?;
        self.refresh_totals();
        Ok(())
    }

    /// Cascade until nothing else resolves
    fn settle(&mut self, progress: &mut Progress) -> BracketResult<()> {
        loop {
            let mut changed = self.resolve_byes(progress);
            changed |= self.resolve_placements(progress);
            if let Some(round) = self.pair_next_swiss_round(progress)? {
                progress.paired_round = Some(round);
                changed = true;
            }
            if !changed {
                break;
            }
        }
        self.refresh_totals();
        Ok(())
    }

    fn resolve_byes(&mut self, progress: &mut Progress) -> bool {
        let mut changed = false;
        for idx in 0..self.matches.len() {
            let m = &self.matches[idx];
            if m.status != MatchStatus::Bye || m.result.is_some() {
                continue;
            }
            let Some(advancing) = m.slot_a.participant_id().or(m.slot_b.participant_id()) else {
                continue;
            };
            let id = m.id;
            self.matches[idx].result = Some(MatchResult {
                winner: Some(advancing),
                loser: None,
                score: None,
            });
            progress.byes.push(id);
            self.substitute(id, SlotRole::Winner, advancing, progress);
            changed = true;
        }
        changed
    }

    fn resolve_placements(&mut self, progress: &mut Progress) -> bool {
        let mut changed = false;
        let pools: Vec<String> = self.pools.iter().map(|p| p.name.clone()).collect();
        for pool in pools {
            let waiting = self.matches.iter().any(|m| {
                m.slots()
                    .iter()
                    .any(|slot| matches!(slot, Slot::Placement { pool: p, .. } if *p == pool))
            });
            if !waiting || !standings::bracket_complete(self, &pool) {
                continue;
            }

            let ranked: HashMap<u32, ParticipantId> = standings::pool_table(self, &pool)
                .into_iter()
                .map(|row| (row.rank, row.participant))
                .collect();
            log::info!("Pool {} complete, resolving placements", pool);

            for m in &mut self.matches {
                let mut filled = false;
                for slot in [&mut m.slot_a, &mut m.slot_b] {
                    if let Slot::Placement { pool: p, rank } = slot
                        && *p == pool
                        && let Some(participant) = ranked.get(&*rank)
                    {
                        *slot = Slot::participant(*participant);
                        filled = true;
                    }
                }
                if filled {
                    progress.filled.push(m.id);
                    changed = true;
                }
            }
        }
        changed
    }

    fn pair_next_swiss_round(&mut self, progress: &mut Progress) -> BracketResult<Option<u32>> {
        let Some(state) = self.swiss else {
            return Ok(None);
        };
        let Some(next) = self
            .matches_in(SWISS_BRACKET)
            .filter(|m| m.slots().iter().any(|slot| **slot == Slot::Pending))
            .map(|m| m.round)
            .min()
        else {
            return Ok(None);
        };
        if !self
            .matches_in(SWISS_BRACKET)
            .filter(|m| m.round < next)
            .all(Match::is_resolved)
        {
            return Ok(None);
        }

        let everyone = self.seeded_participants();
        let table = standings::table(self, &everyone, |m| {
            m.bracket == SWISS_BRACKET && m.round < next
        });
        let ranked: Vec<ParticipantId> = table.iter().map(|row| row.participant).collect();
        let scores: HashMap<ParticipantId, f64> =
            table.iter().map(|row| (row.participant, row.points)).collect();

        let mut played = HashSet::new();
        let mut had_bye = HashSet::new();
        for m in self.matches_in(SWISS_BRACKET).filter(|m| m.round < next) {
            match (m.slot_a.participant_id(), m.slot_b.participant_id()) {
                (Some(a), Some(b)) => {
                    played.insert(pair_key(a, b));
                }
                (Some(a), None) if m.status == MatchStatus::Bye => {
                    had_bye.insert(a);
                }
                _ => {}
            }
        }

        let pairing = pair_round(&PairingInput {
            ranked: &ranked,
            scores: &scores,
            played: &played,
            had_bye: &had_bye,
            method: state.pairing,
        })?;

        let mut pairs = pairing.pairs.into_iter();
        for m in self
            .matches
            .iter_mut()
            .filter(|m| m.bracket == SWISS_BRACKET && m.round == next)
        {
            if m.status == MatchStatus::Bye {
                if let Some(bye) = pairing.bye {
                    m.slot_a = Slot::participant(bye);
                }
            } else if let Some((a, b)) = pairs.next() {
                m.slot_a = Slot::participant(a);
                m.slot_b = Slot::participant(b);
            }
            progress.filled.push(m.id);
        }
        log::info!("Paired swiss round {}", next);
        Ok(Some(next))
    }

    /// Replace every slot fed by `source`'s `role` outcome
    fn substitute(
        &mut self,
        source: MatchId,
        role: SlotRole,
        participant: ParticipantId,
        progress: &mut Progress,
    ) {
        for m in &mut self.matches {
            let mut filled = false;
            for slot in [&mut m.slot_a, &mut m.slot_b] {
                if slot.refers_to(source, role) {
                    *slot = Slot::participant(participant);
                    filled = true;
                }
            }
            if filled {
                progress.filled.push(m.id);
            }
        }
    }

    fn append_rematch(&mut self, idx: usize) -> MatchId {
        let source = self.matches[idx].clone();
        let id = MatchId(self.matches.len() as u32 + 1);
        let round = self
            .matches_in(&source.bracket)
            .map(|m| m.round)
            .max()
            .unwrap_or(source.round)
            + 1;

        for m in &mut self.matches {
            for slot in [&mut m.slot_a, &mut m.slot_b] {
                if let Slot::MatchRef { match_id, .. } = slot
                    && *match_id == source.id
                {
                    *match_id = id;
                }
            }
        }

        self.matches.push(Match {
            id,
            bracket: source.bracket.clone(),
            round,
            position: 1,
            slot_a: source.slot_a.clone(),
            slot_b: source.slot_b.clone(),
            status: MatchStatus::Scheduled,
            result: None,
            schedule_round: source.schedule_round + 1,
            series: source.series,
        });
        log::info!(
            "Series rule appended match {} after match {} in {}",
            id,
            source.id,
            source.bracket
        );
        self.reschedule_from(id);
        id
    }

    fn eliminate(&mut self, participant: ParticipantId, progress: &mut Progress) {
        if !self.eliminated.contains(&participant) {
            self.eliminated.push(participant);
            progress.eliminated.push(participant);
            log::debug!("Participant {} eliminated", participant);
        }
    }

    fn is_referenced(&self, source: MatchId, role: SlotRole) -> bool {
        self.matches
            .iter()
            .any(|m| m.slots().iter().any(|slot| slot.refers_to(source, role)))
    }

    /// Brackets scored by points rather than knockout
    fn is_points_bracket(&self, bracket: &str) -> bool {
        bracket == ROUND_ROBIN_BRACKET
            || bracket == SWISS_BRACKET
            || self.pools.iter().any(|p| p.name == bracket)
    }

    fn eliminates(&self, bracket: &str) -> bool {
        !self.is_points_bracket(bracket)
    }

    fn allows_draw(&self, m: &Match) -> bool {
        m.series.is_none()
            && self.is_points_bracket(&m.bracket)
            && !self.is_referenced(m.id, SlotRole::Winner)
            && !self.is_referenced(m.id, SlotRole::Loser)
    }

    /// Whether `participant` can still end up in `slot`
    fn can_reach(&self, slot: &Slot, participant: ParticipantId) -> bool {
        match slot {
            Slot::Participant { id } => *id == participant,
            Slot::MatchRef { match_id, role } => match self.get(*match_id) {
                Some(m) if m.is_resolved() => {
                    let outcome = match role {
                        SlotRole::Winner => m.winner(),
                        SlotRole::Loser => m.loser(),
                    };
                    outcome == Some(participant)
                }
                Some(m) => m.slots().iter().any(|s| self.can_reach(s, participant)),
                None => false,
            },
            Slot::Bye => false,
            Slot::Placement { .. } | Slot::Pending => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::test_support::build;
    use serde_json::json;

    fn play_first_ready(graph: &mut MatchGraph, a_wins: bool) -> Progress {
        let m = graph
            .matches
            .iter()
            .find(|m| m.status == MatchStatus::Scheduled && m.is_ready())
            .cloned()
            .expect("a ready match");
        let winner = if a_wins {
            m.slot_a.participant_id()
        } else {
            m.slot_b.participant_id()
        };
        graph.apply_result(m.id, winner, None).unwrap()
    }

    #[test]
    fn test_start_requires_ready_match() {
        let (mut graph, _) = build(4, json!({"engine": "single"}), json!({}));
        let final_id = graph.matches.last().unwrap().id;
        assert_eq!(graph.start_match(final_id), Err(BracketError::MatchNotReady(final_id)));

        let started = graph.start_match(MatchId(1)).unwrap();
        assert_eq!(started.status, MatchStatus::InProgress);
        assert!(matches!(
            graph.start_match(MatchId(1)),
            Err(BracketError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_result_fills_next_round() {
        let (mut graph, _) = build(4, json!({"engine": "single"}), json!({}));
        let progress = graph
            .apply_result(MatchId(1), Some(ParticipantId(1)), Some(Score { a: 3, b: 1 }))
            .unwrap();
        assert_eq!(progress.filled, vec![MatchId(3)]);
        assert_eq!(progress.eliminated, vec![ParticipantId(4)]);
        assert_eq!(graph.matches[2].slot_a, Slot::participant(ParticipantId(1)));

        assert_eq!(
            graph.apply_result(MatchId(1), Some(ParticipantId(1)), None),
            Err(BracketError::AlreadyResolved(MatchId(1)))
        );
    }

    #[test]
    fn test_rejected_results_leave_graph_untouched() {
        let (mut graph, _) = build(4, json!({"engine": "single"}), json!({}));
        let before = graph.clone();

        assert!(matches!(
            graph.apply_result(MatchId(1), Some(ParticipantId(2)), None),
            Err(BracketError::InvalidResult(_))
        ));
        assert!(matches!(
            graph.apply_result(MatchId(1), None, None),
            Err(BracketError::InvalidResult(_))
        ));
        assert!(matches!(
            graph.apply_result(MatchId(1), Some(ParticipantId(1)), Some(Score { a: 0, b: 2 })),
            Err(BracketError::InvalidResult(_))
        ));
        assert_eq!(
            graph.apply_result(MatchId(99), Some(ParticipantId(1)), None),
            Err(BracketError::MatchNotFound(MatchId(99)))
        );
        assert_eq!(graph, before);
    }

    #[test]
    fn test_double_elimination_reset() {
        let (mut graph, _) = build(4, json!({"engine": "double", "finals": "double"}), json!({}));
        // Top slot wins everything up to the grand final
        while graph.matches_in("final").any(|m| !m.is_ready()) {
            play_first_ready(&mut graph, true);
        }

        let grand_final = graph.matches_in("final").next().unwrap().clone();
        let progress = graph
            .apply_result(grand_final.id, grand_final.slot_b.participant_id(), None)
            .unwrap();
        assert_eq!(progress.appended.len(), 1);
        assert!(!progress.completed);
        assert_eq!(graph.total_matches, 7);

        let reset = graph.get(progress.appended[0]).unwrap().clone();
        assert!(reset.is_ready());
        assert!(reset.schedule_round > grand_final.schedule_round);

        let progress = graph.apply_result(reset.id, reset.slot_a.participant_id(), None).unwrap();
        assert!(progress.completed);
        assert!(progress.appended.is_empty());
    }

    #[test]
    fn test_draws_only_in_points_brackets() {
        let (mut graph, _) = build(4, json!({"engine": "round_robin"}), json!({}));
        let progress = graph.apply_result(MatchId(1), None, Some(Score { a: 2, b: 2 })).unwrap();
        assert!(progress.eliminated.is_empty());
        assert_eq!(graph.matches[0].winner(), None);
    }

    #[test]
    fn test_swiss_pairs_next_round() {
        let (mut graph, _) = build(6, json!({"engine": "swiss", "rounds": 3}), json!({}));
        let mut paired = None;
        for _ in 0..3 {
            paired = play_first_ready(&mut graph, true).paired_round.or(paired);
        }
        assert_eq!(paired, Some(2));
        assert!(graph
            .matches_in(SWISS_BRACKET)
            .filter(|m| m.round == 2)
            .all(Match::is_ready));
        assert!(graph
            .matches_in(SWISS_BRACKET)
            .filter(|m| m.round == 3)
            .all(|m| m.slot_a == Slot::Pending));
    }

    #[test]
    fn test_measurements() {
        let (mut graph, _) = build(2, json!({"engine": "leaderboard"}), json!({}));
        assert!(!graph.record_measurement(ParticipantId(1), 9.5).unwrap().completed);
        assert_eq!(
            graph.record_measurement(ParticipantId(1), 9.0),
            Err(BracketError::MeasurementRecorded(ParticipantId(1)))
        );
        assert_eq!(
            graph.record_measurement(ParticipantId(7), 9.0),
            Err(BracketError::UnknownParticipant(ParticipantId(7)))
        );
        assert!(matches!(
            graph.record_measurement(ParticipantId(2), f64::NAN),
            Err(BracketError::InvalidResult(_))
        ));
        assert!(graph.record_measurement(ParticipantId(2), 7.25).unwrap().completed);
    }

    #[test]
    fn test_picks_lock_when_match_starts() {
        let (mut graph, _) = build(
            4,
            json!({"engine": "single"}),
            json!({"tournamentType": "prediction-bracket", "participants": ["ana"]}),
        );
        graph.submit_pick("ana", MatchId(3), ParticipantId(1)).unwrap();
        graph.submit_pick("ana", MatchId(3), ParticipantId(2)).unwrap();
        assert_eq!(graph.predictions.as_ref().unwrap().picks.len(), 1);

        assert_eq!(
            graph.submit_pick("bea", MatchId(1), ParticipantId(1)),
            Err(BracketError::UnknownPredictor("bea".to_string()))
        );
        assert!(matches!(
            graph.submit_pick("ana", MatchId(1), ParticipantId(2)),
            Err(BracketError::InvalidResult(_))
        ));

        graph.start_match(MatchId(1)).unwrap();
        assert_eq!(
            graph.submit_pick("ana", MatchId(1), ParticipantId(1)),
            Err(BracketError::PredictionLocked(MatchId(1)))
        );
    }
}
