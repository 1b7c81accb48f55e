//! Construction primitives shared by the format builders.

use super::models::{Match, MatchId, MatchStatus, ParticipantId, SeriesRule, Slot};
use std::collections::HashMap;

/// Outcome of building an elimination tree
#[derive(Debug, Clone)]
pub(crate) struct Elimination {
    /// Slot holding the bracket winner once decided
    pub champion: Option<Slot>,

    /// Deciding match, absent for a single entrant
    pub final_match: Option<MatchId>,

    pub rounds: u32,

    /// Loser refs of contested matches, per round
    pub losers_by_round: Vec<Vec<Slot>>,
}

/// Outcome of reducing entrant waves to a single survivor
#[derive(Debug, Clone)]
pub(crate) struct Reduction {
    pub champion: Option<Slot>,
    pub rounds: u32,
    pub losers_by_round: Vec<Vec<Slot>>,
}

/// Incremental match list with per-round positions
#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    matches: Vec<Match>,
    positions: HashMap<(String, u32), u32>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_position(&mut self, bracket: &str, round: u32) -> u32 {
        let position = self
            .positions
            .entry((bracket.to_string(), round))
            .or_insert(0);
        *position += 1;
        *position
    }

    fn insert(
        &mut self,
        bracket: &str,
        round: u32,
        slot_a: Slot,
        slot_b: Slot,
        status: MatchStatus,
    ) -> MatchId {
        let id = MatchId(self.matches.len() as u32 + 1);
        let position = self.next_position(bracket, round);
        self.matches.push(Match {
            id,
            bracket: bracket.to_string(),
            round,
            position,
            slot_a,
            slot_b,
            status,
            result: None,
            schedule_round: 0,
            series: None,
        });
        id
    }

    /// Add a contested match
    pub fn push(&mut self, bracket: &str, round: u32, slot_a: Slot, slot_b: Slot) -> MatchId {
        self.insert(bracket, round, slot_a, slot_b, MatchStatus::Scheduled)
    }

    /// Add a bye: `slot` passes through unopposed
    pub fn push_bye(&mut self, bracket: &str, round: u32, slot: Slot) -> MatchId {
        self.insert(bracket, round, slot, Slot::Bye, MatchStatus::Bye)
    }

    pub fn set_series(&mut self, id: MatchId, rule: SeriesRule) {
        if let Some(m) = self.matches.iter_mut().find(|m| m.id == id) {
            m.series = Some(rule);
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn into_matches(self) -> Vec<Match> {
        self.matches
    }

    /// Single-elimination tree over `entrants` in seed order
    ///
    /// Pads to the next power of two; padding seeds are byes, so the top
    /// seeds receive them first under 1-vs-N pairing.
    pub fn elimination(&mut self, bracket: &str, entrants: Vec<Slot>) -> Elimination {
        if entrants.len() < 2 {
            return Elimination {
                champion: entrants.into_iter().next(),
                final_match: None,
                rounds: 0,
                losers_by_round: Vec::new(),
            };
        }

        let size = entrants.len().next_power_of_two();
        let order = seed_order(size);
        let mut current = Vec::with_capacity(size / 2);
        let mut first_losers = Vec::new();
        let mut final_match = None;

        for pair in order.chunks(2) {
            let high = entrants[pair[0] - 1].clone();
            match entrants.get(pair[1] - 1) {
                Some(low) => {
                    let id = self.push(bracket, 1, high, low.clone());
                    first_losers.push(Slot::loser_of(id));
                    current.push(Slot::winner_of(id));
                    final_match = Some(id);
                }
                None => {
                    let id = self.push_bye(bracket, 1, high);
                    current.push(Slot::winner_of(id));
                }
            }
        }

        let mut losers_by_round = vec![first_losers];
        let mut round = 1;
        while current.len() > 1 {
            round += 1;
            let mut next = Vec::with_capacity(current.len() / 2);
            let mut losers = Vec::with_capacity(current.len() / 2);
            for pair in current.chunks(2) {
                let id = self.push(bracket, round, pair[0].clone(), pair[1].clone());
                losers.push(Slot::loser_of(id));
                next.push(Slot::winner_of(id));
                final_match = Some(id);
            }
            losers_by_round.push(losers);
            current = next;
        }

        Elimination {
            champion: current.pop(),
            final_match,
            rounds: round,
            losers_by_round,
        }
    }

    /// Reduce arriving waves of entrants to one survivor
    ///
    /// Before each new wave the surviving pool is halved (an odd entrant sits
    /// out) until it is no larger than the wave, then the pool meets the wave
    /// head to head. Every match removes one entrant, so `entrants - 1`
    /// matches are produced. This is the losers-bracket shape.
    pub fn reduce_waves(&mut self, bracket: &str, waves: Vec<Vec<Slot>>) -> Reduction {
        let mut pool: Vec<Slot> = Vec::new();
        let mut round = 0;
        let mut losers_by_round = Vec::new();

        for (idx, mut wave) in waves.into_iter().filter(|w| !w.is_empty()).enumerate() {
            if pool.is_empty() {
                pool = wave;
                continue;
            }

            while pool.len() > wave.len() {
                round += 1;
                let (survivors, losers) = self.halve(bracket, round, pool);
                losers_by_round.push(losers);
                pool = survivors;
            }

            // Alternate the drop-in order to delay rematches
            if idx % 2 == 1 {
                wave.reverse();
            }

            round += 1;
            let carried = wave.split_off(pool.len());
            let mut survivors = Vec::with_capacity(pool.len() + carried.len());
            let mut losers = Vec::with_capacity(pool.len());
            for (survivor, newcomer) in pool.into_iter().zip(wave) {
                let id = self.push(bracket, round, survivor, newcomer);
                losers.push(Slot::loser_of(id));
                survivors.push(Slot::winner_of(id));
            }
            survivors.extend(carried);
            losers_by_round.push(losers);
            pool = survivors;
        }

        while pool.len() > 1 {
            round += 1;
            let (survivors, losers) = self.halve(bracket, round, pool);
            losers_by_round.push(losers);
            pool = survivors;
        }

        Reduction {
            champion: pool.pop(),
            rounds: round,
            losers_by_round,
        }
    }

    fn halve(&mut self, bracket: &str, round: u32, pool: Vec<Slot>) -> (Vec<Slot>, Vec<Slot>) {
        let mut survivors = Vec::with_capacity(pool.len() / 2 + 1);
        let mut losers = Vec::with_capacity(pool.len() / 2);
        for pair in pool.chunks(2) {
            match pair {
                [a, b] => {
                    let id = self.push(bracket, round, a.clone(), b.clone());
                    losers.push(Slot::loser_of(id));
                    survivors.push(Slot::winner_of(id));
                }
                [carried] => survivors.push(carried.clone()),
                _ => {}
            }
        }
        (survivors, losers)
    }

    /// Add a full round robin; returns the number of rounds
    pub fn round_robin(&mut self, bracket: &str, entrants: &[ParticipantId]) -> u32 {
        let schedule = circle_rounds(entrants);
        let rounds = schedule.len() as u32;
        self.scheduled_rounds(bracket, schedule);
        rounds
    }

    /// Add precomputed pairing rounds, numbered from 1
    pub fn scheduled_rounds(
        &mut self,
        bracket: &str,
        schedule: Vec<Vec<(ParticipantId, ParticipantId)>>,
    ) {
        for (idx, pairs) in schedule.into_iter().enumerate() {
            for (a, b) in pairs {
                self.push(
                    bracket,
                    idx as u32 + 1,
                    Slot::participant(a),
                    Slot::participant(b),
                );
            }
        }
    }
}

/// Standard bracket order for `size` seeds (a power of two)
///
/// Adjacent entries meet in round one and seeds 1 and 2 can only meet in the
/// final: `[1, 8, 4, 5, 2, 7, 3, 6]` for eight.
pub(crate) fn seed_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let span = order.len() * 2 + 1;
        order = order.iter().flat_map(|&seed| [seed, span - seed]).collect();
    }
    order
}

/// Circle-method round robin
///
/// Seed 1 stays fixed while the rest rotate; an odd field gets a phantom
/// entrant and whoever meets it sits the round out.
pub(crate) fn circle_rounds(entrants: &[ParticipantId]) -> Vec<Vec<(ParticipantId, ParticipantId)>> {
    if entrants.len() < 2 {
        return Vec::new();
    }

    let mut ring: Vec<Option<ParticipantId>> = entrants.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }

    let size = ring.len();
    let mut rounds = Vec::with_capacity(size - 1);
    for round in 0..size - 1 {
        let mut pairs = Vec::with_capacity(size / 2);
        for i in 0..size / 2 {
            if let (Some(a), Some(b)) = (ring[i], ring[size - 1 - i]) {
                // Alternate sides for the fixed entrant
                if i == 0 && round % 2 == 1 {
                    pairs.push((b, a));
                } else {
                    pairs.push((a, b));
                }
            }
        }
        rounds.push(pairs);

        if let Some(last) = ring.pop() {
            ring.insert(1, last);
        }
    }
    rounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ids(n: u32) -> Vec<ParticipantId> {
        (1..=n).map(ParticipantId).collect()
    }

    fn slots(n: u32) -> Vec<Slot> {
        ids(n).into_iter().map(Slot::participant).collect()
    }

    #[test]
    fn test_seed_order() {
        assert_eq!(seed_order(1), vec![1]);
        assert_eq!(seed_order(2), vec![1, 2]);
        assert_eq!(seed_order(4), vec![1, 4, 2, 3]);
        assert_eq!(seed_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn test_elimination_power_of_two() {
        let mut builder = GraphBuilder::new();
        let tree = builder.elimination("main", slots(8));
        let matches = builder.into_matches();

        assert_eq!(matches.len(), 7);
        assert_eq!(tree.rounds, 3);
        assert_eq!(tree.losers_by_round.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 2, 1]);
        assert_eq!(tree.final_match, Some(MatchId(7)));
        assert_eq!(tree.champion, Some(Slot::winner_of(MatchId(7))));
    }

    #[test]
    fn test_elimination_byes_go_to_top_seeds() {
        let mut builder = GraphBuilder::new();
        let tree = builder.elimination("main", slots(6));
        let matches = builder.into_matches();

        let byes: Vec<_> = matches
            .iter()
            .filter(|m| m.status == MatchStatus::Bye)
            .map(|m| m.slot_a.clone())
            .collect();
        assert_eq!(
            byes,
            vec![
                Slot::participant(ParticipantId(1)),
                Slot::participant(ParticipantId(2))
            ]
        );
        assert_eq!(matches.iter().filter(|m| m.is_contested()).count(), 5);
        assert_eq!(tree.rounds, 3);
        assert_eq!(tree.losers_by_round[0].len(), 2);
    }

    #[test]
    fn test_single_entrant_elimination() {
        let mut builder = GraphBuilder::new();
        let tree = builder.elimination("main", slots(1));
        assert_eq!(builder.len(), 0);
        assert_eq!(tree.champion, Some(Slot::participant(ParticipantId(1))));
    }

    #[test]
    fn test_reduce_waves_losers_bracket_shape() {
        let mut builder = GraphBuilder::new();
        let waves = vec![slots(4), slots(2), slots(1)];
        let reduction = builder.reduce_waves("losers", waves);

        assert_eq!(builder.len(), 6);
        assert_eq!(reduction.rounds, 4);
        assert_eq!(
            reduction.losers_by_round.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![2, 2, 1, 1]
        );
    }

    #[test]
    fn test_reduce_waves_uneven() {
        let mut builder = GraphBuilder::new();
        let waves = vec![slots(3), slots(5), slots(1)];
        let reduction = builder.reduce_waves("losers", waves);

        // nine entrants, eight eliminations
        assert_eq!(builder.len(), 8);
        assert!(reduction.champion.is_some());
    }

    #[test]
    fn test_circle_rounds_even() {
        let schedule = circle_rounds(&ids(6));
        assert_eq!(schedule.len(), 5);

        let mut pairs = HashSet::new();
        for round in &schedule {
            assert_eq!(round.len(), 3);
            let mut seen = HashSet::new();
            for &(a, b) in round {
                assert!(seen.insert(a) && seen.insert(b));
                assert!(pairs.insert((a.min(b), a.max(b))));
            }
        }
        assert_eq!(pairs.len(), 15);
    }

    #[test]
    fn test_circle_rounds_odd_rotates_bye() {
        let schedule = circle_rounds(&ids(5));
        assert_eq!(schedule.len(), 5);

        let mut sat_out = HashSet::new();
        for round in &schedule {
            assert_eq!(round.len(), 2);
            let playing: HashSet<_> = round.iter().flat_map(|&(a, b)| [a, b]).collect();
            let idle: Vec<_> = ids(5).into_iter().filter(|p| !playing.contains(p)).collect();
            assert_eq!(idle.len(), 1);
            assert!(sat_out.insert(idle[0]));
        }
    }
}
