//! Independent check of a generated graph.
//!
//! Expected match and round counts come from closed forms per format, never
//! from the graph itself. Double and triple elimination fields that are not
//! a power of two fall back to a timing replay of the losers-bracket reducer. Structural checks catch
//! dangling references and repeated pairings the counts alone would miss.

use crate::formats::swiss::pair_key;
use crate::formats::{Engine, Format};
use crate::graph::{MatchGraph, MatchStatus, ParticipantId, Slot, SlotRole};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub expected_matches: u32,
    pub actual_matches: u32,
    pub expected_rounds: u32,
    pub actual_rounds: u32,
    pub mathematics_correct: bool,
    pub participant_count: u32,
    pub config_engine: Engine,
    pub tournament_type: Format,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Validate a freshly generated graph
pub fn validate(graph: &MatchGraph) -> ValidationReport {
    let (expected_matches, expected_rounds) = expected_counts(graph);
    let issues = structural_issues(graph);
    let actual_matches = graph.total_matches;
    let actual_rounds = graph.total_rounds;

    let mathematics_correct =
        expected_matches == actual_matches && expected_rounds == actual_rounds && issues.is_empty();
    if !mathematics_correct {
        log::warn!(
            "Validation failed for {}: expected {}/{} got {}/{}, {} issues",
            graph.tournament_type,
            expected_matches,
            expected_rounds,
            actual_matches,
            actual_rounds,
            issues.len()
        );
    }

    ValidationReport {
        expected_matches,
        actual_matches,
        expected_rounds,
        actual_rounds,
        mathematics_correct,
        participant_count: graph.participants.len() as u32,
        config_engine: graph.config_engine,
        tournament_type: graph.tournament_type,
        issues,
    }
}

fn ceil_log2(n: u32) -> u32 {
    n.max(1).next_power_of_two().trailing_zeros()
}

fn round_robin_rounds(n: u32) -> u32 {
    match n {
        0 | 1 => 0,
        n if n % 2 == 0 => n - 1,
        n => n,
    }
}

/// Closed-form (matches, rounds) for the graph's format and parameters
pub fn expected_counts(graph: &MatchGraph) -> (u32, u32) {
    let n = graph.participants.len() as u32;
    match graph.tournament_type {
        Format::Single | Format::Prediction => (n.saturating_sub(1), ceil_log2(n)),
        Format::Double => (2 * n.saturating_sub(1), double_rounds(n)),
        Format::Triple => (3 * n.saturating_sub(1), triple_rounds(n)),
        Format::RoundRobin => (n * n.saturating_sub(1) / 2, round_robin_rounds(n)),
        Format::Swiss => {
            let rounds = graph.params.rounds.unwrap_or(0);
            (rounds * (n / 2), rounds)
        }
        Format::Leaderboard => (0, 1),
        Format::MarchMadness => (n.saturating_sub(1), 1 + ceil_log2(64)),
        Format::Compass => (compass_matches(n), ceil_log2(n)),
        Format::GameGuarantee => {
            let k = graph.params.game_guarantee.unwrap_or(0);
            let guarantee_rounds = if n % 2 == 0 { k } else { k + 1 };
            let upper = n.div_ceil(2);
            let lower = n - upper;
            (
                guarantee_rounds * (n / 2) + upper.saturating_sub(1) + lower.saturating_sub(1),
                guarantee_rounds + ceil_log2(upper),
            )
        }
        Format::Pool => {
            let groups = graph.params.groups.unwrap_or(1).max(1);
            let advance = graph.params.advance_per_group.unwrap_or(0);
            let base = n / groups;
            let larger = n % groups;

            let mut matches = 0;
            let mut rounds = 0;
            for group in 0..groups {
                let size = base + u32::from(group < larger);
                matches += size * size.saturating_sub(1) / 2;
                rounds = rounds.max(round_robin_rounds(size));
            }
            let advancing = groups * advance;
            if advancing >= 2 {
                matches += advancing - 1;
                rounds += ceil_log2(advancing);
            }
            (matches, rounds)
        }
    }
}

fn compass_matches(n: u32) -> u32 {
    if n < 2 {
        return 0;
    }
    let size = n.next_power_of_two();
    let depth = size.trailing_zeros();

    let mut total = n - 1;
    for round in 1..=depth {
        let group = if round == 1 { n - size / 2 } else { size >> round };
        if group < 2 {
            continue;
        }
        total += group - 1;
        let first_round = group - group.next_power_of_two() / 2;
        if first_round >= 2 {
            total += first_round - 1;
        }
    }
    total
}

/// Ready times of each winners-bracket loser wave
fn winners_waves(n: u32) -> (u32, Vec<Vec<u32>>) {
    let size = n.next_power_of_two();
    let depth = size.trailing_zeros();
    let waves = (1..=depth)
        .map(|round| {
            let count = if round == 1 { n - size / 2 } else { size >> round };
            vec![round; count as usize]
        })
        .collect();
    (depth, waves)
}

/// Replay of the wave reducer's timing: (champion ready, loser ready times per round)
fn reduce_timing(waves: Vec<Vec<u32>>) -> (u32, Vec<Vec<u32>>) {
    fn halve(pool: Vec<u32>, previous: u32) -> (Vec<u32>, Vec<u32>, u32) {
        let mut survivors = Vec::with_capacity(pool.len() / 2 + 1);
        let mut losers = Vec::with_capacity(pool.len() / 2);
        let mut latest = 0;
        for pair in pool.chunks(2) {
            match pair {
                [a, b] => {
                    let at = 1 + previous.max(*a).max(*b);
                    latest = latest.max(at);
                    losers.push(at);
                    survivors.push(at);
                }
                [carried] => survivors.push(*carried),
                _ => {}
            }
        }
        (survivors, losers, latest)
    }

    let mut pool: Vec<u32> = Vec::new();
    let mut previous = 0;
    let mut losers_by_round = Vec::new();

    for (idx, mut wave) in waves.into_iter().filter(|w| !w.is_empty()).enumerate() {
        if pool.is_empty() {
            pool = wave;
            continue;
        }
        while pool.len() > wave.len() {
            let (survivors, losers, latest) = halve(pool, previous);
            losers_by_round.push(losers);
            pool = survivors;
            previous = latest;
        }
        if idx % 2 == 1 {
            wave.reverse();
        }
        let carried = wave.split_off(pool.len());
        let mut survivors = Vec::with_capacity(pool.len() + carried.len());
        let mut losers = Vec::with_capacity(pool.len());
        let mut latest = 0;
        for (survivor, newcomer) in pool.into_iter().zip(wave) {
            let at = 1 + previous.max(survivor).max(newcomer);
            latest = latest.max(at);
            losers.push(at);
            survivors.push(at);
        }
        survivors.extend(carried);
        losers_by_round.push(losers);
        pool = survivors;
        previous = latest;
    }

    while pool.len() > 1 {
        let (survivors, losers, latest) = halve(pool, previous);
        losers_by_round.push(losers);
        pool = survivors;
        previous = latest;
    }

    (pool.first().copied().unwrap_or(0), losers_by_round)
}

/// Winners bracket `L` rounds, losers bracket `2L - 2` rounds ending one
/// round after the winners final, then the grand final
fn double_rounds(n: u32) -> u32 {
    if n < 2 {
        return 0;
    }
    if !n.is_power_of_two() {
        return replayed_double_rounds(n);
    }
    let depth = ceil_log2(n);
    let losers_final = 1 + (2 * depth - 2);
    1 + depth.max(losers_final)
}

/// Challenge match at `2L`; the last-chance bracket takes three rounds per
/// winners round, so its champion is ready at `3L - 1` and the final at `3L`
fn triple_rounds(n: u32) -> u32 {
    if n < 2 {
        return 0;
    }
    if !n.is_power_of_two() {
        return replayed_triple_rounds(n);
    }
    3 * ceil_log2(n)
}

// First-round byes leave the loser waves uneven, so the losers bracket halves
// at field-dependent points and only a replay gives its length.
fn replayed_double_rounds(n: u32) -> u32 {
    let (depth, waves) = winners_waves(n);
    let (lower, _) = reduce_timing(waves);
    1 + depth.max(lower)
}

fn replayed_triple_rounds(n: u32) -> u32 {
    let (depth, waves) = winners_waves(n);
    let (middle, mut second_losses) = reduce_timing(waves);
    let challenge = 1 + depth.max(middle);
    second_losses.push(vec![challenge]);
    let (lower, _) = reduce_timing(second_losses);
    1 + challenge.max(lower)
}

/// Structural problems: bad references, repeated pairings, double bookings
pub fn structural_issues(graph: &MatchGraph) -> Vec<String> {
    let mut issues = Vec::new();
    let mut refs: HashSet<(u32, SlotRole)> = HashSet::new();
    let mut placements: HashSet<(String, u32)> = HashSet::new();
    let mut booked: HashSet<(String, u32, ParticipantId)> = HashSet::new();
    let mut pairings: HashMap<String, HashSet<(ParticipantId, ParticipantId)>> = HashMap::new();

    let points_bracket = |bracket: &str| {
        matches!(
            graph.tournament_type,
            Format::RoundRobin | Format::Swiss
        ) || graph.pools.iter().any(|p| p.name == bracket)
    };

    for (idx, m) in graph.matches.iter().enumerate() {
        if m.id.0 as usize != idx + 1 {
            issues.push(format!("match at index {idx} has id {}", m.id));
        }

        if m.status == MatchStatus::Bye && m.slot_a == Slot::Bye && m.slot_b == Slot::Bye {
            issues.push(format!("match {} is a bye with no entrant", m.id));
        }

        for slot in m.slots() {
            match slot {
                Slot::MatchRef { match_id, role } => {
                    match graph.get(*match_id) {
                        None => issues.push(format!(
                            "match {} references missing match {match_id}",
                            m.id
                        )),
                        Some(source) if source.id >= m.id => issues.push(format!(
                            "match {} references later match {match_id}",
                            m.id
                        )),
                        Some(source)
                            if *role == SlotRole::Loser && source.status == MatchStatus::Bye =>
                        {
                            issues.push(format!(
                                "match {} takes the loser of bye {match_id}",
                                m.id
                            ))
                        }
                        Some(_) => {}
                    }
                    if !refs.insert((match_id.0, *role)) {
                        issues.push(format!(
                            "{role:?} of match {match_id} feeds more than one slot"
                        ));
                    }
                }
                Slot::Placement { pool, rank } => {
                    match graph.pools.iter().find(|p| p.name == *pool) {
                        None => issues.push(format!(
                            "match {} takes a placement from unknown pool {pool}",
                            m.id
                        )),
                        Some(p) if *rank == 0 || *rank as usize > p.participants.len() => issues
                            .push(format!(
                                "match {} takes rank {rank} of {pool} with {} members",
                                m.id,
                                p.participants.len()
                            )),
                        Some(_) => {}
                    }
                    if !placements.insert((pool.clone(), *rank)) {
                        issues.push(format!("rank {rank} of {pool} feeds more than one slot"));
                    }
                }
                Slot::Participant { id } => {
                    if graph.participant(*id).is_none() {
                        issues.push(format!("match {} seats unknown participant {id}", m.id));
                    }
                    if !booked.insert((m.bracket.clone(), m.round, *id)) {
                        issues.push(format!(
                            "participant {id} plays twice in {} round {}",
                            m.bracket, m.round
                        ));
                    }
                }
                Slot::Bye | Slot::Pending => {}
            }
        }

        if points_bracket(&m.bracket)
            && let (Some(a), Some(b)) = (m.slot_a.participant_id(), m.slot_b.participant_id())
            && !pairings
                .entry(m.bracket.clone())
                .or_default()
                .insert(pair_key(a, b))
        {
            issues.push(format!("{a} and {b} meet twice in {}", m.bracket));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::test_support::build;
    use crate::graph::MatchId;
    use serde_json::json;

    #[test]
    fn test_reference_counts() {
        assert_eq!(double_rounds(8), 6);
        assert_eq!(triple_rounds(8), 9);
        assert_eq!(compass_matches(16), 30);
        assert_eq!(ceil_log2(68), 7);
    }

    #[test]
    fn test_detects_dangling_and_duplicate_refs() {
        let (mut graph, _) = build(4, json!({"engine": "single"}), json!({}));
        graph.matches[2].slot_a = Slot::winner_of(MatchId(9));
        graph.matches[2].slot_b = Slot::winner_of(MatchId(9));

        let report = validate(&graph);
        assert!(!report.mathematics_correct);
        assert!(report.issues.iter().any(|i| i.contains("missing match 9")));
        assert!(report.issues.iter().any(|i| i.contains("more than one slot")));
    }

    #[test]
    fn test_detects_repeat_pairing() {
        let (mut graph, _) = build(4, json!({"engine": "round_robin"}), json!({}));
        let first = graph.matches[0].clone();
        let last = graph.matches.len() - 1;
        graph.matches[last].slot_a = first.slot_a.clone();
        graph.matches[last].slot_b = first.slot_b.clone();

        let report = validate(&graph);
        assert!(report.issues.iter().any(|i| i.contains("meet twice")));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let (_, report) = build(8, json!({"engine": "double", "finals": "single"}), json!({}));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["expectedMatches"], 14);
        assert_eq!(value["actualRounds"], 6);
        assert_eq!(value["mathematicsCorrect"], true);
        assert_eq!(value["configEngine"], "double");
        assert_eq!(value["tournamentType"], "double-elimination");
    }

    #[test]
    fn test_lives_formats_report_double_engine() {
        let (_, triple) = build(
            8,
            json!({"engine": "single"}),
            json!({"tournamentType": "triple-elimination"}),
        );
        let (_, guarantee) = build(
            8,
            json!({"engine": "single"}),
            json!({"tournamentType": "game-guarantee", "gameGuarantee": 3}),
        );
        for report in [triple, guarantee] {
            let value = serde_json::to_value(&report).unwrap();
            assert_eq!(value["configEngine"], "double", "{}", value["tournamentType"]);
        }
    }

    #[test]
    fn test_elimination_rounds_closed_form() {
        for depth in 1..=7 {
            let n = 1u32 << depth;
            assert_eq!(double_rounds(n), 2 * depth, "n = {n}");
            assert_eq!(triple_rounds(n), 3 * depth, "n = {n}");
            assert_eq!(replayed_double_rounds(n), double_rounds(n), "n = {n}");
            assert_eq!(replayed_triple_rounds(n), triple_rounds(n), "n = {n}");
        }
    }

    #[test]
    fn test_generated_elimination_rounds_match_closed_form() {
        for n in [2usize, 4, 16, 32] {
            let depth = n.trailing_zeros();
            let (double, _) = build(n, json!({"engine": "double", "finals": "single"}), json!({}));
            assert_eq!(double.total_rounds, 2 * depth, "double n = {n}");

            let (triple, _) = build(
                n,
                json!({"engine": "single"}),
                json!({"tournamentType": "triple-elimination"}),
            );
            assert_eq!(triple.total_rounds, 3 * depth, "triple n = {n}");
        }
    }
}
