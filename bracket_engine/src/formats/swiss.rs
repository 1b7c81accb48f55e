//! Swiss system.
//!
//! Only round one is paired at creation. Later rounds are placeholders with
//! [`Slot::Pending`] sides; when a round completes the progression engine
//! calls [`pair_round`] with the current standings and fills them in.

use super::{BracketBuilder, BuildContext, Format};
use crate::config::PairingMethod;
use crate::errors::{BracketError, BracketResult};
use crate::graph::builder::GraphBuilder;
use crate::graph::{FormatParams, MatchGraph, ParticipantId, Slot, SwissState};
use std::collections::{HashMap, HashSet};

pub const SWISS_BRACKET: &str = "swiss";

/// Backtracking steps per round before falling back to the repair search
const PAIRING_STEP_LIMIT: usize = 50_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct SwissSystem;

impl SwissSystem {
    /// Most rounds a field is guaranteed to finish without a repeated pairing
    ///
    /// Pairing one round at a time can strand a field well before `n - 1`
    /// rounds: six players after three rounds may have only two triangles
    /// of fresh opponents left. With at most `n / 2` rounds (an odd field
    /// counts its bye as a phantom entrant) everyone still has fresh
    /// opponents among at least half the field, and such a field always
    /// has a full pairing for the repair search to find.
    pub fn max_rounds(participants: usize) -> u32 {
        participants.div_ceil(2) as u32
    }

    pub fn default_rounds(participants: usize) -> u32 {
        participants.next_power_of_two().trailing_zeros().max(1)
    }
}

impl BracketBuilder for SwissSystem {
    fn format(&self) -> Format {
        Format::Swiss
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        ctx.require_participants(2, Format::Swiss)?;
        ctx.check_stage_size()?;

        let n = ctx.len();
        let rounds = ctx.stage.rounds.unwrap_or_else(|| Self::default_rounds(n));
        if rounds == 0 {
            return Err(BracketError::config("swiss rounds must be at least 1"));
        }
        if rounds > Self::max_rounds(n) {
            return Err(BracketError::config(format!(
                "{n} participants cannot play {rounds} swiss rounds without repeat pairings (max {})",
                Self::max_rounds(n)
            )));
        }
        if rounds > ctx.limits.max_swiss_rounds {
            return Err(BracketError::config(format!(
                "swiss rounds {rounds} exceed the limit of {}",
                ctx.limits.max_swiss_rounds
            )));
        }

        let pairing = match ctx.stage.pairing.as_deref() {
            Some(method) => method.parse()?,
            None => PairingMethod::Seed,
        };

        let seeded = ctx.seeded();
        let scores = HashMap::new();
        let first = pair_round(&PairingInput {
            ranked: &seeded,
            scores: &scores,
            played: &HashSet::new(),
            had_bye: &HashSet::new(),
            method: pairing,
        })?;

        let mut builder = GraphBuilder::new();
        for (a, b) in first.pairs {
            builder.push(SWISS_BRACKET, 1, Slot::participant(a), Slot::participant(b));
        }
        if let Some(bye) = first.bye {
            builder.push_bye(SWISS_BRACKET, 1, Slot::participant(bye));
        }

        for round in 2..=rounds {
            for _ in 0..n / 2 {
                builder.push(SWISS_BRACKET, round, Slot::Pending, Slot::Pending);
            }
            if n % 2 == 1 {
                builder.push_bye(SWISS_BRACKET, round, Slot::Pending);
            }
        }

        let mut graph = ctx.graph(Format::Swiss, builder)?;
        graph.params = FormatParams {
            rounds: Some(rounds),
            ..Default::default()
        };
        graph.swiss = Some(SwissState { rounds, pairing });
        Ok(graph)
    }
}

/// State a Swiss round is paired from
#[derive(Debug)]
pub(crate) struct PairingInput<'a> {
    /// Participants in standings order, best first
    pub ranked: &'a [ParticipantId],
    pub scores: &'a HashMap<ParticipantId, f64>,
    /// Pairs already played, stored low id first
    pub played: &'a HashSet<(ParticipantId, ParticipantId)>,
    pub had_bye: &'a HashSet<ParticipantId>,
    pub method: PairingMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RoundPairing {
    pub pairs: Vec<(ParticipantId, ParticipantId)>,
    pub bye: Option<ParticipantId>,
}

pub(crate) fn pair_key(a: ParticipantId, b: ParticipantId) -> (ParticipantId, ParticipantId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Pair one Swiss round without repeating an earlier pairing
///
/// The bye goes to the lowest-ranked participant who has not had one. Within
/// a score group the pairing method decides the preferred opponent; an odd
/// group floats its last player down. Backtracking only departs from the
/// preferred pairing when a repeat forces it. If the bounded search gives
/// up, [`repair_matching`] still finds a pairing whenever one is guaranteed.
pub(crate) fn pair_round(input: &PairingInput<'_>) -> BracketResult<RoundPairing> {
    let mut steps = 0;

    if input.ranked.len() % 2 == 0 {
        if let Some(pairs) = search(input, input.ranked, &mut steps) {
            return Ok(RoundPairing { pairs, bye: None });
        }
    } else {
        for (idx, candidate) in input.ranked.iter().enumerate().rev() {
            if input.had_bye.contains(candidate) {
                continue;
            }
            let rest: Vec<ParticipantId> = input
                .ranked
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, p)| *p)
                .collect();
            if let Some(pairs) = search(input, &rest, &mut steps) {
                return Ok(RoundPairing {
                    pairs,
                    bye: Some(*candidate),
                });
            }
        }
    }

    log::debug!(
        "swiss backtracking gave up after {} steps, repairing a greedy pairing",
        steps
    );
    repaired_pairing(input).ok_or_else(|| exhausted(input.ranked.len()))
}

/// Pairing from [`repair_matching`], with the bye as a phantom opponent
fn repaired_pairing(input: &PairingInput<'_>) -> Option<RoundPairing> {
    let players = input.ranked;
    // Odd fields gain a phantom entrant at index `players.len()`
    let size = players.len() + players.len() % 2;

    let allowed = |x: usize, y: usize| match (players.get(x), players.get(y)) {
        (Some(a), Some(b)) => !input.played.contains(&pair_key(*a, *b)),
        (Some(p), None) | (None, Some(p)) => !input.had_bye.contains(p),
        (None, None) => false,
    };

    let mut pairing = RoundPairing {
        pairs: Vec::with_capacity(size / 2),
        bye: None,
    };
    for (x, y) in repair_matching(size, allowed)? {
        match (players.get(x), players.get(y)) {
            (Some(a), Some(b)) => pairing.pairs.push((*a, *b)),
            (Some(p), None) | (None, Some(p)) => pairing.bye = Some(*p),
            (None, None) => {}
        }
    }
    Some(pairing)
}

/// Perfect matching over `0..size` using only `allowed` pairs
///
/// Greedy first, then each pair of unmatched players `u, v` is fixed either
/// directly or by splitting a matched pair `x, y` into `u-x` and `v-y`.
/// Every step grows the matching, and when every player may meet at least
/// half of the others a split always exists, so the result is complete.
pub(crate) fn repair_matching(
    size: usize,
    allowed: impl Fn(usize, usize) -> bool,
) -> Option<Vec<(usize, usize)>> {
    if size % 2 == 1 {
        return None;
    }

    let mut partner: Vec<Option<usize>> = vec![None; size];
    for x in 0..size {
        if partner[x].is_some() {
            continue;
        }
        if let Some(y) = (x + 1..size).find(|&y| partner[y].is_none() && allowed(x, y)) {
            partner[x] = Some(y);
            partner[y] = Some(x);
        }
    }

    while let Some(u) = partner.iter().position(Option::is_none) {
        let unmatched: Vec<usize> = (u + 1..size).filter(|&v| partner[v].is_none()).collect();
        let mut grown = false;
        for v in unmatched {
            if allowed(u, v) {
                partner[u] = Some(v);
                partner[v] = Some(u);
                grown = true;
                break;
            }

            let split = (0..size).find_map(|x| {
                let y = partner[x]?;
                (allowed(u, x) && allowed(v, y)).then_some((x, y))
            });
            if let Some((x, y)) = split {
                partner[u] = Some(x);
                partner[x] = Some(u);
                partner[v] = Some(y);
                partner[y] = Some(v);
                grown = true;
                break;
            }
        }
        if !grown {
            return None;
        }
    }

    Some(
        partner
            .iter()
            .enumerate()
            .filter_map(|(x, y)| y.filter(|&y| x < y).map(|y| (x, y)))
            .collect(),
    )
}

fn exhausted(n: usize) -> BracketError {
    BracketError::InternalInvariant(format!(
        "no swiss pairing without repeats exists for {n} remaining participants"
    ))
}

fn search(
    input: &PairingInput<'_>,
    players: &[ParticipantId],
    steps: &mut usize,
) -> Option<Vec<(ParticipantId, ParticipantId)>> {
    let preferred = preferred_partners(input, players);
    let rank: HashMap<ParticipantId, usize> =
        players.iter().enumerate().map(|(i, p)| (*p, i)).collect();

    let mut paired = vec![false; players.len()];
    let mut pairs = Vec::with_capacity(players.len() / 2);
    backtrack(input, players, &preferred, &rank, &mut paired, &mut pairs, steps).then_some(pairs)
}

/// Depth-first pairing; false when no pairing exists or the step limit is hit
fn backtrack(
    input: &PairingInput<'_>,
    players: &[ParticipantId],
    preferred: &HashMap<ParticipantId, ParticipantId>,
    rank: &HashMap<ParticipantId, usize>,
    paired: &mut [bool],
    pairs: &mut Vec<(ParticipantId, ParticipantId)>,
    steps: &mut usize,
) -> bool {
    *steps += 1;
    if *steps > PAIRING_STEP_LIMIT {
        return false;
    }

    let Some(first) = paired.iter().position(|done| !done) else {
        return true;
    };
    let player = players[first];
    let score = |p: &ParticipantId| input.scores.get(p).copied().unwrap_or(0.0);

    let mut candidates: Vec<usize> = (first + 1..players.len()).filter(|&i| !paired[i]).collect();
    candidates.sort_by(|&x, &y| {
        let px = players[x];
        let py = players[y];
        let ideal_x = preferred.get(&player) != Some(&px);
        let ideal_y = preferred.get(&player) != Some(&py);
        ideal_x
            .cmp(&ideal_y)
            .then_with(|| {
                (score(&player) - score(&px))
                    .abs()
                    .total_cmp(&(score(&player) - score(&py)).abs())
            })
            .then_with(|| rank[&px].cmp(&rank[&py]))
    });

    paired[first] = true;
    for idx in candidates {
        let opponent = players[idx];
        if input.played.contains(&pair_key(player, opponent)) {
            continue;
        }
        paired[idx] = true;
        pairs.push((player, opponent));
        if backtrack(input, players, preferred, rank, paired, pairs, steps) {
            return true;
        }
        pairs.pop();
        paired[idx] = false;
    }
    paired[first] = false;

    false
}

/// Ideal opponent of each player under the pairing method, ignoring history
fn preferred_partners(
    input: &PairingInput<'_>,
    players: &[ParticipantId],
) -> HashMap<ParticipantId, ParticipantId> {
    let score = |p: &ParticipantId| input.scores.get(p).copied().unwrap_or(0.0);
    let mut partners = HashMap::with_capacity(players.len());
    let mut floater: Option<ParticipantId> = None;
    let mut idx = 0;

    while idx < players.len() {
        let group_score = score(&players[idx]);
        let mut group: Vec<ParticipantId> = floater.take().into_iter().collect();
        while idx < players.len() && score(&players[idx]) == group_score {
            group.push(players[idx]);
            idx += 1;
        }
        if group.len() % 2 == 1 {
            floater = group.pop();
        }

        let half = group.len() / 2;
        for i in 0..half {
            let (a, b) = match input.method {
                PairingMethod::Seed => (group[i], group[i + half]),
                PairingMethod::Fold => (group[i], group[group.len() - 1 - i]),
                PairingMethod::Adjacent => (group[2 * i], group[2 * i + 1]),
            };
            partners.insert(a, b);
            partners.insert(b, a);
        }
    }

    partners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::test_support::build;
    use serde_json::json;

    fn ids(n: u32) -> Vec<ParticipantId> {
        (1..=n).map(ParticipantId).collect()
    }

    fn input<'a>(
        ranked: &'a [ParticipantId],
        scores: &'a HashMap<ParticipantId, f64>,
        played: &'a HashSet<(ParticipantId, ParticipantId)>,
        had_bye: &'a HashSet<ParticipantId>,
        method: PairingMethod,
    ) -> PairingInput<'a> {
        PairingInput {
            ranked,
            scores,
            played,
            had_bye,
            method,
        }
    }

    #[test]
    fn test_first_round_methods() {
        let ranked = ids(8);
        let scores = HashMap::new();
        let played = HashSet::new();
        let byes = HashSet::new();

        let seed = pair_round(&input(&ranked, &scores, &played, &byes, PairingMethod::Seed)).unwrap();
        assert_eq!(seed.pairs[0], (ParticipantId(1), ParticipantId(5)));

        let fold = pair_round(&input(&ranked, &scores, &played, &byes, PairingMethod::Fold)).unwrap();
        assert_eq!(fold.pairs[0], (ParticipantId(1), ParticipantId(8)));

        let adjacent =
            pair_round(&input(&ranked, &scores, &played, &byes, PairingMethod::Adjacent)).unwrap();
        assert_eq!(adjacent.pairs[0], (ParticipantId(1), ParticipantId(2)));
    }

    #[test]
    fn test_avoids_repeat_pairings() {
        let ranked = ids(4);
        let scores: HashMap<_, _> = [(ParticipantId(1), 3.0), (ParticipantId(2), 3.0)]
            .into_iter()
            .collect();
        let played: HashSet<_> = [
            pair_key(ParticipantId(1), ParticipantId(2)),
            pair_key(ParticipantId(3), ParticipantId(4)),
        ]
        .into_iter()
        .collect();
        let byes = HashSet::new();

        let pairing =
            pair_round(&input(&ranked, &scores, &played, &byes, PairingMethod::Adjacent)).unwrap();
        for (a, b) in &pairing.pairs {
            assert!(!played.contains(&pair_key(*a, *b)));
        }
        assert_eq!(pairing.pairs.len(), 2);
    }

    #[test]
    fn test_bye_goes_to_lowest_without_one() {
        let ranked = ids(5);
        let scores = HashMap::new();
        let played = HashSet::new();
        let byes: HashSet<_> = [ParticipantId(5)].into_iter().collect();

        let pairing = pair_round(&input(&ranked, &scores, &played, &byes, PairingMethod::Seed)).unwrap();
        assert_eq!(pairing.bye, Some(ParticipantId(4)));
        assert_eq!(pairing.pairs.len(), 2);
    }

    #[test]
    fn test_impossible_pairing_is_reported() {
        let ranked = ids(2);
        let scores = HashMap::new();
        let played: HashSet<_> = [pair_key(ParticipantId(1), ParticipantId(2))]
            .into_iter()
            .collect();
        let byes = HashSet::new();

        assert!(matches!(
            pair_round(&input(&ranked, &scores, &played, &byes, PairingMethod::Seed)),
            Err(BracketError::InternalInvariant(_))
        ));
    }

    #[test]
    fn test_builds_pending_rounds() {
        let (graph, report) = build(8, json!({"engine": "swiss", "rounds": 4}), json!({}));
        assert_eq!(graph.total_matches, 16);
        assert_eq!(graph.total_rounds, 4);
        assert!(report.mathematics_correct, "{:?}", report.issues);
        assert!(graph
            .matches_in(SWISS_BRACKET)
            .filter(|m| m.round > 1)
            .all(|m| m.slot_a == Slot::Pending));
    }

    #[test]
    fn test_default_rounds_and_odd_field() {
        let (graph, report) = build(7, json!({"engine": "swiss"}), json!({}));
        assert_eq!(graph.swiss.map(|s| s.rounds), Some(3));
        assert_eq!(graph.total_matches, 9);
        assert!(report.mathematics_correct, "{:?}", report.issues);
    }

    #[test]
    fn test_max_rounds_bound() {
        assert_eq!(SwissSystem::max_rounds(2), 1);
        assert_eq!(SwissSystem::max_rounds(6), 3);
        assert_eq!(SwissSystem::max_rounds(7), 4);
        assert_eq!(SwissSystem::max_rounds(8), 4);
        for n in 2..=64 {
            assert!(SwissSystem::default_rounds(n) <= SwissSystem::max_rounds(n), "n = {n}");
        }
    }

    #[test]
    fn test_repair_splits_a_matched_pair() {
        // Greedy takes 0-1 and strands 2 and 3, which may not meet
        let allowed = |x: usize, y: usize| matches!((x.min(y), x.max(y)), (0, 1) | (0, 2) | (1, 3));
        let mut pairs = repair_matching(4, allowed).unwrap();
        pairs.sort();
        assert_eq!(pairs, vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_repair_reports_impossible_fields() {
        // Two triangles of fresh opponents have no full pairing
        let triangle = |x: usize, y: usize| x != y && (x < 3) == (y < 3);
        assert_eq!(repair_matching(6, triangle), None);
        assert_eq!(repair_matching(3, |_, _| true), None);
    }

    #[test]
    fn test_repair_places_the_bye() {
        let ranked = ids(3);
        let scores = HashMap::new();
        let played: HashSet<_> = [pair_key(ParticipantId(1), ParticipantId(2))]
            .into_iter()
            .collect();
        let byes: HashSet<_> = [ParticipantId(3)].into_iter().collect();

        let pairing =
            repaired_pairing(&input(&ranked, &scores, &played, &byes, PairingMethod::Seed)).unwrap();
        assert!(pairing.bye == Some(ParticipantId(1)) || pairing.bye == Some(ParticipantId(2)));
        assert_eq!(pairing.pairs.len(), 1);
        assert!(pairing.pairs[0].0 == ParticipantId(3) || pairing.pairs[0].1 == ParticipantId(3));
    }

    #[test]
    fn test_too_many_rounds_rejected() {
        let request = crate::formats::test_support::request(
            4,
            json!({"engine": "swiss", "rounds": 3}),
            json!({}),
        );
        assert!(matches!(
            crate::engine::generate(&request, &crate::config::Limits::default()),
            Err(BracketError::Configuration(_))
        ));
    }
}
