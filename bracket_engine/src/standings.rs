//! Standings, leaderboard ranking and prediction scoring.
//!
//! Round-robin style standings order participants by points, then by the
//! configured tiebreakers in order, then by seed. The seed fallback makes the
//! order total, so pool placements are always well defined.

use crate::config::Tiebreaker;
use crate::graph::{Leaderboard, Match, MatchGraph, MatchStatus, ParticipantId, Slot};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One line of a standings table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub rank: u32,
    pub participant: ParticipantId,
    pub name: String,
    pub seed: u32,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub byes: u32,
    pub points: f64,
    pub score_for: u32,
    pub score_against: u32,
    pub head_to_head: f64,
    pub buchholz: f64,
}

impl StandingRow {
    pub fn score_difference(&self) -> i64 {
        i64::from(self.score_for) - i64::from(self.score_against)
    }
}

/// Ranked leaderboard line; `rank` is absent until a value is recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: Option<u32>,
    pub participant: ParticipantId,
    pub name: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictorScore {
    pub predictor: String,
    pub name: String,
    pub points: u64,
    pub correct: u32,
    pub picks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStandings {
    pub pool: String,
    pub complete: bool,
    pub table: Vec<StandingRow>,
}

/// Everything the standings endpoint reports for a bracket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsView {
    pub table: Vec<StandingRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<PoolStandings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Vec<LeaderboardRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<PredictorScore>>,
    pub complete: bool,
}

/// Standings of `members` over the matches selected by `in_scope`
///
/// Resolved byes in scope count as wins.
pub fn table<F>(graph: &MatchGraph, members: &[ParticipantId], in_scope: F) -> Vec<StandingRow>
where
    F: Fn(&Match) -> bool,
{
    let mut rows: HashMap<ParticipantId, StandingRow> = members
        .iter()
        .map(|&participant| {
            let row = StandingRow {
                rank: 0,
                participant,
                name: graph
                    .participant(participant)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                seed: graph.seed_of(participant).unwrap_or(u32::MAX),
                played: 0,
                wins: 0,
                draws: 0,
                losses: 0,
                byes: 0,
                points: 0.0,
                score_for: 0,
                score_against: 0,
                head_to_head: 0.0,
                buchholz: 0.0,
            };
            (participant, row)
        })
        .collect();

    let scoring = graph.scoring;
    // (participant, opponent, points earned)
    let mut meetings: Vec<(ParticipantId, ParticipantId, f64)> = Vec::new();

    for m in graph.matches.iter().filter(|m| in_scope(m)) {
        match m.status {
            MatchStatus::Bye => {
                if let Some(winner) = m.winner()
                    && let Some(row) = rows.get_mut(&winner)
                {
                    row.byes += 1;
                    row.wins += 1;
                    row.points += scoring.win;
                }
            }
            MatchStatus::Completed => {
                let (Some(a), Some(b)) = (m.slot_a.participant_id(), m.slot_b.participant_id())
                else {
                    continue;
                };
                let winner = m.winner();
                for (me, opponent, is_a) in [(a, b, true), (b, a, false)] {
                    let earned = match winner {
                        None => scoring.draw,
                        Some(w) if w == me => scoring.win,
                        Some(_) => scoring.loss,
                    };
                    meetings.push((me, opponent, earned));

                    let Some(row) = rows.get_mut(&me) else {
                        continue;
                    };
                    row.played += 1;
                    row.points += earned;
                    match winner {
                        None => row.draws += 1,
                        Some(w) if w == me => row.wins += 1,
                        Some(_) => row.losses += 1,
                    }
                    if let Some(score) = m.result.as_ref().and_then(|r| r.score) {
                        let (mine, theirs) = if is_a { (score.a, score.b) } else { (score.b, score.a) };
                        row.score_for += mine;
                        row.score_against += theirs;
                    }
                }
            }
            _ => {}
        }
    }

    let points: HashMap<ParticipantId, f64> =
        rows.iter().map(|(id, row)| (*id, row.points)).collect();
    for (me, opponent, earned) in meetings {
        let Some(row) = rows.get_mut(&me) else {
            continue;
        };
        let opponent_points = points.get(&opponent).copied();
        row.buchholz += opponent_points.unwrap_or(0.0);
        if opponent_points == Some(row.points) {
            row.head_to_head += earned;
        }
    }

    let mut ordered: Vec<StandingRow> = rows.into_values().collect();
    ordered.sort_by(|x, y| compare(x, y, &graph.tiebreakers));
    for (idx, row) in ordered.iter_mut().enumerate() {
        row.rank = idx as u32 + 1;
    }
    ordered
}

fn compare(x: &StandingRow, y: &StandingRow, tiebreakers: &[Tiebreaker]) -> Ordering {
    let mut ordering = y.points.total_cmp(&x.points);
    for tiebreaker in tiebreakers {
        if ordering != Ordering::Equal {
            break;
        }
        ordering = match tiebreaker {
            Tiebreaker::HeadToHead => y.head_to_head.total_cmp(&x.head_to_head),
            Tiebreaker::ScoreDifference => y.score_difference().cmp(&x.score_difference()),
            Tiebreaker::ScoreFor => y.score_for.cmp(&x.score_for),
            Tiebreaker::Wins => y.wins.cmp(&x.wins),
            Tiebreaker::Buchholz => y.buchholz.total_cmp(&x.buchholz),
        };
    }
    ordering
        .then_with(|| x.seed.cmp(&y.seed))
        .then_with(|| x.participant.cmp(&y.participant))
}

/// Standings of one round-robin pool
pub fn pool_table(graph: &MatchGraph, pool: &str) -> Vec<StandingRow> {
    let members = graph
        .pools
        .iter()
        .find(|p| p.name == pool)
        .map(|p| p.participants.clone())
        .unwrap_or_default();
    table(graph, &members, |m| m.bracket == pool)
}

/// Every match of the bracket resolved
pub fn bracket_complete(graph: &MatchGraph, bracket: &str) -> bool {
    graph.matches_in(bracket).all(Match::is_resolved)
}

/// Competition ranking (1, 2, 2, 4) of measured entries, unmeasured last
pub fn rank_leaderboard(graph: &MatchGraph, board: &Leaderboard) -> Vec<LeaderboardRow> {
    let higher_is_better = board.measure_type.higher_is_better();
    let seed = |id: ParticipantId| graph.seed_of(id).unwrap_or(u32::MAX);

    let mut measured: Vec<(ParticipantId, f64)> = board
        .entries
        .iter()
        .filter_map(|e| e.value.map(|v| (e.participant, v)))
        .collect();
    measured.sort_by(|a, b| {
        let by_value = if higher_is_better {
            b.1.total_cmp(&a.1)
        } else {
            a.1.total_cmp(&b.1)
        };
        by_value.then_with(|| seed(a.0).cmp(&seed(b.0)))
    });

    let name = |id: ParticipantId| {
        graph
            .participant(id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    };

    let mut rows = Vec::with_capacity(board.entries.len());
    let mut previous: Option<(f64, u32)> = None;
    for (idx, (participant, value)) in measured.into_iter().enumerate() {
        let rank = match previous {
            Some((last, rank)) if last == value => rank,
            _ => idx as u32 + 1,
        };
        previous = Some((value, rank));
        rows.push(LeaderboardRow {
            rank: Some(rank),
            participant,
            name: name(participant),
            value: Some(value),
        });
    }

    let mut pending: Vec<ParticipantId> = board
        .entries
        .iter()
        .filter(|e| e.value.is_none())
        .map(|e| e.participant)
        .collect();
    pending.sort_by_key(|id| seed(*id));
    rows.extend(pending.into_iter().map(|participant| LeaderboardRow {
        rank: None,
        participant,
        name: name(participant),
        value: None,
    }));
    rows
}

/// Points for a correct pick: doubles every round
pub fn pick_value(round: u32) -> u64 {
    1u64 << round.saturating_sub(1).min(62)
}

/// Predictor scores, best first
pub fn prediction_scores(graph: &MatchGraph) -> Vec<PredictorScore> {
    let Some(pool) = &graph.predictions else {
        return Vec::new();
    };

    let mut scores: Vec<PredictorScore> = pool
        .predictors
        .iter()
        .map(|predictor| {
            let mut score = PredictorScore {
                predictor: predictor.id.clone(),
                name: predictor.name.clone(),
                points: 0,
                correct: 0,
                picks: 0,
            };
            for pick in pool.picks.iter().filter(|p| p.predictor == predictor.id) {
                score.picks += 1;
                if let Some(m) = graph.get(pick.match_id)
                    && m.status == MatchStatus::Completed
                    && m.winner() == Some(pick.participant)
                {
                    score.correct += 1;
                    score.points += pick_value(m.round);
                }
            }
            score
        })
        .collect();

    scores.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.predictor.cmp(&b.predictor)));
    scores
}

/// Standings for every kind of bracket
pub fn summarize(graph: &MatchGraph) -> StandingsView {
    let everyone = graph.seeded_participants();
    let pool_names: Vec<&str> = graph.pools.iter().map(|p| p.name.as_str()).collect();
    let swiss = graph.swiss.is_some();

    let overall = table(graph, &everyone, |m| {
        m.is_contested() || (swiss && !matches!(m.slot_a, Slot::Pending))
    });

    let pools = pool_names
        .iter()
        .map(|pool| PoolStandings {
            pool: pool.to_string(),
            complete: bracket_complete(graph, pool),
            table: pool_table(graph, pool),
        })
        .collect();

    StandingsView {
        table: overall,
        pools,
        leaderboard: graph
            .leaderboard
            .as_ref()
            .map(|board| rank_leaderboard(graph, board)),
        predictions: graph.predictions.as_ref().map(|_| prediction_scores(graph)),
        complete: graph.is_complete(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::test_support::build;
    use crate::graph::{MatchResult, Score};
    use serde_json::json;

    fn complete(graph: &mut MatchGraph, idx: usize, winner_is_a: Option<bool>, score: Score) {
        let m = &mut graph.matches[idx];
        let a = m.slot_a.participant_id();
        let b = m.slot_b.participant_id();
        let (winner, loser) = match winner_is_a {
            Some(true) => (a, b),
            Some(false) => (b, a),
            None => (None, None),
        };
        m.status = MatchStatus::Completed;
        m.result = Some(MatchResult {
            winner,
            loser,
            score: Some(score),
        });
    }

    #[test]
    fn test_points_then_seed() {
        let (mut graph, _) = build(4, json!({"engine": "round_robin"}), json!({}));
        for idx in 0..graph.matches.len() {
            complete(&mut graph, idx, None, Score { a: 1, b: 1 });
        }
        let rows = table(&graph, &graph.seeded_participants(), |m| m.is_contested());
        assert!(rows.iter().all(|r| r.points == 3.0 && r.draws == 3));
        let order: Vec<u32> = rows.iter().map(|r| r.seed).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_score_difference_breaks_ties() {
        let (mut graph, _) = build(
            3,
            json!({"engine": "round_robin", "tiebreakers": ["score_difference"]}),
            json!({}),
        );
        // 1 beats 2, 2 beats 3, 3 beats 1: a three-way tie on points
        for idx in 0..graph.matches.len() {
            let a = graph.matches[idx].slot_a.participant_id().unwrap();
            let b = graph.matches[idx].slot_b.participant_id().unwrap();
            let a_wins = a.0 % 3 + 1 == b.0;
            let margin = if a == ParticipantId(3) || b == ParticipantId(3) { 5 } else { 1 };
            let score = if a_wins {
                Score { a: margin, b: 0 }
            } else {
                Score { a: 0, b: margin }
            };
            complete(&mut graph, idx, Some(a_wins), score);
        }

        let rows = table(&graph, &graph.seeded_participants(), |m| m.is_contested());
        assert!(rows.iter().all(|r| r.wins == 1));
        let order: Vec<ParticipantId> = rows.iter().map(|r| r.participant).collect();
        assert_eq!(order, vec![ParticipantId(2), ParticipantId(3), ParticipantId(1)]);
    }

    #[test]
    fn test_leaderboard_competition_ranking() {
        let (mut graph, _) = build(
            4,
            json!({"engine": "leaderboard", "events": [{"name": "Sprint", "measureType": "time"}]}),
            json!({}),
        );
        let board = graph.leaderboard.as_mut().unwrap();
        board.entries[0].value = Some(12.5);
        board.entries[1].value = Some(11.0);
        board.entries[2].value = Some(12.5);

        let board = graph.leaderboard.clone().unwrap();
        let rows = rank_leaderboard(&graph, &board);
        let ranks: Vec<Option<u32>> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(2), None]);
        assert_eq!(rows[0].participant, ParticipantId(2));
    }

    #[test]
    fn test_pick_value_doubles() {
        assert_eq!(pick_value(1), 1);
        assert_eq!(pick_value(2), 2);
        assert_eq!(pick_value(4), 8);
    }
}
