//! Triple elimination.
//!
//! Three lives, three brackets. First losses drop from the winners bracket
//! into the losers bracket; second losses drop from there into the
//! last-chance bracket. The winners and losers champions meet in a challenge
//! match, and its winner meets the last-chance champion in the grand final.
//! Series rules keep anyone from leaving the challenge with fewer than two
//! losses or the grand final with fewer than three.

use super::{BracketBuilder, BuildContext, Format};
use crate::config::FinalsMode;
use crate::errors::{BracketError, BracketResult};
use crate::graph::builder::GraphBuilder;
use crate::graph::{MatchGraph, SeriesRule, Slot};

pub const WINNERS_BRACKET: &str = "winners";
pub const LOSERS_BRACKET: &str = "losers";
pub const LAST_CHANCE_BRACKET: &str = "last-chance";
pub const CHALLENGE_BRACKET: &str = "challenge";
pub const FINAL_BRACKET: &str = "final";

#[derive(Debug, Clone, Copy, Default)]
pub struct TripleElimination;

impl BracketBuilder for TripleElimination {
    fn format(&self) -> Format {
        Format::Triple
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        ctx.require_participants(2, Format::Triple)?;
        ctx.check_stage_size()?;
        let finals = ctx.finals(FinalsMode::Double)?;

        let mut builder = GraphBuilder::new();
        let winners = builder.elimination(WINNERS_BRACKET, ctx.seeded_slots());
        let losers = builder.reduce_waves(LOSERS_BRACKET, winners.losers_by_round);

        let (Some(upper), Some(middle)) = (winners.champion, losers.champion) else {
            return Err(BracketError::InternalInvariant(
                "triple elimination produced no bracket champion".to_string(),
            ));
        };
        let challenge = builder.push(CHALLENGE_BRACKET, 1, upper, middle);
        builder.set_series(challenge, SeriesRule { loser_min_losses: 2 });

        let mut waves = losers.losers_by_round;
        waves.push(vec![Slot::loser_of(challenge)]);
        let last_chance = builder.reduce_waves(LAST_CHANCE_BRACKET, waves);
        let Some(lower) = last_chance.champion else {
            return Err(BracketError::InternalInvariant(
                "last-chance bracket produced no champion".to_string(),
            ));
        };

        let grand_final = builder.push(FINAL_BRACKET, 1, Slot::winner_of(challenge), lower);
        if finals == FinalsMode::Double {
            builder.set_series(grand_final, SeriesRule { loser_min_losses: 3 });
        }

        let mut graph = ctx.graph(Format::Triple, builder)?;
        graph.lives = Some(3);
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use crate::formats::test_support::build;
    use serde_json::json;

    #[test]
    fn test_eight_participants() {
        let (graph, report) = build(
            8,
            json!({"engine": "single"}),
            json!({"tournamentType": "triple-elimination"}),
        );
        assert_eq!(graph.total_matches, 21);
        assert_eq!(graph.total_rounds, 9);
        assert_eq!(graph.lives, Some(3));
        assert!(report.mathematics_correct, "{:?}", report.issues);
    }

    #[test]
    fn test_minimum_field() {
        let (graph, report) = build(
            2,
            json!({"engine": "single"}),
            json!({"tournamentType": "triple-elimination"}),
        );
        assert_eq!(graph.total_matches, 3);
        assert!(report.mathematics_correct, "{:?}", report.issues);
    }

    #[test]
    fn test_match_count_is_three_n_minus_three() {
        for n in [3, 5, 9, 12] {
            let (graph, report) = build(
                n,
                json!({"engine": "single"}),
                json!({"tournamentType": "triple"}),
            );
            assert_eq!(graph.total_matches as usize, 3 * n - 3, "n = {n}");
            assert!(report.mathematics_correct, "n = {n}: {:?}", report.issues);
        }
    }
}
