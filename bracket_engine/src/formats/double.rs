//! Double elimination.
//!
//! The winners bracket is a plain knockout. Its losers drop into the losers
//! bracket one round at a time, where each wave meets the survivors of the
//! previous ones. The two bracket champions meet in the grand final.
//!
//! With `finals: "double"` the grand final carries a series rule: if the
//! losers-bracket champion wins, the winners-bracket champion has lost only
//! once and the progression engine appends the reset match.

use super::{BracketBuilder, BuildContext, Format};
use crate::config::FinalsMode;
use crate::errors::{BracketError, BracketResult};
use crate::graph::builder::GraphBuilder;
use crate::graph::{MatchGraph, SeriesRule};

pub const WINNERS_BRACKET: &str = "winners";
pub const LOSERS_BRACKET: &str = "losers";
pub const FINAL_BRACKET: &str = "final";

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleElimination;

impl BracketBuilder for DoubleElimination {
    fn format(&self) -> Format {
        Format::Double
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        ctx.require_participants(2, Format::Double)?;
        ctx.check_stage_size()?;
        let finals = ctx.finals(FinalsMode::Single)?;

        let mut builder = GraphBuilder::new();
        let winners = builder.elimination(WINNERS_BRACKET, ctx.seeded_slots());
        let losers = builder.reduce_waves(LOSERS_BRACKET, winners.losers_by_round);

        let (Some(upper), Some(lower)) = (winners.champion, losers.champion) else {
            return Err(BracketError::InternalInvariant(
                "double elimination produced no bracket champion".to_string(),
            ));
        };

        let grand_final = builder.push(FINAL_BRACKET, 1, upper, lower);
        if finals == FinalsMode::Double {
            builder.set_series(grand_final, SeriesRule { loser_min_losses: 2 });
        }

        let mut graph = ctx.graph(Format::Double, builder)?;
        graph.lives = Some(2);
        Ok(graph)
    }
}
