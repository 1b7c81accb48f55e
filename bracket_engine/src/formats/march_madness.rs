//! March Madness: a 68-team field with four play-in games.
//!
//! Seeds 61 through 68 play the First Four (61 v 68, 62 v 67, 63 v 66,
//! 64 v 65). Their winners take seed lines 61 to 64 of the 64-team main
//! bracket, which is a standard knockout.

use super::{BracketBuilder, BuildContext, Format};
use crate::errors::{BracketError, BracketResult};
use crate::graph::builder::GraphBuilder;
use crate::graph::{MatchGraph, Slot};

pub const FIELD_SIZE: usize = 68;
pub const MAIN_FIELD: usize = 64;
pub const FIRST_FOUR_BRACKET: &str = "first-four";
pub const MAIN_BRACKET: &str = "main";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarchMadness;

impl BracketBuilder for MarchMadness {
    fn format(&self) -> Format {
        Format::MarchMadness
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        if ctx.len() != FIELD_SIZE {
            return Err(BracketError::config(format!(
                "March Madness requires exactly {FIELD_SIZE} participants, got {}",
                ctx.len()
            )));
        }
        ctx.check_stage_size()?;

        let seeded = ctx.seeded();
        let play_ins = FIELD_SIZE - MAIN_FIELD;
        let first_play_in = MAIN_FIELD - play_ins;

        let mut builder = GraphBuilder::new();
        let mut field: Vec<Slot> = seeded[..first_play_in]
            .iter()
            .copied()
            .map(Slot::participant)
            .collect();

        for i in 0..play_ins {
            let high = seeded[first_play_in + i];
            let low = seeded[FIELD_SIZE - 1 - i];
            let id = builder.push(
                FIRST_FOUR_BRACKET,
                1,
                Slot::participant(high),
                Slot::participant(low),
            );
            field.push(Slot::winner_of(id));
        }

        builder.elimination(MAIN_BRACKET, field);

        let mut graph = ctx.graph(Format::MarchMadness, builder)?;
        graph.lives = Some(1);
        Ok(graph)
    }
}
