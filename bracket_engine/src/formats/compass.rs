//! Compass draw.
//!
//! East is the main knockout. The losers of each East round form their own
//! knockout (West from round one, North from round two, and so on around the
//! compass), and the first-round losers of each of those form one more level
//! (South under West, Northwest under North, ...). Every entrant keeps
//! playing in some direction until knocked out twice.

use super::{BracketBuilder, BuildContext, Format};
use crate::errors::BracketResult;
use crate::graph::builder::GraphBuilder;
use crate::graph::MatchGraph;

pub const EAST_BRACKET: &str = "east";

/// Fed by the losers of East round 1, 2, ...
const FIRST_LEVEL: [&str; 4] = ["west", "north", "northeast", "southeast"];

/// Fed by the first-round losers of the matching first-level bracket
const SECOND_LEVEL: [&str; 3] = ["south", "northwest", "southwest"];

#[derive(Debug, Clone, Copy, Default)]
pub struct CompassDraw;

impl CompassDraw {
    fn first_level_name(round: usize) -> String {
        FIRST_LEVEL
            .get(round)
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("consolation-{}", round + 1))
    }

    fn second_level_name(round: usize, parent: &str) -> String {
        SECOND_LEVEL
            .get(round)
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("{parent}-consolation"))
    }
}

impl BracketBuilder for CompassDraw {
    fn format(&self) -> Format {
        Format::Compass
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        ctx.require_participants(2, Format::Compass)?;
        ctx.check_stage_size()?;

        let mut builder = GraphBuilder::new();
        let east = builder.elimination(EAST_BRACKET, ctx.seeded_slots());

        for (round, losers) in east.losers_by_round.into_iter().enumerate() {
            if losers.len() < 2 {
                continue;
            }
            let name = Self::first_level_name(round);
            let direction = builder.elimination(&name, losers);

            if let Some(first_losers) = direction.losers_by_round.into_iter().next()
                && first_losers.len() >= 2
            {
                let second = Self::second_level_name(round, &name);
                builder.elimination(&second, first_losers);
            }
        }

        let mut graph = ctx.graph(Format::Compass, builder)?;
        graph.lives = Some(2);
        Ok(graph)
    }
}
