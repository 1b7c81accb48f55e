//! Round robin.

use super::{BracketBuilder, BuildContext, Format};
use crate::errors::BracketResult;
use crate::graph::MatchGraph;
use crate::graph::builder::GraphBuilder;

pub const ROUND_ROBIN_BRACKET: &str = "round-robin";

/// Everyone meets everyone once, scheduled by the circle method
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl BracketBuilder for RoundRobin {
    fn format(&self) -> Format {
        Format::RoundRobin
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        ctx.require_participants(2, Format::RoundRobin)?;
        ctx.check_stage_size()?;

        let mut builder = GraphBuilder::new();
        let rounds = builder.round_robin(ROUND_ROBIN_BRACKET, &ctx.seeded());
        log::debug!("Scheduled round robin over {} rounds", rounds);

        ctx.graph(Format::RoundRobin, builder)
    }
}
