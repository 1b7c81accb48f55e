//! Free-for-all leaderboard.

use super::{BracketBuilder, BuildContext, Format};
use crate::config::MeasureType;
use crate::errors::{BracketError, BracketResult};
use crate::graph::builder::GraphBuilder;
use crate::graph::{Leaderboard, LeaderboardEntry, MatchGraph};

const DEFAULT_EVENT: &str = "Leaderboard";

/// Every entrant posts one measured result; no head-to-head matches
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeForAll;

impl BracketBuilder for FreeForAll {
    fn format(&self) -> Format {
        Format::Leaderboard
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        ctx.require_participants(1, Format::Leaderboard)?;
        ctx.check_stage_size()?;

        if ctx.stage.events.len() > 1 {
            return Err(BracketError::config(format!(
                "a leaderboard stage ranks one event, got {}",
                ctx.stage.events.len()
            )));
        }
        let event = ctx.stage.events.first();

        let measure_type = match event.and_then(|e| e.measure_type.as_deref()) {
            Some(measure) => measure.parse()?,
            None => MeasureType::Score,
        };
        if let Some(max) = event.and_then(|e| e.max_participants)
            && ctx.len() > max as usize
        {
            return Err(BracketError::config(format!(
                "event allows {max} participants, got {}",
                ctx.len()
            )));
        }

        let name = event
            .map(|e| e.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_EVENT)
            .to_string();

        let mut graph = ctx.graph(Format::Leaderboard, GraphBuilder::new())?;
        graph.leaderboard = Some(Leaderboard {
            event: name,
            measure_type,
            unit: event.and_then(|e| e.unit.clone()),
            entries: ctx
                .seeded()
                .into_iter()
                .map(|participant| LeaderboardEntry {
                    participant,
                    value: None,
                })
                .collect(),
        });
        Ok(graph)
    }
}
