//! Game guarantee.
//!
//! Every entrant plays at least `k` games before elimination is final. The
//! guarantee is met with a short round-robin phase (circle-method rounds,
//! cut off as soon as everyone has `k` games). The top half of its standings
//! then plays a championship knockout and the bottom half a consolation
//! knockout.

use super::{BracketBuilder, BuildContext, Format};
use crate::errors::{BracketError, BracketResult};
use crate::graph::builder::{GraphBuilder, circle_rounds};
use crate::graph::{FormatParams, MatchGraph, ParticipantId, Pool, Slot};
use std::collections::HashMap;

pub const GUARANTEE_POOL: &str = "guarantee";
pub const CHAMPIONSHIP_BRACKET: &str = "championship";
pub const CONSOLATION_BRACKET: &str = "consolation";

#[derive(Debug, Clone, Copy, Default)]
pub struct GameGuarantee;

impl GameGuarantee {
    /// Rounds of the guarantee phase needed for `k` games each
    pub fn guarantee_rounds(participants: usize, k: u32) -> Option<u32> {
        let ids: Vec<ParticipantId> = (1..=participants as u32).map(ParticipantId).collect();
        let schedule = circle_rounds(&ids);
        Self::rounds_needed(&schedule, &ids, k)
    }

    fn rounds_needed(
        schedule: &[Vec<(ParticipantId, ParticipantId)>],
        entrants: &[ParticipantId],
        k: u32,
    ) -> Option<u32> {
        let mut games: HashMap<ParticipantId, u32> = entrants.iter().map(|p| (*p, 0)).collect();
        let mut used = 0;
        while games.values().any(|&played| played < k) {
            let round = schedule.get(used)?;
            for (a, b) in round {
                *games.entry(*a).or_default() += 1;
                *games.entry(*b).or_default() += 1;
            }
            used += 1;
        }
        Some(used as u32)
    }
}

impl BracketBuilder for GameGuarantee {
    fn format(&self) -> Format {
        Format::GameGuarantee
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        ctx.require_participants(2, Format::GameGuarantee)?;
        ctx.check_stage_size()?;

        let k = ctx
            .format_config
            .game_guarantee
            .or(ctx.stage.game_guarantee)
            .ok_or_else(|| BracketError::config("game guarantee requires a gameGuarantee value"))?;
        if k == 0 {
            return Err(BracketError::config("gameGuarantee must be at least 1"));
        }

        let seeded = ctx.seeded();
        let mut schedule = circle_rounds(&seeded);
        let rounds = Self::rounds_needed(&schedule, &seeded, k).ok_or_else(|| {
            BracketError::config(format!(
                "{} participants cannot each play {k} games without repeat pairings",
                seeded.len()
            ))
        })?;
        schedule.truncate(rounds as usize);

        let mut builder = GraphBuilder::new();
        builder.scheduled_rounds(GUARANTEE_POOL, schedule);

        let n = seeded.len() as u32;
        let upper = n.div_ceil(2);
        let placement = |rank: u32| Slot::Placement {
            pool: GUARANTEE_POOL.to_string(),
            rank,
        };
        builder.elimination(CHAMPIONSHIP_BRACKET, (1..=upper).map(placement).collect());
        builder.elimination(CONSOLATION_BRACKET, (upper + 1..=n).map(placement).collect());

        let mut graph = ctx.graph(Format::GameGuarantee, builder)?;
        graph.params = FormatParams {
            game_guarantee: Some(k),
            rounds: Some(rounds),
            ..Default::default()
        };
        graph.pools = vec![Pool {
            name: GUARANTEE_POOL.to_string(),
            participants: seeded,
        }];
        Ok(graph)
    }
}
