//! Pool play: round-robin groups feeding a knockout.
//!
//! Participants are snake-seeded into groups (A B C C B A ...), each group
//! plays a round robin, and the top `advancePerGroup` of every group enter
//! an elimination bracket. Group winners are seeded first, runners-up next
//! in reverse group order, so entrants from one group avoid each other early.

use super::{BracketBuilder, BuildContext, Format};
use crate::errors::{BracketError, BracketResult};
use crate::graph::builder::GraphBuilder;
use crate::graph::{FormatParams, MatchGraph, ParticipantId, Pool, Slot};

pub const ELIMINATION_BRACKET: &str = "elimination";
pub const DEFAULT_ADVANCE_PER_GROUP: u32 = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolPlay;

/// `pool-a`, `pool-b`, ..., `pool-z`, `pool-27`, ...
pub fn pool_name(index: usize) -> String {
    match u8::try_from(index).ok().filter(|i| *i < 26) {
        Some(i) => format!("pool-{}", (b'a' + i) as char),
        None => format!("pool-{}", index + 1),
    }
}

/// Distribute seeds over `groups` in snake order
pub fn snake_groups(seeded: &[ParticipantId], groups: usize) -> Vec<Vec<ParticipantId>> {
    let mut out = vec![Vec::new(); groups];
    for (idx, participant) in seeded.iter().enumerate() {
        let row = idx / groups;
        let col = idx % groups;
        let group = if row % 2 == 0 { col } else { groups - 1 - col };
        out[group].push(*participant);
    }
    out
}

impl BracketBuilder for PoolPlay {
    fn format(&self) -> Format {
        Format::Pool
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        ctx.require_participants(2, Format::Pool)?;

        let n = ctx.len() as u32;
        let groups = match (ctx.stage.groups, ctx.stage.group_size) {
            (Some(groups), _) => groups,
            (None, Some(size)) if size > 0 => n.div_ceil(size),
            _ => {
                return Err(BracketError::config(
                    "pool play requires a groups or groupSize value",
                ));
            }
        };
        if groups == 0 || n < groups * 2 {
            return Err(BracketError::config(format!(
                "{n} participants cannot fill {groups} groups of at least 2"
            )));
        }
        if let Some(size) = ctx.stage.group_size
            && n > groups * size
        {
            return Err(BracketError::config(format!(
                "{n} participants do not fit {groups} groups of {size}"
            )));
        }

        let seeded = ctx.seeded();
        let members = snake_groups(&seeded, groups as usize);
        let smallest = members.iter().map(Vec::len).min().unwrap_or(0) as u32;

        let advance = ctx
            .format_config
            .advance_per_group
            .or(ctx.stage.advance_per_group)
            .unwrap_or(DEFAULT_ADVANCE_PER_GROUP);
        if advance > smallest {
            return Err(BracketError::config(format!(
                "cannot advance {advance} per group from groups of {smallest}"
            )));
        }

        let mut builder = GraphBuilder::new();
        let mut pools = Vec::with_capacity(members.len());
        for (idx, group) in members.into_iter().enumerate() {
            let name = pool_name(idx);
            builder.round_robin(&name, &group);
            pools.push(Pool {
                name,
                participants: group,
            });
        }

        if groups * advance >= 2 {
            let mut entrants = Vec::with_capacity((groups * advance) as usize);
            for rank in 1..=advance {
                let order: Box<dyn Iterator<Item = &Pool>> = if rank % 2 == 1 {
                    Box::new(pools.iter())
                } else {
                    Box::new(pools.iter().rev())
                };
                entrants.extend(order.map(|pool| Slot::Placement {
                    pool: pool.name.clone(),
                    rank,
                }));
            }
            builder.elimination(ELIMINATION_BRACKET, entrants);
        }

        log::debug!(
            "Built pool play: {} groups, {} advancing each",
            groups,
            advance
        );

        let mut graph = ctx.graph(Format::Pool, builder)?;
        graph.params = FormatParams {
            groups: Some(groups),
            advance_per_group: Some(advance),
            ..Default::default()
        };
        graph.pools = pools;
        Ok(graph)
    }
}
