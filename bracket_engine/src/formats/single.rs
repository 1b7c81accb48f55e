//! Single elimination.

use super::{BracketBuilder, BuildContext, Format};
use crate::errors::BracketResult;
use crate::graph::MatchGraph;
use crate::graph::builder::GraphBuilder;

pub const MAIN_BRACKET: &str = "main";

/// One loss and out; top seeds take the first-round byes
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleElimination;

impl SingleElimination {
    /// Graph shared with the formats layered on a plain knockout
    pub(crate) fn knockout(ctx: &BuildContext<'_>, format: Format) -> BracketResult<MatchGraph> {
        ctx.require_participants(2, format)?;
        ctx.check_stage_size()?;

        let mut builder = GraphBuilder::new();
        let tree = builder.elimination(MAIN_BRACKET, ctx.seeded_slots());
        log::debug!(
            "Built {} knockout: {} rounds over {} entrants",
            format,
            tree.rounds,
            ctx.len()
        );

        let mut graph = ctx.graph(format, builder)?;
        graph.lives = Some(1);
        Ok(graph)
    }
}

impl BracketBuilder for SingleElimination {
    fn format(&self) -> Format {
        Format::Single
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        Self::knockout(ctx, Format::Single)
    }
}

#[cfg(test)]
mod tests {
    use crate::formats::test_support::build;
    use crate::graph::{MatchStatus, Slot};
    use serde_json::json;

    #[test]
    fn test_power_of_two_field() {
        let (graph, report) = build(8, json!({"engine": "single"}), json!({}));
        assert_eq!(graph.total_matches, 7);
        assert_eq!(graph.total_rounds, 3);
        assert!(report.mathematics_correct);
    }

    #[test]
    fn test_uneven_field_resolves_byes() {
        let (graph, report) = build(6, json!({"engine": "single", "size": 8}), json!({}));
        assert_eq!(graph.total_matches, 5);
        assert_eq!(graph.total_rounds, 3);
        assert!(report.mathematics_correct);

        // Seeds 1 and 2 already sit in round two
        let round_two: Vec<_> = graph.matches_in("main").filter(|m| m.round == 2).collect();
        assert!(round_two.iter().any(|m| m.slot_a == Slot::participant(graph.seeds[0].participant)));
        assert!(graph
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Bye)
            .all(|m| m.is_resolved()));
    }

    #[test]
    fn test_two_participants() {
        let (graph, _) = build(2, json!({"engine": "single"}), json!({}));
        assert_eq!(graph.total_matches, 1);
        assert_eq!(graph.total_rounds, 1);
        assert!(graph.matches[0].is_ready());
    }
}
