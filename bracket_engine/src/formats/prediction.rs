//! Prediction bracket: a knockout plus a roster of predictors picking winners.

use super::single::SingleElimination;
use super::{BracketBuilder, BuildContext, Format};
use crate::config::PredictorEntry;
use crate::errors::{BracketError, BracketResult};
use crate::graph::{MatchGraph, PredictionPool, Predictor};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionBracket;

fn predictor(entry: &PredictorEntry) -> Predictor {
    match entry {
        PredictorEntry::Named(name) => Predictor {
            id: name.trim().to_string(),
            name: name.trim().to_string(),
        },
        PredictorEntry::Detailed { id, name } => Predictor {
            id: id.trim().to_string(),
            name: name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(id.trim())
                .to_string(),
        },
    }
}

impl BracketBuilder for PredictionBracket {
    fn format(&self) -> Format {
        Format::Prediction
    }

    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph> {
        let mut seen = HashSet::new();
        let mut predictors = Vec::with_capacity(ctx.format_config.participants.len());
        for entry in &ctx.format_config.participants {
            let predictor = predictor(entry);
            if predictor.id.is_empty() {
                return Err(BracketError::config("predictor id must not be empty"));
            }
            if !seen.insert(predictor.id.clone()) {
                return Err(BracketError::config(format!(
                    "duplicate predictor '{}'",
                    predictor.id
                )));
            }
            predictors.push(predictor);
        }

        let mut graph = SingleElimination::knockout(ctx, Format::Prediction)?;
        graph.predictions = Some(PredictionPool {
            predictors,
            picks: Vec::new(),
        });
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use crate::formats::test_support::build;
    use serde_json::json;

    #[test]
    fn test_bracket_with_roster() {
        let (graph, report) = build(
            8,
            json!({"engine": "single"}),
            json!({
                "tournamentType": "prediction-bracket",
                "participants": [
                    {"id": "predictor1", "name": "Predictor 1", "email": "p1@test.com"},
                    {"id": "predictor2", "name": "Predictor 2"},
                    "walk-in"
                ]
            }),
        );
        assert_eq!(graph.total_matches, 7);
        assert_eq!(graph.total_rounds, 3);
        assert!(report.mathematics_correct);

        let pool = graph.predictions.unwrap();
        assert_eq!(pool.predictors.len(), 3);
        assert_eq!(pool.predictors[2].name, "walk-in");
        assert!(pool.picks.is_empty());
    }
}
