//! Bracket generation entry point.

use crate::config::{FormatConfig, Limits, TournamentConfig};
use crate::errors::{BracketError, BracketResult};
use crate::formats::{BracketBuilder, BuildContext, Builder, resolve_format};
use crate::graph::MatchGraph;
use crate::seeding::{assign_seeds, participants_from_names};
use crate::validator::{ValidationReport, validate};
use serde::{Deserialize, Serialize};

/// Creation request: configuration, participant names and format overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub config: TournamentConfig,
    pub participants: Vec<String>,
    #[serde(default)]
    pub format_config: FormatConfig,
}

/// A generated graph together with its validation report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBracket {
    pub graph: MatchGraph,
    pub validation: ValidationReport,
}

impl GeneratedBracket {
    /// Fail when the graph disagrees with its closed-form counts
    pub fn ensure_consistent(&self) -> BracketResult<()> {
        if self.validation.mathematics_correct {
            return Ok(());
        }
        let report = &self.validation;
        let mut message = format!(
            "{} expected {} matches over {} rounds, generated {} over {}",
            report.tournament_type,
            report.expected_matches,
            report.expected_rounds,
            report.actual_matches,
            report.actual_rounds
        );
        if !report.issues.is_empty() {
            message.push_str(": ");
            message.push_str(&report.issues.join("; "));
        }
        Err(BracketError::InternalInvariant(message))
    }
}

/// Generate the match graph for the first stage of a configuration
///
/// The graph comes back with its schedule computed, byes resolved and a
/// validation report attached; callers decide whether an inconsistent
/// report is fatal via [`GeneratedBracket::ensure_consistent`].
pub fn generate(request: &CreateRequest, limits: &Limits) -> BracketResult<GeneratedBracket> {
    let participants = participants_from_names(&request.participants)?;
    if participants.is_empty() {
        return Err(BracketError::config("at least one participant is required"));
    }
    if participants.len() > limits.max_participants {
        return Err(BracketError::config(format!(
            "{} participants exceed the limit of {}",
            participants.len(),
            limits.max_participants
        )));
    }
    if let Some(count) = request.config.meta.participant_count
        && count as usize != participants.len()
    {
        return Err(BracketError::config(format!(
            "meta.participantCount is {count} but {} participants were supplied",
            participants.len()
        )));
    }

    let stage = request
        .config
        .stages
        .first()
        .ok_or_else(|| BracketError::config("at least one stage is required"))?;
    if request.config.stages.len() > 1 {
        log::debug!(
            "Generating stage 1 of {}; later stages are not generated",
            request.config.stages.len()
        );
    }

    let format = resolve_format(stage, &request.format_config)?;
    let seeds = assign_seeds(&participants, &request.config.seeding)?;
    let ctx = BuildContext {
        participants: &participants,
        seeds: &seeds,
        stage,
        format_config: &request.format_config,
        limits,
    };

    let mut graph = Builder::from(format).build(&ctx)?;
    graph.finalize()?;
    let validation = validate(&graph);

    log::info!(
        "Generated {} bracket: {} participants, {} matches, {} rounds",
        format,
        participants.len(),
        graph.total_matches,
        graph.total_rounds
    );

    Ok(GeneratedBracket { graph, validation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> CreateRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_stage() {
        let req = request(json!({"config": {"stages": []}, "participants": ["A", "B"]}));
        assert!(matches!(
            generate(&req, &Limits::default()),
            Err(BracketError::Configuration(_))
        ));
    }

    #[test]
    fn test_participant_count_mismatch() {
        let req = request(json!({
            "config": {"meta": {"participantCount": 3}, "stages": [{"engine": "single"}]},
            "participants": ["A", "B"]
        }));
        assert!(matches!(
            generate(&req, &Limits::default()),
            Err(BracketError::Configuration(_))
        ));
    }

    #[test]
    fn test_limits_enforced() {
        let req = request(json!({
            "config": {"stages": [{"engine": "round_robin"}]},
            "participants": ["A", "B", "C"]
        }));
        let limits = Limits {
            max_participants: 2,
            ..Default::default()
        };
        assert!(matches!(generate(&req, &limits), Err(BracketError::Configuration(_))));
    }

    #[test]
    fn test_unknown_engine() {
        let req = request(json!({
            "config": {"stages": [{"engine": "ladder"}]},
            "participants": ["A", "B"]
        }));
        assert!(matches!(
            generate(&req, &Limits::default()),
            Err(BracketError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_stage_size_too_small() {
        let req = request(json!({
            "config": {"stages": [{"engine": "single", "size": 4}]},
            "participants": ["A", "B", "C", "D", "E"]
        }));
        assert!(matches!(
            generate(&req, &Limits::default()),
            Err(BracketError::Configuration(_))
        ));
    }

    #[test]
    fn test_consistent_bracket_passes() {
        let req = request(json!({
            "config": {
                "meta": {"name": "Spring Open", "participantType": "team", "participantCount": 8},
                "stages": [{"engine": "double", "size": 8, "finals": "single"}],
                "seeding": {"method": "random", "seed": 7}
            },
            "participants": ["A", "B", "C", "D", "E", "F", "G", "H"]
        }));
        let generated = generate(&req, &Limits::default()).unwrap();
        assert!(generated.ensure_consistent().is_ok());
        assert_eq!(generated.graph.random_seed, Some(7));
    }

    #[test]
    fn test_inconsistent_report_is_internal_error() {
        let req = request(json!({
            "config": {"stages": [{"engine": "single"}]},
            "participants": ["A", "B", "C", "D"]
        }));
        let mut generated = generate(&req, &Limits::default()).unwrap();
        generated.validation.mathematics_correct = false;
        assert!(matches!(
            generated.ensure_consistent(),
            Err(BracketError::InternalInvariant(_))
        ));
    }
}
