//! Stage and format configuration models.
//!
//! These mirror the JSON contract of the creation request. Free-form string
//! options (`finals`, `pairing`, tiebreakers, measure types, seeding method)
//! are parsed by the builders so a bad value surfaces as a
//! [`BracketError::Configuration`] instead of a deserialization failure.

use crate::errors::{BracketError, BracketResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Hard bound on participants per stage
pub const DEFAULT_MAX_PARTICIPANTS: usize = 1024;

/// Hard bound on Swiss rounds per stage
pub const DEFAULT_MAX_SWISS_ROUNDS: u32 = 64;

/// Generation limits; oversized requests are rejected rather than degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub max_participants: usize,
    pub max_swiss_rounds: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            max_swiss_rounds: DEFAULT_MAX_SWISS_ROUNDS,
        }
    }
}

/// Full tournament configuration (`config` in the creation request)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentConfig {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub divisions: Vec<Division>,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub seeding: SeedingConfig,
}

/// Tournament metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub name: String,
    pub participant_type: Option<ParticipantType>,
    pub participant_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    Team,
    Individual,
}

/// Division descriptor; eligibility is matched outside the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub eligibility: Value,
    pub gender_policy: Option<String>,
}

/// One competitive phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageConfig {
    /// `single`, `double`, `round_robin`, `swiss` or `leaderboard`
    pub engine: String,

    /// Declared bracket size
    pub size: Option<u32>,

    /// Number of round-robin groups
    pub groups: Option<u32>,

    /// Maximum participants per group
    pub group_size: Option<u32>,

    /// Swiss rounds
    pub rounds: Option<u32>,

    /// `single` or `double` (bracket reset)
    pub finals: Option<String>,

    /// Swiss pairing method: `seed`, `fold` or `adjacent`
    pub pairing: Option<String>,

    pub points: Option<PointsTable>,

    #[serde(default)]
    pub tiebreakers: Vec<String>,

    #[serde(default)]
    pub events: Vec<EventConfig>,

    pub game_guarantee: Option<u32>,

    pub advance_per_group: Option<u32>,

    /// Parameters no builder reads
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Leaderboard event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    #[serde(default)]
    pub name: String,
    pub measure_type: Option<String>,
    pub unit: Option<String>,
    pub max_participants: Option<u32>,
}

/// Seeding options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedingConfig {
    /// `random`, `manual` or `rating`; manual when absent
    pub method: Option<String>,

    /// Explicit manual order (participant names)
    pub order: Option<Vec<String>>,

    /// Strength score per participant name
    pub ratings: Option<HashMap<String, f64>>,

    /// Random source seed
    pub seed: Option<u64>,
}

/// `formatConfig` in the creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatConfig {
    /// Named format overriding the stage engine
    pub tournament_type: Option<String>,

    pub game_guarantee: Option<u32>,

    pub advance_per_group: Option<u32>,

    /// Prediction-bracket roster
    #[serde(default)]
    pub participants: Vec<PredictorEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Predictor roster entry, either a bare name or `{id, name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictorEntry {
    Named(String),
    Detailed { id: String, name: Option<String> },
}

/// Points awarded per outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsTable {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
}

impl Default for PointsTable {
    fn default() -> Self {
        Self {
            win: 3.0,
            draw: 1.0,
            loss: 0.0,
        }
    }
}

/// Standings tiebreakers, applied in the configured order after points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiebreaker {
    HeadToHead,
    ScoreDifference,
    ScoreFor,
    Wins,
    Buchholz,
}

impl FromStr for Tiebreaker {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "head_to_head" => Ok(Tiebreaker::HeadToHead),
            "goal_difference" | "point_difference" | "score_difference" => {
                Ok(Tiebreaker::ScoreDifference)
            }
            "goals_for" | "points_for" | "score_for" => Ok(Tiebreaker::ScoreFor),
            "wins" => Ok(Tiebreaker::Wins),
            "buchholz" => Ok(Tiebreaker::Buchholz),
            other => Err(BracketError::config(format!("unknown tiebreaker '{other}'"))),
        }
    }
}

impl Tiebreaker {
    /// Parse a configured list, failing on the first unknown name
    pub fn parse_all(names: &[String]) -> BracketResult<Vec<Tiebreaker>> {
        names.iter().map(|name| name.parse()).collect()
    }
}

/// Grand-final policy for multi-life eliminations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalsMode {
    /// The grand final is decisive
    Single,
    /// The grand-final loser keeps playing while lives remain
    Double,
}

impl FromStr for FinalsMode {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(FinalsMode::Single),
            "double" | "reset" => Ok(FinalsMode::Double),
            other => Err(BracketError::config(format!(
                "finals must be 'single' or 'double', got '{other}'"
            ))),
        }
    }
}

/// How a Swiss score group is split into pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingMethod {
    /// Top half against bottom half (1 v n/2+1)
    Seed,
    /// Highest against lowest (1 v n)
    Fold,
    /// Neighbours (1 v 2)
    Adjacent,
}

impl FromStr for PairingMethod {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" | "dutch" => Ok(PairingMethod::Seed),
            "fold" => Ok(PairingMethod::Fold),
            "adjacent" | "slide" => Ok(PairingMethod::Adjacent),
            other => Err(BracketError::config(format!("unknown pairing method '{other}'"))),
        }
    }
}

/// Direction in which a leaderboard measurement ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureType {
    Score,
    Time,
    Distance,
}

impl MeasureType {
    pub fn higher_is_better(self) -> bool {
        !matches!(self, MeasureType::Time)
    }
}

impl FromStr for MeasureType {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" | "points" => Ok(MeasureType::Score),
            "time" => Ok(MeasureType::Time),
            "distance" | "weight" => Ok(MeasureType::Distance),
            other => Err(BracketError::config(format!("unknown measure type '{other}'"))),
        }
    }
}

impl fmt::Display for MeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureType::Score => write!(f, "score"),
            MeasureType::Time => write!(f, "time"),
            MeasureType::Distance => write!(f, "distance"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_config_keeps_unknown_params() {
        let stage: StageConfig = serde_json::from_value(serde_json::json!({
            "engine": "double",
            "size": 8,
            "finals": "single",
            "bestOf": 3
        }))
        .unwrap();

        assert_eq!(stage.engine, "double");
        assert_eq!(stage.size, Some(8));
        assert_eq!(stage.finals.as_deref(), Some("single"));
        assert_eq!(stage.extra.get("bestOf"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn test_tiebreaker_aliases() {
        let parsed = Tiebreaker::parse_all(&[
            "head_to_head".to_string(),
            "goal_difference".to_string(),
            "buchholz".to_string(),
        ])
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                Tiebreaker::HeadToHead,
                Tiebreaker::ScoreDifference,
                Tiebreaker::Buchholz
            ]
        );

        assert!(matches!(
            "coin_flip".parse::<Tiebreaker>(),
            Err(BracketError::Configuration(_))
        ));
    }

    #[test]
    fn test_predictor_entries() {
        let config: FormatConfig = serde_json::from_value(serde_json::json!({
            "tournamentType": "prediction-bracket",
            "participants": [
                { "id": "predictor1", "name": "Predictor 1", "email": "p1@test.com" },
                "walk-in"
            ]
        }))
        .unwrap();

        assert_eq!(config.participants.len(), 2);
        assert_eq!(
            config.participants[1],
            PredictorEntry::Named("walk-in".to_string())
        );
    }

    #[test]
    fn test_finals_mode_parse() {
        assert_eq!("single".parse::<FinalsMode>().unwrap(), FinalsMode::Single);
        assert_eq!("Double".parse::<FinalsMode>().unwrap(), FinalsMode::Double);
        assert!("triple".parse::<FinalsMode>().is_err());
    }
}
