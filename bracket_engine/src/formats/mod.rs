//! Format builders and the format registry.
//!
//! Every named format is a variant of [`Format`]. Each variant has one
//! builder implementing [`BracketBuilder`], and [`Builder`] dispatches to it
//! through `enum_dispatch`. The mapping from format to builder is an
//! exhaustive `match`, so adding a format without a builder does not compile.
//!
//! Several named formats specialize a shared primitive engine: March Madness
//! and Prediction Bracket wrap single elimination, Triple Elimination and
//! Game Guarantee extend double elimination with a losers side, and Pool Play
//! wraps round robin. [`Format::engine`] reports that primitive.
//!
//! ## Example
//!
//! ```
//! use bracket_engine::formats::{Engine, Format};
//!
//! let format: Format = "march-madness".parse().unwrap();
//! assert_eq!(format.engine(), Engine::Single);
//! assert_eq!(format.to_string(), "march-madness");
//! ```

pub mod compass;
pub mod double;
pub mod free_for_all;
pub mod game_guarantee;
pub mod march_madness;
pub mod pool_play;
pub mod prediction;
pub mod round_robin;
pub mod single;
pub mod swiss;
pub mod triple;

pub use compass::CompassDraw;
pub use double::DoubleElimination;
pub use free_for_all::FreeForAll;
pub use game_guarantee::GameGuarantee;
pub use march_madness::MarchMadness;
pub use pool_play::PoolPlay;
pub use prediction::PredictionBracket;
pub use round_robin::RoundRobin;
pub use single::SingleElimination;
pub use swiss::SwissSystem;
pub use triple::TripleElimination;

use crate::config::{
    FinalsMode, FormatConfig, Limits, PointsTable, StageConfig, Tiebreaker,
};
use crate::errors::{BracketError, BracketResult};
use crate::graph::builder::GraphBuilder;
use crate::graph::{FormatParams, MatchGraph, Participant, ParticipantId, Slot};
use crate::seeding::SeedAssignment;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named tournament format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "single-elimination")]
    Single,
    #[serde(rename = "double-elimination")]
    Double,
    #[serde(rename = "round-robin")]
    RoundRobin,
    #[serde(rename = "swiss-system")]
    Swiss,
    #[serde(rename = "free-for-all")]
    Leaderboard,
    #[serde(rename = "march-madness")]
    MarchMadness,
    #[serde(rename = "triple-elimination")]
    Triple,
    #[serde(rename = "compass-draw")]
    Compass,
    #[serde(rename = "game-guarantee")]
    GameGuarantee,
    #[serde(rename = "prediction-bracket")]
    Prediction,
    #[serde(rename = "pool-play")]
    Pool,
}

impl Format {
    pub const ALL: [Format; 11] = [
        Format::Single,
        Format::Double,
        Format::RoundRobin,
        Format::Swiss,
        Format::Leaderboard,
        Format::MarchMadness,
        Format::Triple,
        Format::Compass,
        Format::GameGuarantee,
        Format::Prediction,
        Format::Pool,
    ];

    /// Wire name, as reported in `tournamentType`
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Single => "single-elimination",
            Format::Double => "double-elimination",
            Format::RoundRobin => "round-robin",
            Format::Swiss => "swiss-system",
            Format::Leaderboard => "free-for-all",
            Format::MarchMadness => "march-madness",
            Format::Triple => "triple-elimination",
            Format::Compass => "compass-draw",
            Format::GameGuarantee => "game-guarantee",
            Format::Prediction => "prediction-bracket",
            Format::Pool => "pool-play",
        }
    }

    /// Primitive engine this format specializes
    pub fn engine(self) -> Engine {
        match self {
            Format::Single | Format::MarchMadness | Format::Compass | Format::Prediction => {
                Engine::Single
            }
            Format::Double | Format::Triple | Format::GameGuarantee => Engine::Double,
            Format::RoundRobin | Format::Pool => Engine::RoundRobin,
            Format::Swiss => Engine::Swiss,
            Format::Leaderboard => Engine::Leaderboard,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        match key.as_str() {
            "single-elimination" | "single" => Ok(Format::Single),
            "double-elimination" | "double" => Ok(Format::Double),
            "round-robin" => Ok(Format::RoundRobin),
            "swiss-system" | "swiss" => Ok(Format::Swiss),
            "free-for-all" | "leaderboard" => Ok(Format::Leaderboard),
            "march-madness" => Ok(Format::MarchMadness),
            "triple-elimination" | "triple" => Ok(Format::Triple),
            "compass-draw" | "compass" => Ok(Format::Compass),
            "game-guarantee" => Ok(Format::GameGuarantee),
            "prediction-bracket" | "prediction" => Ok(Format::Prediction),
            "pool-play" => Ok(Format::Pool),
            _ => Err(BracketError::UnsupportedFormat(format!(
                "unknown tournament type '{s}'"
            ))),
        }
    }
}

/// Primitive stage engine (`config.stages[].engine`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    Single,
    Double,
    RoundRobin,
    Swiss,
    Leaderboard,
}

impl Engine {
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Single => "single",
            Engine::Double => "double",
            Engine::RoundRobin => "round_robin",
            Engine::Swiss => "swiss",
            Engine::Leaderboard => "leaderboard",
        }
    }

    /// Format built when no named format overrides the engine
    pub fn default_format(self) -> Format {
        match self {
            Engine::Single => Format::Single,
            Engine::Double => Format::Double,
            Engine::RoundRobin => Format::RoundRobin,
            Engine::Swiss => Format::Swiss,
            Engine::Leaderboard => Format::Leaderboard,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single" | "single_elimination" => Ok(Engine::Single),
            "double" | "double_elimination" => Ok(Engine::Double),
            "round_robin" => Ok(Engine::RoundRobin),
            "swiss" => Ok(Engine::Swiss),
            "leaderboard" | "free_for_all" => Ok(Engine::Leaderboard),
            _ => Err(BracketError::UnsupportedFormat(format!(
                "unknown stage engine '{s}'"
            ))),
        }
    }
}

/// Inputs shared by every builder
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub participants: &'a [Participant],
    pub seeds: &'a SeedAssignment,
    pub stage: &'a StageConfig,
    pub format_config: &'a FormatConfig,
    pub limits: &'a Limits,
}

impl<'a> BuildContext<'a> {
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participant ids in seed order
    pub fn seeded(&self) -> Vec<ParticipantId> {
        self.seeds.order()
    }

    pub fn seeded_slots(&self) -> Vec<Slot> {
        self.seeded().into_iter().map(Slot::participant).collect()
    }

    /// Fail unless at least `min` participants entered
    pub fn require_participants(&self, min: usize, format: Format) -> BracketResult<()> {
        if self.len() < min {
            return Err(BracketError::config(format!(
                "{format} requires at least {min} participants, got {}",
                self.len()
            )));
        }
        Ok(())
    }

    /// Declared bracket size must hold every participant
    pub fn check_stage_size(&self) -> BracketResult<()> {
        match self.stage.size {
            Some(size) if (size as usize) < self.len() => Err(BracketError::config(format!(
                "stage size {size} is smaller than the {} participants entered",
                self.len()
            ))),
            _ => Ok(()),
        }
    }

    pub fn scoring(&self) -> PointsTable {
        self.stage.points.unwrap_or_default()
    }

    pub fn tiebreakers(&self) -> BracketResult<Vec<Tiebreaker>> {
        Tiebreaker::parse_all(&self.stage.tiebreakers)
    }

    pub fn finals(&self, default: FinalsMode) -> BracketResult<FinalsMode> {
        match self.stage.finals.as_deref() {
            Some(finals) => finals.parse(),
            None => Ok(default),
        }
    }

    /// Assemble a graph around the builder's matches
    pub(crate) fn graph(
        &self,
        format: Format,
        builder: GraphBuilder,
    ) -> BracketResult<MatchGraph> {
        Ok(MatchGraph {
            tournament_type: format,
            config_engine: format.engine(),
            participants: self.participants.to_vec(),
            seeds: self.seeds.seeds.clone(),
            matches: builder.into_matches(),
            total_rounds: 0,
            total_matches: 0,
            params: FormatParams::default(),
            scoring: self.scoring(),
            tiebreakers: self.tiebreakers()?,
            lives: None,
            pools: Vec::new(),
            swiss: None,
            leaderboard: None,
            predictions: None,
            eliminated: Vec::new(),
            random_seed: self.seeds.random_seed,
        })
    }
}

/// A format's graph construction
#[enum_dispatch]
pub trait BracketBuilder {
    /// The named format this builder produces
    fn format(&self) -> Format;

    /// Build the unsettled graph; byes and schedule are settled by the caller
    fn build(&self, ctx: &BuildContext<'_>) -> BracketResult<MatchGraph>;
}

/// Closed set of builders, one per [`Format`]
#[enum_dispatch(BracketBuilder)]
#[derive(Debug, Clone, Copy)]
pub enum Builder {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    SwissSystem,
    FreeForAll,
    MarchMadness,
    TripleElimination,
    CompassDraw,
    GameGuarantee,
    PredictionBracket,
    PoolPlay,
}

impl From<Format> for Builder {
    fn from(format: Format) -> Self {
        match format {
            Format::Single => SingleElimination.into(),
            Format::Double => DoubleElimination.into(),
            Format::RoundRobin => RoundRobin.into(),
            Format::Swiss => SwissSystem.into(),
            Format::Leaderboard => FreeForAll.into(),
            Format::MarchMadness => MarchMadness.into(),
            Format::Triple => TripleElimination.into(),
            Format::Compass => CompassDraw.into(),
            Format::GameGuarantee => GameGuarantee.into(),
            Format::Prediction => PredictionBracket.into(),
            Format::Pool => PoolPlay.into(),
        }
    }
}

/// Pick the format for a stage
///
/// An explicit `formatConfig.tournamentType` wins; otherwise the stage engine
/// decides, with a multi-group round robin meaning pool play.
pub fn resolve_format(stage: &StageConfig, format_config: &FormatConfig) -> BracketResult<Format> {
    if let Some(tournament_type) = format_config
        .tournament_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        return tournament_type.parse();
    }

    let engine: Engine = stage.engine.parse()?;
    if engine == Engine::RoundRobin && stage.groups.unwrap_or(1) > 1 {
        return Ok(Format::Pool);
    }
    Ok(engine.default_format())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::{FormatConfig, Limits, StageConfig};
    use crate::engine::{CreateRequest, generate};
    use crate::graph::MatchGraph;
    use crate::validator::ValidationReport;

    pub fn request(
        n: usize,
        stage: serde_json::Value,
        format_config: serde_json::Value,
    ) -> CreateRequest {
        let stage: StageConfig = serde_json::from_value(stage).unwrap();
        let format_config: FormatConfig = serde_json::from_value(format_config).unwrap();
        let mut request = CreateRequest {
            participants: (1..=n).map(|i| format!("Team {i}")).collect(),
            format_config,
            ..Default::default()
        };
        request.config.stages.push(stage);
        request
    }

    /// Generate through the full pipeline, panicking on errors
    pub fn build(
        n: usize,
        stage: serde_json::Value,
        format_config: serde_json::Value,
    ) -> (MatchGraph, ValidationReport) {
        let generated = generate(&request(n, stage, format_config), &Limits::default())
            .expect("generation should succeed");
        (generated.graph, generated.validation)
    }
}
