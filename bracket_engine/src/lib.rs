//! # Bracket Engine
//!
//! Tournament format and bracket generation: turns a stage configuration and
//! a participant list into a match graph, validates it against closed-form
//! counts, and advances it as results arrive.
//!
//! Every format builds the same representation: a flat list of matches in
//! named sub-brackets whose slots hold participants or references to other
//! matches' outcomes. Builders are dispatched through `enum_dispatch` over a
//! closed set of formats.
//!
//! ## Formats
//!
//! - **Eliminations**: single, double, triple, compass draw, March Madness
//! - **Points**: round robin, Swiss system, pool play
//! - **Hybrids**: game guarantee, prediction bracket
//! - **Leaderboard**: free-for-all measured event
//!
//! ## Core Modules
//!
//! - [`engine`]: generation entry point
//! - [`formats`]: format registry and builders
//! - [`graph`]: match graph model and scheduling
//! - [`progression`]: results, byes, placements and Swiss pairing
//! - [`validator`]: expected counts and structural checks
//! - [`bracket`]: per-tournament actors for concurrent use
//!
//! ## Example
//!
//! ```
//! use bracket_engine::{CreateRequest, Limits, generate};
//!
//! let request: CreateRequest = serde_json::from_value(serde_json::json!({
//!     "config": { "stages": [{ "engine": "double", "finals": "single" }] },
//!     "participants": ["A", "B", "C", "D", "E", "F", "G", "H"]
//! })).unwrap();
//!
//! let bracket = generate(&request, &Limits::default()).unwrap();
//! assert_eq!(bracket.graph.total_matches, 14);
//! assert!(bracket.validation.mathematics_correct);
//! ```

pub mod bracket;
pub mod config;
pub mod engine;
pub mod errors;
pub mod formats;
pub mod graph;
pub mod progression;
pub mod seeding;
pub mod standings;
pub mod validator;

pub use config::{FormatConfig, Limits, StageConfig, TournamentConfig};
pub use engine::{CreateRequest, GeneratedBracket, generate};
pub use errors::{BracketError, BracketResult};
pub use formats::{Engine, Format};
pub use graph::{Match, MatchGraph, MatchId, ParticipantId, Slot};
pub use progression::Progress;
pub use validator::ValidationReport;
