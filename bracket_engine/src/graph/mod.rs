//! Match graph: the data structure every format builder produces.
//!
//! A graph is a flat list of matches tagged with a named bracket and a round
//! inside that bracket. Each match has two slots, and a slot is either a
//! concrete participant or a reference to an outcome that is not known yet:
//! the winner or loser of an earlier match, a pool placement, or a pending
//! Swiss pairing. The progression engine replaces references with
//! participants as results arrive.
//!
//! ## Example
//!
//! ```
//! use bracket_engine::graph::{MatchId, Slot, SlotRole};
//!
//! let slot = Slot::winner_of(MatchId(3));
//! assert!(slot.refers_to(MatchId(3), SlotRole::Winner));
//! assert_eq!(slot.participant_id(), None);
//! ```

pub(crate) mod builder;
pub mod models;
pub mod schedule;

pub use models::{
    FormatParams, Leaderboard, LeaderboardEntry, Match, MatchGraph, MatchId, MatchResult,
    MatchStatus, Participant, ParticipantId, Pick, Pool, PredictionPool, Predictor, Score, Seed,
    SeriesRule, Slot, SlotRole, SwissState,
};
pub use schedule::RoundView;
