//! Match graph data model.

use crate::config::{MeasureType, PairingMethod, PointsTable, Tiebreaker};
use crate::formats::{Engine, Format};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant identifier, assigned from the 1-based position in the request list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Match identifier, dense and 1-based in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u32);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A competitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// Seed position assigned before bracket construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub participant: ParticipantId,
    /// 1..=N
    pub position: u32,
}

/// Which outcome of a referenced match feeds a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    Winner,
    Loser,
}

/// One side of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Slot {
    /// A concrete participant
    Participant { id: ParticipantId },

    /// Winner or loser of an earlier match
    MatchRef { match_id: MatchId, role: SlotRole },

    /// Empty side of a bye match, permanently resolved
    Bye,

    /// The participant finishing at `rank` in a round-robin pool
    Placement { pool: String, rank: u32 },

    /// Swiss pairing decided once the previous round completes
    Pending,
}

impl Slot {
    pub fn participant(id: ParticipantId) -> Self {
        Slot::Participant { id }
    }

    pub fn winner_of(match_id: MatchId) -> Self {
        Slot::MatchRef {
            match_id,
            role: SlotRole::Winner,
        }
    }

    pub fn loser_of(match_id: MatchId) -> Self {
        Slot::MatchRef {
            match_id,
            role: SlotRole::Loser,
        }
    }

    /// Concrete participant in this slot, if resolved
    pub fn participant_id(&self) -> Option<ParticipantId> {
        match self {
            Slot::Participant { id } => Some(*id),
            _ => None,
        }
    }

    /// Whether this slot points at the given match outcome
    pub fn refers_to(&self, source: MatchId, source_role: SlotRole) -> bool {
        matches!(self, Slot::MatchRef { match_id, role } if *match_id == source && *role == source_role)
    }
}

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
    Bye,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "Scheduled"),
            MatchStatus::InProgress => write!(f, "InProgress"),
            MatchStatus::Completed => write!(f, "Completed"),
            MatchStatus::Bye => write!(f, "Bye"),
        }
    }
}

/// Score reported for slot A and slot B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub a: u32,
    pub b: u32,
}

/// Recorded outcome; `winner == None` is a draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub winner: Option<ParticipantId>,
    pub loser: Option<ParticipantId>,
    pub score: Option<Score>,
}

/// Rematch rule for matches decided by lives rather than a single game
///
/// When the loser of a series match has fewer than `loser_min_losses` losses,
/// the progression engine appends a rematch and re-points every slot that
/// referenced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRule {
    pub loser_min_losses: u32,
}

/// A single match in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,

    /// Named sub-bracket (`winners`, `losers`, `final`, `east`, `pool-a`, ...)
    pub bracket: String,

    /// 1-based round inside the named bracket
    pub round: u32,

    /// 1-based position inside the round
    pub position: u32,

    pub slot_a: Slot,
    pub slot_b: Slot,
    pub status: MatchStatus,
    pub result: Option<MatchResult>,

    /// Global schedule round (critical path through dependencies)
    pub schedule_round: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesRule>,
}

impl Match {
    /// Byes are not contested and do not count toward match totals
    pub fn is_contested(&self) -> bool {
        self.status != MatchStatus::Bye
    }

    /// Completed or bye-resolved
    pub fn is_resolved(&self) -> bool {
        match self.status {
            MatchStatus::Completed => true,
            MatchStatus::Bye => self.result.is_some(),
            _ => false,
        }
    }

    /// Both sides hold concrete participants
    pub fn is_ready(&self) -> bool {
        self.slot_a.participant_id().is_some() && self.slot_b.participant_id().is_some()
    }

    pub fn slots(&self) -> [&Slot; 2] {
        [&self.slot_a, &self.slot_b]
    }

    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.slots()
            .iter()
            .any(|slot| slot.participant_id() == Some(participant))
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        self.result.as_ref().and_then(|result| result.winner)
    }

    pub fn loser(&self) -> Option<ParticipantId> {
        self.result.as_ref().and_then(|result| result.loser)
    }
}

/// Round-robin group feeding placement slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    pub participants: Vec<ParticipantId>,
}

/// Swiss round bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwissState {
    pub rounds: u32,
    pub pairing: PairingMethod,
}

/// One leaderboard entrant and its measured result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub participant: ParticipantId,
    pub value: Option<f64>,
}

/// The single ranked event of a free-for-all stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub event: String,
    pub measure_type: MeasureType,
    pub unit: Option<String>,
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|entry| entry.value.is_some())
    }
}

/// Someone scoring picks against the competitor bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predictor {
    pub id: String,
    pub name: String,
}

/// A predictor's pick for one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub predictor: String,
    pub match_id: MatchId,
    pub participant: ParticipantId,
}

/// Predictor roster and picks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionPool {
    pub predictors: Vec<Predictor>,
    pub picks: Vec<Pick>,
}

/// Format parameters the validator needs to recompute counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_guarantee: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_per_group: Option<u32>,
}

/// All matches of one stage plus the state needed to progress them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchGraph {
    pub tournament_type: Format,
    pub config_engine: Engine,
    pub participants: Vec<Participant>,
    pub seeds: Vec<Seed>,
    pub matches: Vec<Match>,

    /// Critical-path length over every named bracket
    pub total_rounds: u32,

    /// Contested matches (byes excluded)
    pub total_matches: u32,

    pub params: FormatParams,
    pub scoring: PointsTable,
    pub tiebreakers: Vec<Tiebreaker>,

    /// Lives per participant for elimination formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lives: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<Pool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swiss: Option<SwissState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Leaderboard>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<PredictionPool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eliminated: Vec<ParticipantId>,

    /// Effective random seed when seeding was random
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl MatchGraph {
    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.index_of(id).map(|idx| &self.matches[idx])
    }

    pub(crate) fn index_of(&self, id: MatchId) -> Option<usize> {
        // Ids are dense and 1-based
        let idx = (id.0 as usize).checked_sub(1)?;
        match self.matches.get(idx) {
            Some(m) if m.id == id => Some(idx),
            _ => self.matches.iter().position(|m| m.id == id),
        }
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn seed_of(&self, id: ParticipantId) -> Option<u32> {
        self.seeds
            .iter()
            .find(|seed| seed.participant == id)
            .map(|seed| seed.position)
    }

    /// Participants in seed order
    pub fn seeded_participants(&self) -> Vec<ParticipantId> {
        let mut seeds = self.seeds.clone();
        seeds.sort_by_key(|seed| seed.position);
        seeds.into_iter().map(|seed| seed.participant).collect()
    }

    pub fn matches_in(&self, bracket: &str) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.bracket == bracket)
    }

    /// Contested matches currently in the graph
    pub fn contested_matches(&self) -> usize {
        self.matches.iter().filter(|m| m.is_contested()).count()
    }

    /// Every match resolved and the leaderboard event (if any) measured
    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(Match::is_resolved)
            && self
                .leaderboard
                .as_ref()
                .is_none_or(Leaderboard::is_complete)
    }

    /// Losses recorded against a participant
    pub fn losses(&self, participant: ParticipantId) -> u32 {
        self.matches
            .iter()
            .filter(|m| m.status == MatchStatus::Completed && m.loser() == Some(participant))
            .count() as u32
    }
}
