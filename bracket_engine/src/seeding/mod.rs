//! Seed assignment.
//!
//! Orders the participant list into seed positions before any bracket is
//! built:
//! - `random`: shuffled with a supplied seed, or a fresh one that is reported
//!   back so the draw can be replayed
//! - `manual`: the explicit `order`, or the participant list order itself
//! - `rating`: descending strength score, ties keep list order
//!
//! ## Example
//!
//! ```
//! use bracket_engine::config::SeedingConfig;
//! use bracket_engine::seeding::{assign_seeds, participants_from_names};
//!
//! let participants = participants_from_names(&["Ada".into(), "Bo".into()]).unwrap();
//! let assignment = assign_seeds(&participants, &SeedingConfig::default()).unwrap();
//! assert_eq!(assignment.seeds[0].position, 1);
//! ```

pub mod randomizer;

pub use randomizer::SeedRandomizer;

use crate::config::SeedingConfig;
use crate::errors::{BracketError, BracketResult};
use crate::graph::{Participant, ParticipantId, Seed};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Seeding method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedingMethod {
    Random,
    Manual,
    Rating,
}

impl FromStr for SeedingMethod {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(SeedingMethod::Random),
            "manual" => Ok(SeedingMethod::Manual),
            "rating" | "ranking" => Ok(SeedingMethod::Rating),
            other => Err(BracketError::config(format!("unknown seeding method '{other}'"))),
        }
    }
}

/// Result of seed assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAssignment {
    /// Seeds ordered by position
    pub seeds: Vec<Seed>,

    /// Seed of the random source, for `random` seeding
    pub random_seed: Option<u64>,
}

impl SeedAssignment {
    /// Participant ids in seed order
    pub fn order(&self) -> Vec<ParticipantId> {
        self.seeds.iter().map(|seed| seed.participant).collect()
    }
}

/// Build participants from request names, rejecting empty or duplicate names
pub fn participants_from_names(names: &[String]) -> BracketResult<Vec<Participant>> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut participants = Vec::with_capacity(names.len());

    for (idx, raw) in names.iter().enumerate() {
        let name = raw.trim();
        if name.is_empty() {
            return Err(BracketError::config(format!(
                "participant {} has an empty name",
                idx + 1
            )));
        }
        if !seen.insert(name.to_string()) {
            return Err(BracketError::config(format!("duplicate participant '{name}'")));
        }
        participants.push(Participant {
            id: ParticipantId(idx as u32 + 1),
            name: name.to_string(),
        });
    }

    Ok(participants)
}

/// Assign seed positions 1..=N
pub fn assign_seeds(
    participants: &[Participant],
    config: &SeedingConfig,
) -> BracketResult<SeedAssignment> {
    let method = match config.method.as_deref() {
        Some(method) => method.parse()?,
        None => SeedingMethod::Manual,
    };

    let mut random_seed = None;
    let ordered: Vec<ParticipantId> = match method {
        SeedingMethod::Manual => match &config.order {
            Some(order) => manual_order(participants, order)?,
            None => participants.iter().map(|p| p.id).collect(),
        },
        SeedingMethod::Random => {
            let mut randomizer = match config.seed {
                Some(seed) => SeedRandomizer::from_seed(seed),
                None => SeedRandomizer::new(),
            };
            let mut ids: Vec<ParticipantId> = participants.iter().map(|p| p.id).collect();
            randomizer.shuffle(&mut ids);
            random_seed = Some(randomizer.seed());
            ids
        }
        SeedingMethod::Rating => rating_order(participants, config)?,
    };

    log::debug!(
        "Assigned {} seeds using {:?} seeding",
        ordered.len(),
        method
    );

    let seeds = ordered
        .into_iter()
        .enumerate()
        .map(|(idx, participant)| Seed {
            participant,
            position: idx as u32 + 1,
        })
        .collect();

    Ok(SeedAssignment { seeds, random_seed })
}

fn lookup(participants: &[Participant], name: &str) -> BracketResult<ParticipantId> {
    participants
        .iter()
        .find(|p| p.name == name.trim())
        .map(|p| p.id)
        .ok_or_else(|| BracketError::config(format!("seed order names unknown participant '{name}'")))
}

fn manual_order(participants: &[Participant], order: &[String]) -> BracketResult<Vec<ParticipantId>> {
    if order.len() != participants.len() {
        return Err(BracketError::config(format!(
            "seed count {} does not match participant count {}",
            order.len(),
            participants.len()
        )));
    }

    let mut seen = HashSet::with_capacity(order.len());
    let mut ids = Vec::with_capacity(order.len());
    for name in order {
        let id = lookup(participants, name)?;
        if !seen.insert(id) {
            return Err(BracketError::config(format!(
                "participant '{name}' is seeded twice"
            )));
        }
        ids.push(id);
    }
    Ok(ids)
}

fn rating_order(
    participants: &[Participant],
    config: &SeedingConfig,
) -> BracketResult<Vec<ParticipantId>> {
    let ratings = config
        .ratings
        .as_ref()
        .ok_or_else(|| BracketError::config("rating seeding requires ratings"))?;

    if ratings.len() != participants.len() {
        return Err(BracketError::config(format!(
            "seed count {} does not match participant count {}",
            ratings.len(),
            participants.len()
        )));
    }

    let mut rated = Vec::with_capacity(participants.len());
    for participant in participants {
        let rating = ratings.get(&participant.name).copied().ok_or_else(|| {
            BracketError::config(format!("no rating for participant '{}'", participant.name))
        })?;
        if !rating.is_finite() {
            return Err(BracketError::config(format!(
                "rating for '{}' is not a finite number",
                participant.name
            )));
        }
        rated.push((participant.id, rating));
    }

    // Stable: equal ratings keep list order
    rated.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(rated.into_iter().map(|(id, _)| id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Team {i}")).collect()
    }

    #[test]
    fn test_manual_defaults_to_list_order() {
        let participants = participants_from_names(&names(4)).unwrap();
        let config = SeedingConfig {
            method: Some("manual".to_string()),
            ..Default::default()
        };

        let assignment = assign_seeds(&participants, &config).unwrap();
        assert_eq!(
            assignment.order(),
            vec![
                ParticipantId(1),
                ParticipantId(2),
                ParticipantId(3),
                ParticipantId(4)
            ]
        );
        assert_eq!(assignment.random_seed, None);
    }

    #[test]
    fn test_manual_explicit_order() {
        let participants = participants_from_names(&names(3)).unwrap();
        let config = SeedingConfig {
            method: Some("manual".to_string()),
            order: Some(vec![
                "Team 3".to_string(),
                "Team 1".to_string(),
                "Team 2".to_string(),
            ]),
            ..Default::default()
        };

        let assignment = assign_seeds(&participants, &config).unwrap();
        assert_eq!(
            assignment.order(),
            vec![ParticipantId(3), ParticipantId(1), ParticipantId(2)]
        );
    }

    #[test]
    fn test_manual_order_count_mismatch() {
        let participants = participants_from_names(&names(3)).unwrap();
        let config = SeedingConfig {
            method: Some("manual".to_string()),
            order: Some(vec!["Team 1".to_string()]),
            ..Default::default()
        };

        assert!(matches!(
            assign_seeds(&participants, &config),
            Err(BracketError::Configuration(_))
        ));
    }

    #[test]
    fn test_random_with_seed_is_reproducible() {
        let participants = participants_from_names(&names(16)).unwrap();
        let config = SeedingConfig {
            method: Some("random".to_string()),
            seed: Some(2024),
            ..Default::default()
        };

        let first = assign_seeds(&participants, &config).unwrap();
        let second = assign_seeds(&participants, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.random_seed, Some(2024));
    }

    #[test]
    fn test_random_without_seed_reports_one() {
        let participants = participants_from_names(&names(8)).unwrap();
        let config = SeedingConfig {
            method: Some("random".to_string()),
            ..Default::default()
        };

        let assignment = assign_seeds(&participants, &config).unwrap();
        let replay = SeedingConfig {
            seed: assignment.random_seed,
            ..config
        };
        assert_eq!(assign_seeds(&participants, &replay).unwrap(), assignment);
    }

    #[test]
    fn test_rating_sorts_descending_and_keeps_ties_stable() {
        let participants = participants_from_names(&names(4)).unwrap();
        let ratings: HashMap<String, f64> = [
            ("Team 1".to_string(), 1200.0),
            ("Team 2".to_string(), 1500.0),
            ("Team 3".to_string(), 1200.0),
            ("Team 4".to_string(), 1800.0),
        ]
        .into_iter()
        .collect();
        let config = SeedingConfig {
            method: Some("rating".to_string()),
            ratings: Some(ratings),
            ..Default::default()
        };

        let assignment = assign_seeds(&participants, &config).unwrap();
        assert_eq!(
            assignment.order(),
            vec![
                ParticipantId(4),
                ParticipantId(2),
                ParticipantId(1),
                ParticipantId(3)
            ]
        );
    }

    #[test]
    fn test_rating_requires_every_participant() {
        let participants = participants_from_names(&names(3)).unwrap();
        let config = SeedingConfig {
            method: Some("rating".to_string()),
            ratings: Some([("Team 1".to_string(), 10.0)].into_iter().collect()),
            ..Default::default()
        };

        assert!(matches!(
            assign_seeds(&participants, &config),
            Err(BracketError::Configuration(_))
        ));
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        assert!(participants_from_names(&["A".into(), "A".into()]).is_err());
        assert!(participants_from_names(&["A".into(), "  ".into()]).is_err());
    }

    #[test]
    fn test_unknown_method() {
        let participants = participants_from_names(&names(2)).unwrap();
        let config = SeedingConfig {
            method: Some("alphabetical".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            assign_seeds(&participants, &config),
            Err(BracketError::Configuration(_))
        ));
    }
}
