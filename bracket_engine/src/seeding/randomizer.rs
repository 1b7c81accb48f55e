//! Reproducible shuffling for random seeding.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Seed-order randomizer
///
/// Wraps a seedable RNG so a random draw can be replayed from the seed it
/// reports.
pub struct SeedRandomizer {
    /// Seed the RNG was created from
    seed: u64,

    /// Random number generator
    rng: StdRng,
}

impl SeedRandomizer {
    /// Create a randomizer from a fresh seed
    pub fn new() -> Self {
        Self::from_seed(rand::rng().random())
    }

    /// Create a randomizer that replays a previous draw
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed this randomizer was created from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Shuffle items into a random seed order
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl Default for SeedRandomizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_order() {
        let mut first: Vec<u32> = (1..=16).collect();
        let mut second = first.clone();

        SeedRandomizer::from_seed(42).shuffle(&mut first);
        SeedRandomizer::from_seed(42).shuffle(&mut second);

        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut items: Vec<u32> = (1..=32).collect();
        let mut randomizer = SeedRandomizer::new();
        randomizer.shuffle(&mut items);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=32).collect::<Vec<_>>());
    }

    #[test]
    fn test_reports_seed() {
        let randomizer = SeedRandomizer::from_seed(7);
        assert_eq!(randomizer.seed(), 7);
    }
}
