use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

// ============================================================================
// Random Source - Injectable dice for status progression
// ============================================================================
//
// Every roll is a float in [0, 1). The scheduler draws exactly one roll per
// non-terminal order per tick, so a scripted sequence fully determines the
// outcome of a tick.
//
// ============================================================================

/// Source of uniform rolls in `[0, 1)`
pub trait RandomSource: Send {
    fn next_roll(&mut self) -> f64;
}

/// `StdRng`-backed source, seeded from OS entropy or a fixed seed
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible source, handy for demos and statistical tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Scripted rolls, replayed in order
///
/// Once the script runs out every further roll returns `fallback`.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    rolls: VecDeque<f64>,
    fallback: f64,
}

impl SequenceRandom {
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: 1.0,
        }
    }

    /// Source that always returns the same roll
    pub fn constant(roll: f64) -> Self {
        Self {
            rolls: VecDeque::new(),
            fallback: roll,
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl RandomSource for SequenceRandom {
    fn next_roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_replays_then_falls_back() {
        let mut random = SequenceRandom::new([0.1, 0.9]).with_fallback(0.5);
        assert_eq!(random.next_roll(), 0.1);
        assert_eq!(random.next_roll(), 0.9);
        assert_eq!(random.remaining(), 0);
        assert_eq!(random.next_roll(), 0.5);
        assert_eq!(random.next_roll(), 0.5);
    }

    #[test]
    fn test_std_random_stays_in_unit_interval() {
        let mut random = StdRandom::seeded(7);
        for _ in 0..1_000 {
            let roll = random.next_roll();
            assert!((0.0..1.0).contains(&roll));
        }
    }

    #[test]
    fn test_seeded_sources_agree() {
        let mut a = StdRandom::seeded(42);
        let mut b = StdRandom::seeded(42);
        for _ in 0..16 {
            assert_eq!(a.next_roll(), b.next_roll());
        }
    }
}
