// ============================================================================
// Scheduler - Simulated order fulfilment
// ============================================================================
//
// - progression: one synchronous tick over the order book
// - runner:      tokio interval task that drives ticks until shut down
//
// ============================================================================

pub mod progression;
pub mod runner;

pub use progression::{StatusProgression, TickReport};
pub use runner::{spawn_scheduler, SchedulerHandle};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::utils::RandomSource;

    /// Constant roll that counts how often it was asked
    #[derive(Debug, Clone)]
    pub struct CountingRandom {
        roll: f64,
        rolls: Arc<AtomicUsize>,
    }

    impl CountingRandom {
        pub fn new(roll: f64) -> Self {
            Self {
                roll,
                rolls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn rolls(&self) -> usize {
            self.rolls.load(Ordering::SeqCst)
        }
    }

    impl RandomSource for CountingRandom {
        fn next_roll(&mut self) -> f64 {
            self.rolls.fetch_add(1, Ordering::SeqCst);
            self.roll
        }
    }
}
