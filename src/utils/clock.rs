use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

// ============================================================================
// Clock - Injectable time source
// ============================================================================
//
// Order identity and creation timestamps are derived from "now". Production
// code reads the system clock; tests pin time with FixedClock so that order
// ids and timestamps are predictable.
//
// ============================================================================

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for deterministic tests and demos
///
/// Millisecond resolution, which is all order ids and snapshots keep.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(time.timestamp_millis()),
        }
    }

    /// Build a clock pinned to the given epoch milliseconds
    pub fn at_millis(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        self.millis.store(time.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_stable() {
        let clock = FixedClock::at_millis(1_735_689_600_123);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().timestamp_millis(), 1_735_689_600_123);
    }

    #[test]
    fn test_fixed_clock_advance_and_set() {
        let clock = FixedClock::at_millis(1_000);
        clock.advance(Duration::milliseconds(250));
        assert_eq!(clock.now().timestamp_millis(), 1_250);

        let later = DateTime::from_timestamp_millis(9_000).unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
