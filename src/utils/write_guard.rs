// ============================================================================
// Write Guard - Trips persistence into in-memory-only mode
// ============================================================================
//
// A one-way breaker for durable writes. It counts consecutive failures and,
// once the threshold is reached, opens for the rest of the session: callers
// stop touching the store and keep working in memory.
//
// States:
// - Closed: writes pass through
// - Open:   writes are skipped until the session ends
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Closed,
    Open,
}

#[derive(Debug, Clone)]
pub struct WriteGuard {
    state: GuardState,
    consecutive_failures: u32,
    failure_threshold: u32,
}

impl WriteGuard {
    /// A threshold of 0 is treated as 1.
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            state: GuardState::Closed,
            consecutive_failures: 0,
            failure_threshold: failure_threshold.max(1),
        }
    }

    pub fn allows_write(&self) -> bool {
        self.state == GuardState::Closed
    }

    pub fn record_success(&mut self) {
        if self.state == GuardState::Closed {
            self.consecutive_failures = 0;
        }
    }

    /// Returns `true` when this failure is the one that opened the guard
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.state == GuardState::Closed && self.consecutive_failures >= self.failure_threshold {
            tracing::warn!(
                failures = self.consecutive_failures,
                "Write guard opening, persistence disabled for this session"
            );
            self.state = GuardState::Open;
            return true;
        }

        false
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_opens_after_threshold() {
        let mut guard = WriteGuard::new(3);

        assert!(!guard.record_failure());
        assert!(!guard.record_failure());
        assert!(guard.allows_write());

        assert!(guard.record_failure());
        assert_eq!(guard.state(), GuardState::Open);
        assert!(!guard.allows_write());
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let mut guard = WriteGuard::new(2);

        guard.record_failure();
        guard.record_success();
        assert_eq!(guard.failure_count(), 0);

        assert!(!guard.record_failure());
        assert!(guard.allows_write());
    }

    #[test]
    fn test_open_guard_stays_open() {
        let mut guard = WriteGuard::new(1);
        assert!(guard.record_failure());

        guard.record_success();
        assert_eq!(guard.state(), GuardState::Open);
        assert!(!guard.record_failure());
    }

    #[test]
    fn test_zero_threshold_is_one() {
        let guard = WriteGuard::new(0);
        assert_eq!(guard.failure_threshold(), 1);
    }
}
