pub mod clock;
pub mod random;
pub mod write_guard;

pub use clock::{Clock, FixedClock, SystemClock};
pub use random::{RandomSource, SequenceRandom, StdRandom};
pub use write_guard::{GuardState, WriteGuard};
