use std::time::Instant;

/// Source of "now" for cache ageing. Swapped for a hand driven clock in tests.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
