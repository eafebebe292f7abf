use std::time::{Duration, SystemTime};

/// Time source for stage loops.
///
/// Artifact names, mtimes and staleness checks all read `now` from here, which lets tests
/// replace wall time with a simulated clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
    fn sleep(&self, d: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}
