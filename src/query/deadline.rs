use std::time::{Duration, Instant};

/// Cooperative query deadline. Work under a deadline checks `expired`
/// at bounded intervals (once per candidate examined) and abandons the
/// remainder; nothing is ever forcibly interrupted.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn after_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
