//! Fixed-rate tick pacing.
//!
//! Ticks are due on a wall-clock deadline. When the loop falls behind, the deadline
//! resynchronises to the current time instead of running catch-up ticks.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct TickScheduler {
    interval: Duration,
    next_deadline: Instant,
}

impl TickScheduler {
    /// The first tick is due at `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_deadline: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How long the display may block before the next tick is due; zero when overdue.
    #[inline]
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }

    /// True when a tick is due. Advances the deadline by one interval.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_deadline {
            return false;
        }

        self.next_deadline += self.interval;
        if self.next_deadline < now {
            self.next_deadline = now;
        }
        true
    }
}
