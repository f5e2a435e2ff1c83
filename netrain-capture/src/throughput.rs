//! Interface throughput from OS byte counters.
//!
//! Sampling is gated twice: only on every `every_batches`-th batch, and no more than once
//! per `min_interval`. The rate stays 0 until two samples exist.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::interface::CounterSource;

pub struct ThroughputSampler<C> {
    counters: C,
    every_batches: u64,
    min_interval: Duration,
    last: Option<(u64, Instant)>,
    rate: u64,
}

impl<C: CounterSource> ThroughputSampler<C> {
    pub fn new(counters: C, every_batches: u64) -> Self {
        Self {
            counters,
            every_batches: every_batches.max(1),
            min_interval: Duration::from_secs(1),
            last: None,
            rate: 0,
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Last computed bytes per second.
    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Offers batch number `batch` for sampling. Returns the new rate when one was computed.
    ///
    /// A failed read skips the sample; a counter that went backwards becomes the new baseline.
    pub fn on_batch(&mut self, batch: u64, now: Instant) -> Option<u64> {
        if batch % self.every_batches != 0 {
            return None;
        }
        if let Some((_, at)) = self.last {
            if now.saturating_duration_since(at) < self.min_interval {
                return None;
            }
        }

        let total = match self.counters.read_total_bytes() {
            Ok(total) => total,
            Err(e) => {
                debug!(error = %e, "Throughput sample skipped");
                return None;
            }
        };

        let updated = match self.last {
            Some((prev, at)) if total >= prev => {
                let secs = now.saturating_duration_since(at).as_secs_f64();
                (secs > 0.0).then(|| {
                    self.rate = ((total - prev) as f64 / secs) as u64;
                    self.rate
                })
            }
            Some((prev, _)) => {
                debug!(prev, total, "Interface counters went backwards, rebaselining");
                None
            }
            None => None,
        };

        self.last = Some((total, now));
        updated
    }
}
