//! ## netrain-core::system
//! The handle shared by the capture thread and the stream engine.
//!
//! Owns the event queue, the metrics that double as live stats, and the shutdown flag.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use netrain_telemetry::MetricsRecorder;
use tracing::debug;

use crate::error::CoreError;
use crate::events::{DisplayEvent, EventQueue, PushOutcome};

/// Live counters shown by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub bytes_per_sec: u64,
    pub packets_captured: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KIB: u64 = 1024;
        const MIB: u64 = 1024 * 1024;

        match self.bytes_per_sec {
            rate if rate < KIB => write!(f, "{} B/s", rate)?,
            rate if rate < MIB => write!(f, "{:.1} KB/s", rate as f64 / KIB as f64)?,
            rate => write!(f, "{:.1} MB/s", rate as f64 / MIB as f64)?,
        }
        write!(f, " | {} pkts", self.packets_captured)
    }
}

pub struct CaptureSystem {
    queue: EventQueue,
    metrics: Arc<MetricsRecorder>,
    shutdown: AtomicBool,
}

impl CaptureSystem {
    pub fn new(queue_capacity: usize, metrics: Arc<MetricsRecorder>) -> Result<Self, CoreError> {
        Ok(Self {
            queue: EventQueue::with_capacity(queue_capacity)?,
            metrics,
            shutdown: AtomicBool::new(false),
        })
    }

    /// Queues an event and accounts for it.
    #[inline]
    pub fn publish(&self, event: DisplayEvent) -> PushOutcome {
        let outcome = self.queue.push(event);
        self.metrics.events_queued.inc();
        if outcome == PushOutcome::EvictedOldest {
            self.metrics.events_evicted.inc();
        }
        outcome
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    pub fn stats(&self) -> Stats {
        Stats {
            bytes_per_sec: u64::try_from(self.metrics.throughput_bytes.get()).unwrap_or(0),
            packets_captured: self.metrics.frames_captured.get(),
        }
    }

    pub fn request_shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            debug!("Shutdown requested");
        }
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ColorTag, Zone};

    fn system(capacity: usize) -> CaptureSystem {
        CaptureSystem::new(capacity, Arc::new(MetricsRecorder::new().unwrap())).unwrap()
    }

    fn event(text: &str) -> DisplayEvent {
        DisplayEvent::from_text(text, ColorTag::Outbound, Zone::Cleartext, false, false).unwrap()
    }

    #[test]
    fn publish_counts_queued_and_evicted() {
        let system = system(2);
        system.publish(event("a"));
        system.publish(event("b"));
        assert_eq!(system.publish(event("c")), PushOutcome::EvictedOldest);

        assert_eq!(system.metrics().events_queued.get(), 3);
        assert_eq!(system.metrics().events_evicted.get(), 1);
        assert_eq!(system.queue().pop().unwrap().text(), "b");
    }

    #[test]
    fn stats_read_the_metrics() {
        let system = system(4);
        system.metrics().frames_captured.inc_by(7);
        system.metrics().throughput_bytes.set(4096);
        assert_eq!(
            system.stats(),
            Stats {
                bytes_per_sec: 4096,
                packets_captured: 7
            }
        );
    }

    #[test]
    fn shutdown_flag_latches() {
        let system = system(1);
        assert!(!system.is_shutdown());
        system.request_shutdown();
        system.request_shutdown();
        assert!(system.is_shutdown());
    }

    #[test]
    fn stats_readout_units() {
        let stats = |bytes_per_sec| Stats {
            bytes_per_sec,
            packets_captured: 12,
        };
        assert_eq!(stats(0).to_string(), "0 B/s | 12 pkts");
        assert_eq!(stats(1023).to_string(), "1023 B/s | 12 pkts");
        assert_eq!(stats(1536).to_string(), "1.5 KB/s | 12 pkts");
        assert_eq!(stats(3 * 1024 * 1024).to_string(), "3.0 MB/s | 12 pkts");
    }
}
