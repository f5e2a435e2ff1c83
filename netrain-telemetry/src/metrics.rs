//! ## netrain-telemetry::metrics
//! **Prometheus counters for the capture pipeline**
//!
//! The counters double as the live stats read by the renderer (packets captured,
//! throughput), so they are updated from the capture thread and read from the main thread.

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

/// Why the stream engine discarded a dequeued event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    NoColumn,
    NoSlot,
}

impl DropReason {
    fn label(self) -> &'static str {
        match self {
            DropReason::NoColumn => "no_column",
            DropReason::NoSlot => "no_slot",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub frames_captured: IntCounter,
    pub frames_rejected: IntCounter,
    pub events_queued: IntCounter,
    pub events_evicted: IntCounter,
    pub events_dropped: IntCounterVec,
    pub streams_spawned: IntCounter,
    pub throughput_bytes: IntGauge,
    pub tick_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let frames_captured =
            IntCounter::new("netrain_frames_captured_total", "Frames read from the tap")?;
        let frames_rejected = IntCounter::new(
            "netrain_frames_rejected_total",
            "Frames the header parser could not classify",
        )?;
        let events_queued =
            IntCounter::new("netrain_events_queued_total", "Display events pushed")?;
        let events_evicted = IntCounter::new(
            "netrain_events_evicted_total",
            "Display events overwritten by a push on a full queue",
        )?;
        let events_dropped = IntCounterVec::new(
            Opts::new(
                "netrain_events_dropped_total",
                "Display events discarded by the stream engine",
            ),
            &["reason"],
        )?;
        let streams_spawned =
            IntCounter::new("netrain_streams_spawned_total", "Streams started")?;
        let throughput_bytes = IntGauge::new(
            "netrain_throughput_bytes_per_second",
            "Interface throughput from OS byte counters",
        )?;
        let tick_duration = Histogram::with_opts(
            HistogramOpts::new("netrain_tick_duration_seconds", "Simulation tick time")
                .buckets(vec![0.000_01, 0.000_1, 0.001, 0.01, 0.1]),
        )?;

        registry.register(Box::new(frames_captured.clone()))?;
        registry.register(Box::new(frames_rejected.clone()))?;
        registry.register(Box::new(events_queued.clone()))?;
        registry.register(Box::new(events_evicted.clone()))?;
        registry.register(Box::new(events_dropped.clone()))?;
        registry.register(Box::new(streams_spawned.clone()))?;
        registry.register(Box::new(throughput_bytes.clone()))?;
        registry.register(Box::new(tick_duration.clone()))?;

        Ok(Self {
            registry,
            frames_captured,
            frames_rejected,
            events_queued,
            events_evicted,
            events_dropped,
            streams_spawned,
            throughput_bytes,
            tick_duration,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    #[inline]
    pub fn inc_dropped(&self, reason: DropReason) {
        self.events_dropped.with_label_values(&[reason.label()]).inc();
    }

    pub fn dropped(&self, reason: DropReason) -> u64 {
        self.events_dropped.with_label_values(&[reason.label()]).get()
    }
}
