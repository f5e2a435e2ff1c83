//! ## netrain-engine::engine
//! **The stream simulation engine**
//!
//! Owns a fixed pool of stream slots and the column map. Each tick drains a bounded
//! number of display events from the queue into free slots, then advances every stream.
//! Nothing here allocates after construction or a resize.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, trace};

use netrain_config::StreamsConfig;
use netrain_core::events::{DisplayEvent, EventQueue, MAX_EVENT_TEXT};
use netrain_telemetry::{DropReason, MetricsRecorder};

use crate::columns::ColumnMap;
use crate::display::Geometry;
use crate::error::EngineError;
use crate::snapshot::Snapshot;
use crate::stream::{Launch, Step, Stream};

/// Cumulative engine counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks: u64,
    pub spawned: u64,
    pub retired: u64,
    pub dropped_no_column: u64,
    pub dropped_no_slot: u64,
}

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub dequeued: usize,
    pub spawned: usize,
    pub started_fading: usize,
    pub retired: usize,
}

pub struct StreamEngine<R> {
    streams: Vec<Stream>,
    free_slots: Vec<usize>,
    columns: ColumnMap,
    geometry: Geometry,
    config: StreamsConfig,
    rng: R,
    stats: EngineStats,
    metrics: Option<Arc<MetricsRecorder>>,
}

impl<R: Rng> StreamEngine<R> {
    pub fn new(config: &StreamsConfig, geometry: Geometry, rng: R) -> Result<Self, EngineError> {
        check_geometry(geometry)?;
        if config.max_streams == 0 {
            return Err(EngineError::InvalidSettings("max_streams must be non-zero".into()));
        }
        if config.max_stream_length == 0 || config.max_stream_length > MAX_EVENT_TEXT {
            return Err(EngineError::InvalidSettings(format!(
                "max_stream_length must be within 1..={MAX_EVENT_TEXT}"
            )));
        }

        let mut streams = Vec::new();
        streams
            .try_reserve_exact(config.max_streams)
            .map_err(|e| EngineError::Allocation(format!("{} stream slots: {e}", config.max_streams)))?;
        streams.resize_with(config.max_streams, Stream::default);

        let mut free_slots = Vec::new();
        free_slots
            .try_reserve_exact(config.max_streams)
            .map_err(|e| EngineError::Allocation(format!("free slot list: {e}")))?;

        let mut engine = Self {
            streams,
            free_slots,
            columns: ColumnMap::new(geometry.columns, config.column_gap)?,
            geometry,
            config: config.clone(),
            rng,
            stats: EngineStats::default(),
            metrics: None,
        };
        engine.refill_free_slots();

        info!(
            %geometry,
            max_streams = config.max_streams,
            "Stream engine ready"
        );
        Ok(engine)
    }

    /// Mirrors engine counters into the shared prometheus registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn refill_free_slots(&mut self) {
        self.free_slots.clear();
        // Popping from the end hands out slot 0 first.
        self.free_slots.extend((0..self.streams.len()).rev());
    }

    /// Drains up to `events_per_tick` events into new streams, then advances every stream.
    pub fn tick(&mut self, queue: &EventQueue) -> TickSummary {
        let _timer = self
            .metrics
            .as_ref()
            .map(|m| m.tick_duration.start_timer());
        let mut spawned = 0;
        let dequeued = queue.drain_into(self.config.events_per_tick, |event| {
            if self.spawn_stream(&event).is_ok() {
                spawned += 1;
            }
        });
        let mut summary = TickSummary {
            dequeued,
            spawned,
            ..TickSummary::default()
        };

        let rows = self.geometry.rows;
        let fade_rate = i32::try_from(self.config.fade_rate).unwrap_or(i32::MAX);
        for (slot, stream) in self.streams.iter_mut().enumerate() {
            match stream.step(rows, fade_rate) {
                Step::StartedFading => summary.started_fading += 1,
                Step::Retired => {
                    self.columns.release(stream.column());
                    self.free_slots.push(slot);
                    summary.retired += 1;
                }
                Step::Idle | Step::Advanced | Step::Faded => {}
            }
        }

        self.stats.ticks += 1;
        self.stats.retired += summary.retired as u64;
        if summary.dequeued > 0 || summary.retired > 0 {
            trace!(tick = self.stats.ticks, ?summary, "Tick");
        }
        summary
    }

    /// Places one event into a free slot and column. Returns the slot on success.
    pub fn spawn_stream(&mut self, event: &DisplayEvent) -> Result<usize, DropReason> {
        if self.free_slots.is_empty() {
            return Err(self.record_drop(DropReason::NoSlot));
        }

        let Some(column) = self
            .columns
            .find(&mut self.rng, self.config.column_search_attempts)
        else {
            return Err(self.record_drop(DropReason::NoColumn));
        };

        let Some(slot) = self.free_slots.pop() else {
            return Err(self.record_drop(DropReason::NoSlot));
        };

        let launch = Launch {
            column,
            speed: self.draw_speed(),
            fade_at_tick: self.draw_fade_deadline(),
            max_len: self.config.max_stream_length,
        };
        self.streams[slot].activate(event, launch);
        self.columns.occupy(column);

        self.stats.spawned += 1;
        if let Some(metrics) = &self.metrics {
            metrics.streams_spawned.inc();
        }
        Ok(slot)
    }

    fn record_drop(&mut self, reason: DropReason) -> DropReason {
        match reason {
            DropReason::NoColumn => self.stats.dropped_no_column += 1,
            DropReason::NoSlot => self.stats.dropped_no_slot += 1,
        }
        if let Some(metrics) = &self.metrics {
            metrics.inc_dropped(reason);
        }
        reason
    }

    /// Uniform in `[speed_min, speed_min + speed_range)` at 0.01 granularity.
    fn draw_speed(&mut self) -> f32 {
        let steps = (self.config.speed_range * 100.0) as u32;
        if steps == 0 {
            return self.config.speed_min;
        }
        self.config.speed_min + self.rng.random_range(0..steps) as f32 / 100.0
    }

    fn draw_fade_deadline(&mut self) -> u32 {
        let range = self.config.fade_delay_range;
        if range == 0 {
            return self.config.fade_delay_min;
        }
        self.config.fade_delay_min + self.rng.random_range(0..range)
    }

    /// Clears every stream and adopts the new grid. A zero-sized grid is rejected and
    /// leaves the engine untouched.
    pub fn resize(&mut self, geometry: Geometry) -> Result<(), EngineError> {
        check_geometry(geometry)?;
        self.columns.reset(geometry.columns)?;
        self.streams.fill_with(Stream::default);
        self.refill_free_slots();
        self.geometry = geometry;
        debug!(%geometry, "Stream engine reset");
        Ok(())
    }

    /// True when any slot is active or fading.
    #[inline]
    pub fn has_visible_content(&self) -> bool {
        self.streams.iter().any(|s| !s.is_empty())
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(&self.streams)
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn free_slots(&self) -> usize {
        self.free_slots.len()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}

fn check_geometry(geometry: Geometry) -> Result<(), EngineError> {
    if geometry.columns == 0 || geometry.rows == 0 {
        return Err(EngineError::InvalidGeometry {
            columns: geometry.columns,
            rows: geometry.rows,
        });
    }
    Ok(())
}
