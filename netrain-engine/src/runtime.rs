/*!
# Runtime

Drives the two threads of a run. The capture loop moves onto a dedicated
`netrain-capture` thread; the calling thread waits on the display, applies geometry
changes, and ticks and renders the stream engine on the scheduler's cadence.

Teardown always sets the shutdown flag and joins the capture thread, so the tap is
dropped only after the thread that reads it has exited.
*/

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{error, info, instrument, warn};

use netrain_capture::{CaptureError, CaptureLoop, CaptureReport, CounterSource, FrameSource};
use netrain_core::system::CaptureSystem;

use crate::display::Display;
use crate::engine::{EngineStats, StreamEngine};
use crate::error::EngineError;
use crate::scheduler::TickScheduler;
use crate::snapshot::Frame;

pub const CAPTURE_THREAD_NAME: &str = "netrain-capture";

/// Final counts reported when a run ends.
#[derive(Debug)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames_rendered: u64,
    pub packets_captured: u64,
    pub frames_rejected: u64,
    pub events_evicted: u64,
    pub engine: EngineStats,
    pub capture: Option<CaptureReport>,
    /// Set when the capture thread stopped on its own because the tap kept failing.
    pub capture_error: Option<CaptureError>,
}

pub struct Runtime<R> {
    engine: StreamEngine<R>,
    scheduler: TickScheduler,
    system: Arc<CaptureSystem>,
    max_ticks: Option<u64>,
}

impl<R: Rng> Runtime<R> {
    pub fn new(engine: StreamEngine<R>, system: Arc<CaptureSystem>, tick_interval: Duration) -> Self {
        Self {
            engine,
            scheduler: TickScheduler::new(tick_interval, Instant::now()),
            system,
            max_ticks: None,
        }
    }

    /// Stops after `ticks` simulation ticks instead of running until shutdown.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn engine(&self) -> &StreamEngine<R> {
        &self.engine
    }

    /// Runs until shutdown is requested, the capture thread exits, `max_ticks` is reached,
    /// or the display fails.
    #[instrument(name = "runtime", skip_all)]
    pub fn run<S, C, D>(
        mut self,
        capture: CaptureLoop<S, C>,
        display: &mut D,
    ) -> Result<RunSummary, EngineError>
    where
        S: FrameSource + Send + 'static,
        C: CounterSource + Send + 'static,
        D: Display + ?Sized,
    {
        let handle = thread::Builder::new()
            .name(CAPTURE_THREAD_NAME.into())
            .spawn(move || capture.run())
            .map_err(EngineError::Spawn)?;
        info!(thread = CAPTURE_THREAD_NAME, "Capture thread started");

        let outcome = self.drive(display, &handle);

        self.system.request_shutdown();
        let joined = handle.join().map_err(|_| EngineError::CapturePanicked)?;
        let (capture, capture_error) = match joined {
            Ok(report) => (Some(report), None),
            Err(e) => {
                error!(error = %e, "Capture stopped early");
                (None, Some(e))
            }
        };

        let frames_rendered = outcome?;
        let metrics = self.system.metrics();
        let summary = RunSummary {
            ticks: self.engine.stats().ticks,
            frames_rendered,
            packets_captured: metrics.frames_captured.get(),
            frames_rejected: metrics.frames_rejected.get(),
            events_evicted: metrics.events_evicted.get(),
            engine: self.engine.stats(),
            capture,
            capture_error,
        };
        info!(
            ticks = summary.ticks,
            packets = summary.packets_captured,
            rejected = summary.frames_rejected,
            evicted = summary.events_evicted,
            "Run finished"
        );
        Ok(summary)
    }

    /// The tick/render loop. Returns the number of frames rendered.
    fn drive<D, T>(&mut self, display: &mut D, capture: &JoinHandle<T>) -> Result<u64, EngineError>
    where
        D: Display + ?Sized,
    {
        let mut rendered = 0;

        loop {
            if self.system.is_shutdown() {
                break;
            }
            if capture.is_finished() {
                warn!("Capture thread exited, stopping");
                break;
            }
            if self
                .max_ticks
                .is_some_and(|max| self.engine.stats().ticks >= max)
            {
                break;
            }

            display.wait(self.scheduler.time_until_next(Instant::now()))?;

            if let Some(geometry) = display.take_resize() {
                info!(%geometry, "Display resized");
                self.engine.resize(geometry)?;
            }

            if !self.scheduler.poll(Instant::now()) {
                continue;
            }

            self.engine.tick(self.system.queue());
            if self.engine.has_visible_content() {
                let frame = Frame {
                    tick: self.engine.stats().ticks,
                    streams: self.engine.snapshot(),
                    stats: self.system.stats(),
                };
                display.render(&frame)?;
                rendered += 1;
            }
        }

        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayError, Geometry};
    use netrain_capture::{CaptureLoop, ThroughputSampler};
    use netrain_config::{CaptureConfig, SimulatorConfig, StreamsConfig};
    use netrain_core::events::MAX_EVENT_TEXT;
    use netrain_core::format::{EventFormatter, MIN_HEX_PAYLOAD};
    use netrain_core::registry::LocalAddressRegistry;
    use netrain_simulator::{SyntheticTap, TapCounters};
    use netrain_telemetry::MetricsRecorder;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const TICK: Duration = Duration::from_millis(1);

    fn system() -> Arc<CaptureSystem> {
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        Arc::new(CaptureSystem::new(256, metrics).unwrap())
    }

    fn synthetic_capture(system: &Arc<CaptureSystem>) -> CaptureLoop<SyntheticTap, TapCounters> {
        let sim = SimulatorConfig::default();
        let tap = SyntheticTap::new(&sim);
        let sampler = ThroughputSampler::new(tap.counters(), 20);
        let mut registry = LocalAddressRegistry::with_capacity(8);
        registry.insert(sim.local_address);
        let formatter = EventFormatter::new(registry, MAX_EVENT_TEXT, MIN_HEX_PAYLOAD).unwrap();
        CaptureLoop::new(tap, formatter, Arc::clone(system), sampler, &CaptureConfig::default())
    }

    fn runtime(system: &Arc<CaptureSystem>) -> Runtime<SmallRng> {
        let engine = StreamEngine::new(
            &StreamsConfig::default(),
            Geometry::new(80, 24),
            SmallRng::seed_from_u64(1),
        )
        .unwrap();
        Runtime::new(engine, Arc::clone(system), TICK)
    }

    /// Sleeps through waits and counts rendered frames.
    #[derive(Default)]
    struct CountingDisplay {
        frames: u64,
        fail_wait: bool,
    }

    impl Display for CountingDisplay {
        fn geometry(&self) -> Geometry {
            Geometry::new(80, 24)
        }

        fn wait(&mut self, timeout: Duration) -> Result<(), DisplayError> {
            if self.fail_wait {
                return Err(DisplayError::Disconnected("test".into()));
            }
            thread::sleep(timeout);
            Ok(())
        }

        fn take_resize(&mut self) -> Option<Geometry> {
            None
        }

        fn render(&mut self, frame: &Frame<'_>) -> Result<(), DisplayError> {
            assert!(!frame.streams.is_empty());
            self.frames += 1;
            Ok(())
        }
    }

    #[test]
    fn stops_after_max_ticks_and_joins_capture() {
        let system = system();
        let mut display = CountingDisplay::default();
        let summary = runtime(&system)
            .with_max_ticks(25)
            .run(synthetic_capture(&system), &mut display)
            .unwrap();

        assert_eq!(summary.ticks, 25);
        assert_eq!(summary.frames_rendered, display.frames);
        assert!(summary.capture.is_some());
        assert!(summary.capture_error.is_none());
        assert!(system.is_shutdown());
    }

    #[test]
    fn prior_shutdown_request_ends_run_immediately() {
        let system = system();
        system.request_shutdown();
        let summary = runtime(&system)
            .run(synthetic_capture(&system), &mut CountingDisplay::default())
            .unwrap();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.frames_rendered, 0);
    }

    #[test]
    fn display_failure_still_stops_capture() {
        let system = system();
        let mut display = CountingDisplay {
            fail_wait: true,
            ..CountingDisplay::default()
        };
        let result = runtime(&system).run(synthetic_capture(&system), &mut display);

        assert!(matches!(result, Err(EngineError::Display(_))));
        assert!(system.is_shutdown());
    }
}
