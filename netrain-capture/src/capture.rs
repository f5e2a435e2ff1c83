//! ## netrain-capture::capture
//! The capture loop: tap → classify → format → queue.
//!
//! Runs on its own thread until the shared shutdown flag is set. Frames are pulled in
//! bounded non-blocking batches; an empty batch sleeps for the idle backoff.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, instrument, trace, warn};

use netrain_config::CaptureConfig;
use netrain_core::format::EventFormatter;
use netrain_core::system::CaptureSystem;
use netrain_protocols::classify;

use crate::error::CaptureError;
use crate::interface::CounterSource;
use crate::source::FrameSource;
use crate::throughput::ThroughputSampler;

/// Totals returned when the loop exits cleanly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureReport {
    pub batches: u64,
    pub frames: u64,
}

pub struct CaptureLoop<S, C> {
    source: S,
    formatter: EventFormatter,
    system: Arc<CaptureSystem>,
    sampler: ThroughputSampler<C>,
    batch_size: usize,
    idle_backoff: Duration,
    max_consecutive_errors: u32,
    consecutive_errors: u32,
    report: CaptureReport,
}

impl<S: FrameSource, C: CounterSource> CaptureLoop<S, C> {
    pub fn new(
        source: S,
        formatter: EventFormatter,
        system: Arc<CaptureSystem>,
        sampler: ThroughputSampler<C>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            source,
            formatter,
            system,
            sampler,
            batch_size: config.batch_size.max(1),
            idle_backoff: Duration::from_micros(config.idle_backoff_us),
            max_consecutive_errors: config.max_consecutive_errors.max(1),
            consecutive_errors: 0,
            report: CaptureReport::default(),
        }
    }

    /// Runs until shutdown is requested or the tap fails too many times in a row.
    #[instrument(name = "capture_loop", skip_all)]
    pub fn run(mut self) -> Result<CaptureReport, CaptureError> {
        info!(
            local_addresses = self.formatter.registry().len(),
            "Capture loop started"
        );

        while !self.system.is_shutdown() {
            let frames = self.run_batch(Instant::now())?;
            if frames == 0 {
                thread::sleep(self.idle_backoff);
            }
        }

        info!(
            batches = self.report.batches,
            frames = self.report.frames,
            "Capture loop stopped"
        );
        Ok(self.report)
    }

    /// Pulls and processes up to one batch of frames, then offers the batch to the
    /// throughput sampler. Returns the number of frames read.
    pub fn run_batch(&mut self, now: Instant) -> Result<usize, CaptureError> {
        let metrics = Arc::clone(self.system.metrics());
        let mut frames = 0;

        while frames < self.batch_size {
            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    self.consecutive_errors = 0;
                    frames += 1;
                    metrics.frames_captured.inc();

                    match classify(frame, frame.len()) {
                        Ok(flow) => {
                            for event in self.formatter.format(&flow) {
                                self.system.publish(event);
                            }
                        }
                        Err(reason) => {
                            metrics.frames_rejected.inc();
                            trace!(%reason, "Frame rejected");
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    self.consecutive_errors += 1;
                    warn!(
                        error = %e,
                        consecutive = self.consecutive_errors,
                        "Tap read failed"
                    );
                    if self.consecutive_errors >= self.max_consecutive_errors {
                        return Err(CaptureError::TooManyErrors {
                            count: self.consecutive_errors,
                            last: e.to_string(),
                        });
                    }
                    break;
                }
            }
        }

        if let Some(rate) = self.sampler.on_batch(self.report.batches, now) {
            metrics
                .throughput_bytes
                .set(i64::try_from(rate).unwrap_or(i64::MAX));
        }

        self.report.batches += 1;
        self.report.frames += frames as u64;
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netrain_core::prelude::*;
    use netrain_telemetry::MetricsRecorder;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use tracing_test::traced_test;

    const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
    const REMOTE: Ipv4Addr = Ipv4Addr::new(151, 101, 1, 69);

    enum Step {
        Frame(Vec<u8>),
        Fail,
    }

    #[derive(Default)]
    struct ScriptedSource {
        script: VecDeque<Step>,
        current: Vec<u8>,
    }

    impl ScriptedSource {
        fn with(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                script: steps.into_iter().collect(),
                current: Vec::new(),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
            match self.script.pop_front() {
                Some(Step::Frame(frame)) => {
                    self.current = frame;
                    Ok(Some(&self.current))
                }
                Some(Step::Fail) => Err(CaptureError::Tap("device went away".into())),
                None => Ok(None),
            }
        }
    }

    struct FixedCounters(VecDeque<u64>);

    impl CounterSource for FixedCounters {
        fn read_total_bytes(&mut self) -> Result<u64, CaptureError> {
            self.0
                .pop_front()
                .ok_or_else(|| CaptureError::InterfaceNotFound("test0".into()))
        }
    }

    fn tcp_frame(src: Ipv4Addr, dst: Ipv4Addr, sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&[0x08, 0x00]);
        let total_len = (20 + 20 + payload.len()) as u16;
        frame.extend_from_slice(&[0x45, 0x00]);
        frame.extend_from_slice(&total_len.to_be_bytes());
        frame.extend_from_slice(&[0, 0, 0x40, 0, 64, 6, 0, 0]);
        frame.extend_from_slice(&src.octets());
        frame.extend_from_slice(&dst.octets());
        frame.extend_from_slice(&sport.to_be_bytes());
        frame.extend_from_slice(&dport.to_be_bytes());
        frame.extend_from_slice(&[0; 8]);
        frame.extend_from_slice(&[0x50, 0x18, 0xff, 0xff, 0, 0, 0, 0]);
        frame.extend_from_slice(payload);
        frame
    }

    fn capture_loop<S: FrameSource>(
        source: S,
        counters: &[u64],
        config: &CaptureConfig,
    ) -> (CaptureLoop<S, FixedCounters>, Arc<CaptureSystem>) {
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        let system = Arc::new(CaptureSystem::new(64, metrics).unwrap());
        let mut registry = LocalAddressRegistry::with_capacity(8);
        registry.insert(LOCAL);
        let formatter = EventFormatter::new(registry, MAX_EVENT_TEXT, MIN_HEX_PAYLOAD).unwrap();
        let sampler = ThroughputSampler::new(
            FixedCounters(counters.iter().copied().collect()),
            config.rate_sample_batches,
        );
        (
            CaptureLoop::new(source, formatter, Arc::clone(&system), sampler, config),
            system,
        )
    }

    #[test]
    fn encrypted_frame_yields_two_events() {
        let frame = tcp_frame(REMOTE, LOCAL, 443, 51514, &[0x17; 48]);
        let (mut capture, system) = capture_loop(
            ScriptedSource::with([Step::Frame(frame)]),
            &[],
            &CaptureConfig::default(),
        );

        assert_eq!(capture.run_batch(Instant::now()).unwrap(), 1);
        assert_eq!(system.stats().packets_captured, 1);
        assert_eq!(system.queue().len(), 2);

        let meta = system.queue().pop().unwrap();
        assert_eq!(meta.text(), "TCP 151.101.1.69:443 > 192.168.1.10:51514");
        assert!(meta.is_inbound());
        assert_eq!(system.queue().pop().unwrap().zone(), Zone::HexPayload);
    }

    #[test]
    fn cleartext_frame_yields_one_event() {
        let frame = tcp_frame(LOCAL, REMOTE, 40000, 80, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        let (mut capture, system) = capture_loop(
            ScriptedSource::with([Step::Frame(frame)]),
            &[],
            &CaptureConfig::default(),
        );

        capture.run_batch(Instant::now()).unwrap();
        assert_eq!(system.queue().len(), 1);
        let meta = system.queue().pop().unwrap();
        assert!(!meta.is_inbound());
        assert_eq!(meta.zone(), Zone::Cleartext);
    }

    #[test]
    fn rejected_frames_are_counted_not_queued() {
        let (mut capture, system) = capture_loop(
            ScriptedSource::with([Step::Frame(vec![0u8; 10])]),
            &[],
            &CaptureConfig::default(),
        );

        capture.run_batch(Instant::now()).unwrap();
        assert_eq!(system.metrics().frames_captured.get(), 1);
        assert_eq!(system.metrics().frames_rejected.get(), 1);
        assert!(system.queue().is_empty());
    }

    #[test]
    fn batch_is_bounded() {
        let frames = (0..100).map(|i| Step::Frame(tcp_frame(LOCAL, REMOTE, 40000 + i, 80, &[])));
        let config = CaptureConfig {
            batch_size: 64,
            ..CaptureConfig::default()
        };
        let (mut capture, _system) = capture_loop(ScriptedSource::with(frames), &[], &config);

        let now = Instant::now();
        assert_eq!(capture.run_batch(now).unwrap(), 64);
        assert_eq!(capture.run_batch(now).unwrap(), 36);
        assert_eq!(capture.run_batch(now).unwrap(), 0);
    }

    #[test]
    fn consecutive_errors_stop_the_loop() {
        let config = CaptureConfig {
            max_consecutive_errors: 3,
            ..CaptureConfig::default()
        };
        let (mut capture, _system) = capture_loop(
            ScriptedSource::with([Step::Fail, Step::Fail, Step::Fail]),
            &[],
            &config,
        );

        let now = Instant::now();
        assert!(capture.run_batch(now).is_ok());
        assert!(capture.run_batch(now).is_ok());
        assert!(matches!(
            capture.run_batch(now),
            Err(CaptureError::TooManyErrors { count: 3, .. })
        ));
    }

    #[traced_test]
    #[test]
    fn tap_errors_are_logged() {
        let (mut capture, _system) = capture_loop(
            ScriptedSource::with([Step::Fail]),
            &[],
            &CaptureConfig::default(),
        );

        assert!(capture.run_batch(Instant::now()).is_ok());
        assert!(logs_contain("Tap read failed"));
        assert!(logs_contain("device went away"));
        assert!(logs_contain("consecutive=1"));
    }

    #[test]
    fn a_good_frame_resets_the_error_streak() {
        let config = CaptureConfig {
            max_consecutive_errors: 2,
            ..CaptureConfig::default()
        };
        let frame = tcp_frame(LOCAL, REMOTE, 40000, 53, &[]);
        let (mut capture, _system) = capture_loop(
            ScriptedSource::with([Step::Fail, Step::Frame(frame), Step::Fail]),
            &[],
            &config,
        );

        let now = Instant::now();
        for _ in 0..4 {
            assert!(capture.run_batch(now).is_ok());
        }
    }

    #[test]
    fn throughput_lands_in_stats() {
        let config = CaptureConfig {
            rate_sample_batches: 1,
            ..CaptureConfig::default()
        };
        let (mut capture, system) =
            capture_loop(ScriptedSource::default(), &[10_000, 14_000], &config);

        let t0 = Instant::now();
        capture.run_batch(t0).unwrap();
        assert_eq!(system.stats().bytes_per_sec, 0);
        capture.run_batch(t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(system.stats().bytes_per_sec, 2_000);
    }

    #[test]
    fn run_returns_once_shutdown_is_set() {
        let (capture, system) =
            capture_loop(ScriptedSource::default(), &[], &CaptureConfig::default());
        system.request_shutdown();
        assert_eq!(capture.run().unwrap(), CaptureReport::default());
    }

    #[test]
    fn run_drains_until_shutdown() {
        let frames = (0..10).map(|i| Step::Frame(tcp_frame(REMOTE, LOCAL, 443, 50000 + i, &[])));
        let (capture, system) =
            capture_loop(ScriptedSource::with(frames), &[], &CaptureConfig::default());

        let handle = {
            let system = Arc::clone(&system);
            thread::spawn(move || {
                while system.stats().packets_captured < 10 {
                    thread::sleep(Duration::from_millis(1));
                }
                system.request_shutdown();
            })
        };

        let report = capture.run().unwrap();
        handle.join().unwrap();
        assert_eq!(report.frames, 10);
        assert_eq!(system.queue().len(), 10);
    }
}
