use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{info, warn};

use netrain_capture::{
    build_registry, interface_addresses, select_interface, CaptureLoop, CounterSource,
    FrameSource, PcapTap, ProcNetDev, ThroughputSampler,
};
use netrain_config::NetrainConfig;
use netrain_core::format::EventFormatter;
use netrain_core::registry::LocalAddressRegistry;
use netrain_core::system::CaptureSystem;
use netrain_engine::{Geometry, RunSummary, Runtime, StreamEngine};
use netrain_simulator::SyntheticTap;
use netrain_telemetry::{EventLogger, MetricsRecorder};

use crate::headless::HeadlessDisplay;

#[derive(Parser)]
#[command(name = "netrain", version, about)]
pub struct Cli {
    /// Configuration file layered over the defaults.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture live traffic from a network interface
    Run(RunArgs),
    /// Drive the pipeline from a seeded synthetic tap
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GridArgs {
    /// Grid width in character cells
    #[arg(long, default_value_t = 160)]
    pub width: usize,
    /// Grid height in character cells
    #[arg(long, default_value_t = 48)]
    pub height: usize,
    /// Stop after this many ticks
    #[arg(long)]
    pub ticks: Option<u64>,
}

impl GridArgs {
    fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Interface to capture on; the busiest one when omitted
    #[arg(short, long)]
    pub interface: Option<String>,

    #[command(flatten)]
    pub grid: GridArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Seed for the synthetic tap, overriding the configured one
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub grid: GridArgs,
}

pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<NetrainConfig> {
    let config = match path {
        Some(path) => NetrainConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NetrainConfig::load().context("loading configuration")?,
    };
    Ok(config)
}

/// Live capture on a real interface.
pub fn run_live(args: RunArgs, config: NetrainConfig) -> anyhow::Result<()> {
    let interface = match args.interface {
        Some(name) => name,
        None => select_interface(&config.capture),
    };
    EventLogger::log_event("interface_selected", &interface);

    let discovered = match interface_addresses(&interface) {
        Ok(addrs) => addrs,
        Err(e) => {
            warn!(error = %e, interface = %interface, "No interface addresses, using configured ones only");
            Vec::new()
        }
    };
    let registry = build_registry(discovered, &config.capture);
    if registry.is_empty() {
        warn!("Local address registry is empty; all traffic will show as outbound");
    }

    let tap = PcapTap::open(&interface, &config.capture)
        .with_context(|| format!("opening capture on {interface}"))?;
    let counters = ProcNetDev::new(&config.capture.proc_net_dev, interface.as_str());

    run_pipeline(tap, counters, registry, &args.grid, &config)
}

/// The full pipeline fed by the synthetic tap.
pub fn run_simulation(args: SimulateArgs, mut config: NetrainConfig) -> anyhow::Result<()> {
    if let Some(seed) = args.seed {
        config.simulator.seed = seed;
    }
    EventLogger::log_event("simulation_seed", &config.simulator.seed);

    let tap = SyntheticTap::new(&config.simulator);
    let counters = tap.counters();
    let registry = build_registry([tap.local_address()], &config.capture);

    run_pipeline(tap, counters, registry, &args.grid, &config)
}

fn run_pipeline<S, C>(
    tap: S,
    counters: C,
    registry: LocalAddressRegistry,
    grid: &GridArgs,
    config: &NetrainConfig,
) -> anyhow::Result<()>
where
    S: FrameSource + Send + 'static,
    C: CounterSource + Send + 'static,
{
    let metrics = Arc::new(MetricsRecorder::new().context("creating metrics registry")?);
    let system = Arc::new(CaptureSystem::new(config.queue.capacity, Arc::clone(&metrics))?);

    let shutdown = Arc::clone(&system);
    ctrlc::set_handler(move || shutdown.request_shutdown())
        .context("installing interrupt handler")?;

    let formatter = EventFormatter::new(
        registry,
        config.formatter.max_text_len,
        config.formatter.min_hex_payload,
    )?;
    let sampler = ThroughputSampler::new(counters, config.capture.rate_sample_batches);
    let capture = CaptureLoop::new(tap, formatter, Arc::clone(&system), sampler, &config.capture);

    let engine = StreamEngine::new(&config.streams, grid.geometry(), SmallRng::from_os_rng())?
        .with_metrics(Arc::clone(&metrics));
    let mut runtime = Runtime::new(
        engine,
        Arc::clone(&system),
        Duration::from_millis(config.scheduler.tick_interval_ms),
    );
    if let Some(ticks) = grid.ticks {
        runtime = runtime.with_max_ticks(ticks);
    }

    let mut display = HeadlessDisplay::new(grid.geometry(), config.telemetry.snapshot_log_every);
    let summary = runtime.run(capture, &mut display)?;
    report(&summary);

    if config.telemetry.dump_metrics {
        println!("{}", metrics.gather_metrics()?);
    }
    if let Some(e) = summary.capture_error {
        return Err(e).context("capture stopped");
    }
    Ok(())
}

fn report(summary: &RunSummary) {
    info!(
        ticks = summary.ticks,
        frames = summary.frames_rendered,
        packets = summary.packets_captured,
        rejected = summary.frames_rejected,
        evicted = summary.events_evicted,
        spawned = summary.engine.spawned,
        dropped_no_column = summary.engine.dropped_no_column,
        dropped_no_slot = summary.engine.dropped_no_slot,
        "Shutdown summary"
    );
}
