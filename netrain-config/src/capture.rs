// netrain-config/src/capture.rs
//! Packet capture configuration.
//!
//! Parameters for the live tap, local-address discovery and throughput sampling.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Packet capture configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CaptureConfig {
    /// Network interface to capture on; empty selects the busiest interface.
    #[validate(custom(function = validation::validate_interface))]
    #[serde(default)]
    pub interface: String,

    /// Run in promiscuous mode?
    #[serde(default)]
    pub promiscuous: bool,

    /// Snapshot length in bytes.
    #[validate(range(min = 64, max = 65535))]
    #[serde(default = "default_snaplen")]
    pub snaplen: i32,

    /// Read timeout handed to the capture handle (milliseconds).
    #[validate(range(min = 1, max = 5000))]
    #[serde(default = "default_timeout")]
    pub timeout_ms: i32,

    /// Capture filter applied before frames reach userspace.
    #[validate(custom(function = validation::validate_filter))]
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Frames drained per loop iteration.
    #[validate(range(min = 1, max = 4096))]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Sleep when a batch came back empty (microseconds).
    #[validate(range(min = 1, max = 1_000_000))]
    #[serde(default = "default_idle_backoff")]
    pub idle_backoff_us: u64,

    /// Throughput is resampled every this many batches (and at most once per second).
    #[validate(range(min = 1, max = 1_000_000))]
    #[serde(default = "default_rate_sample_batches")]
    pub rate_sample_batches: u64,

    /// Consecutive tap errors tolerated before the loop gives up.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_errors")]
    pub max_consecutive_errors: u32,

    /// Upper bound on the local-address registry.
    #[validate(range(min = 1, max = 64))]
    #[serde(default = "default_max_local")]
    pub max_local_addresses: usize,

    /// Extra addresses treated as local, on top of the interface's own.
    #[validate(length(max = 64))]
    #[serde(default)]
    pub local_addresses: Vec<Ipv4Addr>,

    /// Source of per-interface byte counters.
    #[serde(default = "default_proc_net_dev")]
    pub proc_net_dev: String,
}

fn default_snaplen() -> i32 {
    1500
}

fn default_timeout() -> i32 {
    100
}

fn default_filter() -> String {
    "ip".into()
}

fn default_batch_size() -> usize {
    64
}

fn default_idle_backoff() -> u64 {
    1000
}

fn default_rate_sample_batches() -> u64 {
    20
}

fn default_max_errors() -> u32 {
    100
}

fn default_max_local() -> usize {
    8
}

fn default_proc_net_dev() -> String {
    "/proc/net/dev".into()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: String::new(),
            promiscuous: false,
            snaplen: default_snaplen(),
            timeout_ms: default_timeout(),
            filter: default_filter(),
            batch_size: default_batch_size(),
            idle_backoff_us: default_idle_backoff(),
            rate_sample_batches: default_rate_sample_batches(),
            max_consecutive_errors: default_max_errors(),
            max_local_addresses: default_max_local(),
            local_addresses: Vec::new(),
            proc_net_dev: default_proc_net_dev(),
        }
    }
}
