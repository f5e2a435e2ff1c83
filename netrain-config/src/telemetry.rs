//! Observability configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Telemetry configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TelemetryConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[validate(custom(function = validation::validate_log_level))]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Print the Prometheus text export on exit.
    #[serde(default)]
    pub dump_metrics: bool,

    /// Ticks between headless snapshot log lines.
    #[validate(range(min = 1))]
    #[serde(default = "default_snapshot_every")]
    pub snapshot_log_every: u64,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_snapshot_every() -> u64 {
    50
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dump_metrics: false,
            snapshot_log_every: default_snapshot_every(),
        }
    }
}
