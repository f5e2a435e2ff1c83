//! # Netrain Telemetry
//!
//! Crate for logging and metrics functionalities.

pub mod logging;
pub mod metrics;

pub use logging::{EventLogger, TelemetryError};
pub use metrics::{DropReason, MetricsRecorder};
