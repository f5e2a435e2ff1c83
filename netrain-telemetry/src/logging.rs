//! ## netrain-telemetry::logging
//! **Structured logging with `tracing`**
//!
//! `RUST_LOG` wins over the configured default level.

use std::fmt;

use thiserror::Error;
use tracing::info_span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("failed to install global subscriber: {0}")]
    Subscriber(String),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global fmt subscriber.
    pub fn init(default_level: &str) -> Result<(), TelemetryError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(default_level).map_err(|e| {
                TelemetryError::InvalidFilter {
                    filter: default_level.to_string(),
                    reason: e.to_string(),
                }
            })?,
        };

        subscriber_fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE)
            .try_init()
            .map_err(|e| TelemetryError::Subscriber(e.to_string()))
    }

    /// Emits a lifecycle event (startup, interface selection, shutdown summary) inside
    /// its own span so it can be filtered apart from per-tick noise.
    #[inline]
    pub fn log_event(event_type: &str, detail: &dyn fmt::Display) {
        let span = info_span!("netrain_event", event_type = event_type);
        let _guard = span.enter();
        tracing::info!(detail = %detail, "Lifecycle event");
    }
}
