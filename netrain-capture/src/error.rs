use std::io;
use std::path::PathBuf;

use thiserror::Error;

use netrain_core::CoreError;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture device error: {0}")]
    Pcap(#[from] pcap::Error),

    #[error("Failed to apply capture filter '{filter}': {source}")]
    Filter {
        filter: String,
        #[source]
        source: pcap::Error,
    },

    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("Tap read failed: {0}")]
    Tap(String),

    #[error("Tap failed {count} consecutive times, last error: {last}")]
    TooManyErrors { count: u32, last: String },

    #[error("Failed to read interface counters from {path}: {source}")]
    CounterRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed interface counters: {0}")]
    CounterFormat(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
