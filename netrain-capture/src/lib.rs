//! netrain-capture
//!
//! Feeds the event queue from a network tap.
//! The live tap is pcap-backed; anything implementing [`FrameSource`] can stand in for it.

pub mod capture;
pub mod error;
pub mod interface;
pub mod source;
pub mod throughput;

pub use capture::{CaptureLoop, CaptureReport};
pub use error::CaptureError;
pub use interface::{
    build_registry, interface_addresses, select_interface, CounterSource, ProcNetDev,
};
pub use source::{FrameSource, PcapTap};
pub use throughput::ThroughputSampler;
