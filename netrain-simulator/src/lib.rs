//! # Netrain Simulator
//!
//! A deterministic stand-in for the live tap. [`SyntheticTap`] implements the capture
//! crate's `FrameSource`, so the whole pipeline can run without privileges or a network,
//! and [`TapCounters`] feeds the throughput sampler from the bytes it emitted.

pub mod frames;
pub mod tap;

pub use tap::{SyntheticTap, TapCounters, MAX_PAYLOAD};
