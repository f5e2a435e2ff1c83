//! # netrain-engine
//!
//! Turns queued display events into animated streams and paces the main loop.
//!
//! ### Key Submodules:
//! - `engine`: the stream pool, spawning and the per-tick state machine
//! - `columns`: column allocation with a spacing rule
//! - `scheduler`: fixed-rate ticks without catch-up
//! - `display`: the rendering collaborator trait
//! - `runtime`: capture thread plus tick/render loop

pub mod columns;
pub mod display;
pub mod engine;
pub mod error;
pub mod runtime;
pub mod scheduler;
pub mod snapshot;
pub mod stream;

pub use display::{Display, DisplayError, Geometry};
pub use engine::{EngineStats, StreamEngine, TickSummary};
pub use error::EngineError;
pub use runtime::{RunSummary, Runtime};
pub use scheduler::TickScheduler;
pub use snapshot::{Frame, Snapshot, StreamView};
pub use stream::{Stream, StreamState};
