//! ## netrain-core::events
//! **Display events and the queue that carries them from capture to the engine**

pub mod display;
pub mod queue;

pub use display::{ColorTag, DisplayEvent, Zone, MAX_EVENT_TEXT};
pub use queue::{EventQueue, PushOutcome};
