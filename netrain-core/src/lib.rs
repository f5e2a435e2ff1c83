//! # netrain-core
//!
//! Foundation layer between the capture thread and the stream engine.
//!
//! ### Key Submodules:
//! - `events`: display events, colour tags and the overwrite-on-full event queue
//! - `format`: turns classified frames into display events
//! - `registry`: addresses considered local to the host
//! - `system`: the shared handle both threads hold
//!
//! The hot path (classify → format → push) performs no heap allocation: events are
//! fixed-size records and the queue is preallocated.

pub mod error;
pub mod events;
pub mod format;
pub mod registry;
pub mod system;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::format::*;
    pub use crate::registry::*;
    pub use crate::system::*;
}

pub use error::CoreError;
