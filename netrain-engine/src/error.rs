use std::io;

use thiserror::Error;

use netrain_core::CoreError;

use crate::display::DisplayError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid grid {columns}x{rows}: both dimensions must be non-zero")]
    InvalidGeometry { columns: usize, rows: usize },

    #[error("Invalid stream settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to allocate {0}")]
    Allocation(String),

    #[error("Failed to start capture thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("Capture thread panicked")]
    CapturePanicked,

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
