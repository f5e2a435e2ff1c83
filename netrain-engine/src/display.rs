//! The rendering collaborator the runtime drives.
//!
//! Pixel drawing, glyph rasterisation and display-server negotiation live behind this
//! trait; the runtime only waits on it, polls it for geometry changes, and hands it frames.

use std::time::Duration;

use thiserror::Error;

use crate::snapshot::Frame;

/// Grid size in character cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub columns: usize,
    pub rows: usize,
}

impl Geometry {
    pub const fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Display connection lost: {0}")]
    Disconnected(String),

    #[error("Render failed: {0}")]
    Render(String),
}

pub trait Display {
    /// Current grid size.
    fn geometry(&self) -> Geometry;

    /// Services display traffic for at most `timeout`.
    fn wait(&mut self, timeout: Duration) -> Result<(), DisplayError>;

    /// A pending geometry change, if the display was reconfigured since the last call.
    fn take_resize(&mut self) -> Option<Geometry>;

    /// Draws one frame. Only called when at least one stream is visible.
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), DisplayError>;
}
