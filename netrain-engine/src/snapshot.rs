//! Read-only view of the stream pool handed to the renderer each tick.

use netrain_core::events::ColorTag;
use netrain_core::system::Stats;

use crate::stream::{Stream, StreamState};

/// Everything a renderer needs for one tick.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub tick: u64,
    pub streams: Snapshot<'a>,
    pub stats: Stats,
}

#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    streams: &'a [Stream],
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(streams: &'a [Stream]) -> Self {
        Self { streams }
    }

    /// Non-empty streams in slot order.
    pub fn iter(&self) -> impl Iterator<Item = StreamView<'a>> + 'a {
        self.streams
            .iter()
            .filter(|s| !s.is_empty())
            .map(StreamView::from)
    }

    pub fn len(&self) -> usize {
        self.streams.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.iter().all(Stream::is_empty)
    }
}

/// One visible stream: the trailing characters ending at `head_row` in `column`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamView<'a> {
    pub column: usize,
    pub head_row: i32,
    pub text: &'a [u8],
    pub colors: &'a [ColorTag],
    pub fading: bool,
}

impl<'a> From<&'a Stream> for StreamView<'a> {
    fn from(stream: &'a Stream) -> Self {
        Self {
            column: stream.column(),
            head_row: stream.head_row(),
            text: stream.visible_text(),
            colors: stream.visible_colors(),
            fading: stream.state() == StreamState::Fading,
        }
    }
}

impl StreamView<'_> {
    /// `(row, character, colour)` for each visible character, top to bottom.
    ///
    /// Rows may fall outside the grid; the renderer clips them.
    pub fn cells(&self) -> impl Iterator<Item = (i32, u8, ColorTag)> + '_ {
        let top = self.head_row - self.text.len() as i32 + 1;
        self.text
            .iter()
            .zip(self.colors)
            .enumerate()
            .map(move |(i, (ch, color))| (top + i as i32, *ch, *color))
    }

    pub fn text_str(&self) -> &str {
        std::str::from_utf8(self.text).unwrap_or_default()
    }
}
