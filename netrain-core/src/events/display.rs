//! Display event records.

use std::fmt;

/// Longest text a display event can carry.
pub const MAX_EVENT_TEXT: usize = 255;

/// Per-character colour tags shared with the renderer.
///
/// The numeric values are stable so renderers can index a palette directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorTag {
    SrcIp = 1,
    DstIp = 2,
    Port = 3,
    Proto = 4,
    Arrow = 5,
    Head = 6,
    Fading = 7,
    Hex = 8,
    Inbound = 9,
    Outbound = 10,
}

impl ColorTag {
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Colour used for every character of a flow in the given direction.
    #[inline]
    pub fn for_direction(is_inbound: bool) -> Self {
        if is_inbound {
            ColorTag::Inbound
        } else {
            ColorTag::Outbound
        }
    }
}

/// Layout hint for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Zone {
    MetaEncrypted,
    HexPayload,
    Cleartext,
}

/// A bounded run of coloured ASCII text derived from one classified frame.
///
/// Fields are private so an event cannot change after it leaves the formatter.
#[derive(Clone)]
pub struct DisplayEvent {
    text: [u8; MAX_EVENT_TEXT],
    colors: [ColorTag; MAX_EVENT_TEXT],
    len: usize,
    limit: usize,
    is_encrypted: bool,
    is_inbound: bool,
    zone: Zone,
}

impl DisplayEvent {
    /// Creates an empty event that accepts at most `limit` characters.
    pub(crate) fn empty(limit: usize, zone: Zone, is_encrypted: bool, is_inbound: bool) -> Self {
        Self {
            text: [b' '; MAX_EVENT_TEXT],
            colors: [ColorTag::for_direction(is_inbound); MAX_EVENT_TEXT],
            len: 0,
            limit: limit.min(MAX_EVENT_TEXT),
            is_encrypted,
            is_inbound,
            zone,
        }
    }

    /// Builds an event from arbitrary text, coloured uniformly.
    ///
    /// Non-ASCII characters become `?`; text beyond [`MAX_EVENT_TEXT`] is dropped.
    /// Returns `None` for empty text, since empty events are never queued.
    pub fn from_text(
        text: &str,
        color: ColorTag,
        zone: Zone,
        is_encrypted: bool,
        is_inbound: bool,
    ) -> Option<Self> {
        let mut event = Self::empty(MAX_EVENT_TEXT, zone, is_encrypted, is_inbound);
        for ch in text.chars() {
            let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
            if !event.push(byte, color) {
                break;
            }
        }
        (!event.is_empty()).then_some(event)
    }

    /// Appends one character; false once the limit is reached.
    #[inline]
    pub(crate) fn push(&mut self, byte: u8, color: ColorTag) -> bool {
        if self.len >= self.limit {
            return false;
        }
        self.text[self.len] = byte;
        self.colors[self.len] = color;
        self.len += 1;
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn text_bytes(&self) -> &[u8] {
        &self.text[..self.len]
    }

    /// Text as a string slice; always ASCII.
    pub fn text(&self) -> &str {
        std::str::from_utf8(self.text_bytes()).unwrap_or_default()
    }

    #[inline]
    pub fn colors(&self) -> &[ColorTag] {
        &self.colors[..self.len]
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    #[inline]
    pub fn is_inbound(&self) -> bool {
        self.is_inbound
    }

    #[inline]
    pub fn zone(&self) -> Zone {
        self.zone
    }
}

impl fmt::Debug for DisplayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayEvent")
            .field("text", &self.text())
            .field("is_encrypted", &self.is_encrypted)
            .field("is_inbound", &self.is_inbound)
            .field("zone", &self.zone)
            .finish()
    }
}

impl PartialEq for DisplayEvent {
    fn eq(&self, other: &Self) -> bool {
        self.text_bytes() == other.text_bytes()
            && self.colors() == other.colors()
            && self.is_encrypted == other.is_encrypted
            && self.is_inbound == other.is_inbound
            && self.zone == other.zone
    }
}

impl Eq for DisplayEvent {}

/// Truncating writer so `write!` can format straight into the fixed buffer.
pub(crate) struct EventWriter<'a> {
    pub(crate) event: &'a mut DisplayEvent,
    pub(crate) color: ColorTag,
}

impl fmt::Write for EventWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if !self.event.push(byte, self.color) {
                break;
            }
        }
        Ok(())
    }
}
