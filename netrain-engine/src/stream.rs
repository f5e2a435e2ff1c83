//! Stream slots and their per-tick state machine.
//!
//! `Empty → Active → Fading → Empty`. A stream owns one column from activation until it
//! returns to `Empty`; the engine releases the column when [`Stream::step`] reports
//! [`Step::Retired`].

use netrain_core::events::{ColorTag, DisplayEvent, MAX_EVENT_TEXT};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamState {
    #[default]
    Empty,
    Active,
    Fading,
}

/// What a tick did to one stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Idle,
    Advanced,
    StartedFading,
    Faded,
    Retired,
}

/// Launch parameters drawn by the engine when a stream is activated.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub column: usize,
    pub speed: f32,
    pub fade_at_tick: u32,
    pub max_len: usize,
}

#[derive(Clone)]
pub struct Stream {
    state: StreamState,
    column: usize,
    position: f32,
    speed: f32,
    text: [u8; MAX_EVENT_TEXT],
    colors: [ColorTag; MAX_EVENT_TEXT],
    text_len: usize,
    visible_count: i32,
    ticks_alive: u32,
    fade_at_tick: u32,
}

impl Default for Stream {
    fn default() -> Self {
        Self {
            state: StreamState::Empty,
            column: 0,
            position: 0.0,
            speed: 0.0,
            text: [b' '; MAX_EVENT_TEXT],
            colors: [ColorTag::Outbound; MAX_EVENT_TEXT],
            text_len: 0,
            visible_count: 0,
            ticks_alive: 0,
            fade_at_tick: 0,
        }
    }
}

impl Stream {
    /// Copies the event into this slot and makes it `Active` at the top of `launch.column`.
    pub(crate) fn activate(&mut self, event: &DisplayEvent, launch: Launch) {
        let len = event.len().min(launch.max_len).min(MAX_EVENT_TEXT);
        self.text[..len].copy_from_slice(&event.text_bytes()[..len]);
        self.colors[..len].copy_from_slice(&event.colors()[..len]);
        self.text_len = len;

        self.state = StreamState::Active;
        self.column = launch.column;
        self.position = 0.0;
        self.speed = launch.speed;
        self.visible_count = 0;
        self.ticks_alive = 0;
        self.fade_at_tick = launch.fade_at_tick;
    }

    /// Advances the stream by one tick on a grid `rows` tall.
    pub(crate) fn step(&mut self, rows: usize, fade_rate: i32) -> Step {
        match self.state {
            StreamState::Empty => Step::Idle,
            StreamState::Active => self.step_active(rows),
            StreamState::Fading => {
                self.visible_count -= fade_rate;
                if self.visible_count <= 0 {
                    self.visible_count = 0;
                    self.state = StreamState::Empty;
                    Step::Retired
                } else {
                    Step::Faded
                }
            }
        }
    }

    fn step_active(&mut self, rows: usize) -> Step {
        let rows = i32::try_from(rows).unwrap_or(i32::MAX);

        self.position += self.speed;
        self.ticks_alive += 1;

        let head = self.position.floor() as i32;
        self.visible_count = head.min(self.text_len as i32);

        let tail = head - self.visible_count;
        if tail <= rows && self.ticks_alive < self.fade_at_tick {
            return Step::Advanced;
        }

        self.state = StreamState::Fading;
        if self.position >= rows as f32 {
            self.visible_count -= head - (rows - 1);
            self.position = (rows - 1).max(0) as f32;
            self.visible_count = self.visible_count.max(1);
        }
        Step::StartedFading
    }

    #[inline]
    pub fn state(&self) -> StreamState {
        self.state
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state == StreamState::Empty
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn visible_count(&self) -> i32 {
        self.visible_count
    }

    pub fn ticks_alive(&self) -> u32 {
        self.ticks_alive
    }

    pub fn fade_at_tick(&self) -> u32 {
        self.fade_at_tick
    }

    /// Row of the leading character.
    #[inline]
    pub fn head_row(&self) -> i32 {
        self.position.floor() as i32
    }

    pub fn text(&self) -> &[u8] {
        &self.text[..self.text_len]
    }

    /// The trailing `visible_count` characters, i.e. what is currently drawn.
    pub fn visible_text(&self) -> &[u8] {
        &self.text[self.visible_range()]
    }

    pub fn visible_colors(&self) -> &[ColorTag] {
        &self.colors[self.visible_range()]
    }

    fn visible_range(&self) -> std::ops::Range<usize> {
        let visible = usize::try_from(self.visible_count)
            .unwrap_or(0)
            .min(self.text_len);
        self.text_len - visible..self.text_len
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("state", &self.state)
            .field("column", &self.column)
            .field("position", &self.position)
            .field("speed", &self.speed)
            .field("visible_count", &self.visible_count)
            .field("ticks_alive", &self.ticks_alive)
            .field("fade_at_tick", &self.fade_at_tick)
            .field("text", &String::from_utf8_lossy(self.text()))
            .finish()
    }
}
