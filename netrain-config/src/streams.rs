//! Stream engine configuration.
//!
//! Pool sizing, column spacing and the random ranges each stream draws from.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct StreamsConfig {
    /// Maximum concurrently animated streams.
    #[validate(range(min = 1, max = 65536))]
    #[serde(default = "default_max_streams")]
    pub max_streams: usize,

    /// Characters of an event a stream can show.
    #[validate(range(min = 1, max = 255))]
    #[serde(default = "default_max_stream_length")]
    pub max_stream_length: usize,

    /// Slowest fall speed (rows per tick).
    #[validate(range(min = 0.01, max = 16.0))]
    #[serde(default = "default_speed_min")]
    pub speed_min: f32,

    /// Width of the speed range above `speed_min`.
    #[validate(range(min = 0.0, max = 16.0))]
    #[serde(default = "default_speed_range")]
    pub speed_range: f32,

    /// Earliest tick at which an active stream starts fading.
    #[validate(range(min = 1, max = 100_000))]
    #[serde(default = "default_fade_delay_min")]
    pub fade_delay_min: u32,

    /// Width of the fade deadline range above `fade_delay_min`.
    #[validate(range(max = 100_000))]
    #[serde(default = "default_fade_delay_range")]
    pub fade_delay_range: u32,

    /// Characters removed per tick while fading.
    #[validate(range(min = 1, max = 255))]
    #[serde(default = "default_fade_rate")]
    pub fade_rate: u32,

    /// Free columns required on each side of a new stream.
    #[validate(range(max = 16))]
    #[serde(default = "default_column_gap")]
    pub column_gap: usize,

    /// Events pulled from the queue per tick.
    #[validate(range(min = 1, max = 10_000))]
    #[serde(default = "default_events_per_tick")]
    pub events_per_tick: usize,

    /// Random column probes before falling back to a linear scan.
    #[validate(range(max = 10_000))]
    #[serde(default = "default_column_search_attempts")]
    pub column_search_attempts: usize,
}

fn default_max_streams() -> usize {
    512
}

fn default_max_stream_length() -> usize {
    160
}

fn default_speed_min() -> f32 {
    0.4
}

fn default_speed_range() -> f32 {
    1.5
}

fn default_fade_delay_min() -> u32 {
    30
}

fn default_fade_delay_range() -> u32 {
    120
}

fn default_fade_rate() -> u32 {
    2
}

fn default_column_gap() -> usize {
    1
}

fn default_events_per_tick() -> usize {
    20
}

fn default_column_search_attempts() -> usize {
    40
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            max_streams: default_max_streams(),
            max_stream_length: default_max_stream_length(),
            speed_min: default_speed_min(),
            speed_range: default_speed_range(),
            fade_delay_min: default_fade_delay_min(),
            fade_delay_range: default_fade_delay_range(),
            fade_rate: default_fade_rate(),
            column_gap: default_column_gap(),
            events_per_tick: default_events_per_tick(),
            column_search_attempts: default_column_search_attempts(),
        }
    }
}
