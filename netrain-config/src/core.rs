//! Core pipeline parameters.
//!
//! - Event queue sizing
//! - Display event formatting
//! - Tick pacing

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Overwrite-on-full event queue between the capture thread and the engine.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct QueueConfig {
    /// Number of display events retained; the oldest is evicted on overflow.
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, max = 1048576))]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    2048
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Display event formatting.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct FormatterConfig {
    /// Maximum characters in one display event.
    #[serde(default = "default_max_text_len")]
    #[validate(range(min = 16, max = 255))]
    pub max_text_len: usize,

    /// Minimum encrypted payload size that earns a hex line.
    #[serde(default = "default_min_hex_payload")]
    #[validate(range(min = 1, max = 65535))]
    pub min_hex_payload: usize,
}

fn default_max_text_len() -> usize {
    255
}

fn default_min_hex_payload() -> usize {
    20
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            max_text_len: default_max_text_len(),
            min_hex_payload: default_min_hex_payload(),
        }
    }
}

/// Fixed-rate tick scheduler.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SchedulerConfig {
    /// Interval between simulation ticks (milliseconds).
    #[serde(default = "default_tick_interval")]
    #[validate(range(min = 1, max = 10_000))]
    pub tick_interval_ms: u64,
}

fn default_tick_interval() -> u64 {
    100
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}
