//! Terminal-less display used by both commands.
//!
//! Waits by sleeping, never resizes, and logs a text rendering of the grid every
//! `log_every` frames.

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use netrain_engine::{Display, DisplayError, Frame, Geometry};

pub struct HeadlessDisplay {
    geometry: Geometry,
    log_every: u64,
    frames: u64,
}

impl HeadlessDisplay {
    pub fn new(geometry: Geometry, log_every: u64) -> Self {
        Self {
            geometry,
            log_every: log_every.max(1),
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Rasterises a frame into one string per grid row; empty cells are spaces.
pub fn rasterize(frame: &Frame<'_>, geometry: Geometry) -> Vec<String> {
    let mut grid = vec![vec![b' '; geometry.columns]; geometry.rows];
    for stream in frame.streams.iter() {
        if stream.column >= geometry.columns {
            continue;
        }
        for (row, ch, _) in stream.cells() {
            if let Some(line) = usize::try_from(row).ok().and_then(|r| grid.get_mut(r)) {
                line[stream.column] = ch;
            }
        }
    }
    grid.into_iter()
        .map(|line| String::from_utf8_lossy(&line).into_owned())
        .collect()
}

impl Display for HeadlessDisplay {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn wait(&mut self, timeout: Duration) -> Result<(), DisplayError> {
        thread::sleep(timeout);
        Ok(())
    }

    fn take_resize(&mut self) -> Option<Geometry> {
        None
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), DisplayError> {
        self.frames += 1;
        if self.frames % self.log_every != 0 {
            return Ok(());
        }

        info!(
            tick = frame.tick,
            streams = frame.streams.len(),
            stats = %frame.stats,
            "Frame"
        );
        for (row, line) in rasterize(frame, self.geometry).iter().enumerate() {
            debug!(row, "{}", line.trim_end());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netrain_config::StreamsConfig;
    use netrain_core::events::{ColorTag, DisplayEvent, EventQueue, Zone};
    use netrain_core::system::Stats;
    use netrain_engine::StreamEngine;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use tracing_test::traced_test;

    fn engine_with(text: &str, ticks: usize) -> StreamEngine<SmallRng> {
        let config = StreamsConfig {
            speed_min: 1.0,
            speed_range: 0.0,
            fade_delay_min: 1000,
            fade_delay_range: 0,
            ..StreamsConfig::default()
        };
        let mut engine =
            StreamEngine::new(&config, Geometry::new(10, 6), SmallRng::seed_from_u64(3)).unwrap();
        let queue = EventQueue::with_capacity(4).unwrap();
        queue.push(
            DisplayEvent::from_text(text, ColorTag::Outbound, Zone::Cleartext, false, false).unwrap(),
        );
        for _ in 0..ticks {
            engine.tick(&queue);
        }
        engine
    }

    #[test]
    fn rasterize_draws_trailing_text_ending_at_head() {
        let engine = engine_with("ABCDEFGH", 3);
        let frame = Frame {
            tick: 3,
            streams: engine.snapshot(),
            stats: Stats::default(),
        };
        let column = engine.snapshot().iter().next().unwrap().column;

        let rows = rasterize(&frame, Geometry::new(10, 6));
        assert_eq!(rows.len(), 6);
        let painted: String = rows
            .iter()
            .map(|row| row.as_bytes()[column] as char)
            .filter(|c| *c != ' ')
            .collect();
        assert_eq!(painted, "FGH");
        assert_eq!(rows[0].trim(), "");
    }

    #[traced_test]
    #[test]
    fn logs_every_nth_frame() {
        let engine = engine_with("UDP 10.0.0.1:53 > 10.0.0.2:40000", 2);
        let frame = Frame {
            tick: 2,
            streams: engine.snapshot(),
            stats: Stats::default(),
        };
        let mut display = HeadlessDisplay::new(Geometry::new(10, 6), 2);

        display.render(&frame).unwrap();
        assert!(!logs_contain("Frame"));
        display.render(&frame).unwrap();
        assert!(logs_contain("Frame"));
        assert_eq!(display.frames(), 2);
    }
}
