//! Column allocation with a spacing rule.
//!
//! A column can take a new stream only when it is free and every column within `gap` on
//! either side is free too, so neighbouring streams never touch.

use rand::Rng;

use crate::error::EngineError;

/// Grids narrower than this never accept streams.
pub const MIN_COLUMNS: usize = 3;

#[derive(Clone, Debug)]
pub struct ColumnMap {
    available: Vec<bool>,
    gap: usize,
}

impl ColumnMap {
    pub fn new(width: usize, gap: usize) -> Result<Self, EngineError> {
        let mut map = Self {
            available: Vec::new(),
            gap,
        };
        map.reset(width)?;
        Ok(map)
    }

    /// Marks every column of a grid `width` wide as available.
    pub fn reset(&mut self, width: usize) -> Result<(), EngineError> {
        self.available.clear();
        self.available
            .try_reserve_exact(width)
            .map_err(|e| EngineError::Allocation(format!("column map of {width}: {e}")))?;
        self.available.resize(width, true);
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.available.len()
    }

    #[inline]
    pub fn is_available(&self, column: usize) -> bool {
        self.available.get(column).copied().unwrap_or(false)
    }

    /// Free and clear of occupied neighbours within the gap.
    pub fn is_spaced(&self, column: usize) -> bool {
        if !self.is_available(column) {
            return false;
        }
        (1..=self.gap).all(|g| {
            let left_clear = column < g || self.available[column - g];
            let right_clear = column + g >= self.width() || self.available[column + g];
            left_clear && right_clear
        })
    }

    /// Random probing first, then a linear scan for the lowest spaced column.
    pub fn find<R: Rng + ?Sized>(&self, rng: &mut R, attempts: usize) -> Option<usize> {
        let width = self.width();
        if width < MIN_COLUMNS {
            return None;
        }

        for _ in 0..attempts {
            let column = rng.random_range(0..width);
            if self.is_spaced(column) {
                return Some(column);
            }
        }

        (0..width).find(|&column| self.is_spaced(column))
    }

    #[inline]
    pub fn occupy(&mut self, column: usize) {
        if let Some(slot) = self.available.get_mut(column) {
            *slot = false;
        }
    }

    #[inline]
    pub fn release(&mut self, column: usize) {
        if let Some(slot) = self.available.get_mut(column) {
            *slot = true;
        }
    }

    pub fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        self.available
            .iter()
            .enumerate()
            .filter(|(_, free)| !**free)
            .map(|(column, _)| column)
    }
}
