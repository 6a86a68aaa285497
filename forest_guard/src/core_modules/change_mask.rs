// THEORY:
// The `ChangeMask` is the spatial output of a single comparison: one boolean per pixel,
// true where the two aligned frames disagree by more than the sensitivity threshold.
// It is an ephemeral intermediate. It is built, read (for painting the highlight and
// for counting), and dropped within one estimation call.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::smart_pixel::smart_pixel::{ChangeMagnitude, SmartPixel};

/// Per-pixel changed/unchanged flags for two aligned frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
    changed: u64,
}

impl ChangeMask {
    /// Compares two frames of identical dimensions pixel by pixel.
    ///
    /// # Panics
    /// Panics if the frames differ in size. Callers resample both frames to a
    /// common target first.
    pub fn between(before: &Frame, after: &Frame, threshold: ChangeMagnitude) -> Self {
        assert_eq!(
            before.dimensions(),
            after.dimensions(),
            "frames must be resampled to a common size before comparison"
        );
        let (width, height) = after.dimensions();

        let cells: Vec<bool> = before
            .pixels()
            .zip(after.pixels())
            .map(|(b, a)| SmartPixel::new(b).has_changed(&SmartPixel::new(a), threshold))
            .collect();
        let changed = cells.iter().filter(|&&c| c).count() as u64;

        Self {
            width,
            height,
            cells,
            changed,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Flag at `(x, y)`, or `None` outside the mask.
    pub fn is_changed(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.cells.get(index).copied()
    }

    /// Row-major flags, aligned with `Frame::pixels`.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn changed_count(&self) -> u64 {
        self.changed
    }

    pub fn total_count(&self) -> u64 {
        self.cells.len() as u64
    }

    /// Share of changed pixels, scaled to [0, 100]. Not rounded.
    pub fn changed_percent(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            return 0.0;
        }
        self.changed as f64 / total as f64 * 100.0
    }
}
