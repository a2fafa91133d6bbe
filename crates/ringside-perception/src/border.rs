//! Ring-edge detection from the outermost border sensors.

use ringside_hal::{BORDER_SENSOR_COUNT, BorderCounts};
use ringside_types::Side;

/// Compares the leftmost and rightmost border sensors against a threshold.
#[derive(Debug, Clone, Copy)]
pub struct BorderCheck {
    threshold: u16,
}

impl BorderCheck {
    pub fn new(threshold: u16) -> Self {
        Self { threshold }
    }

    /// Which side sees the edge line, if any.
    ///
    /// A reading strictly below the threshold is the (reflective) line.  The
    /// leftmost sensor is checked first, so it wins when both see the line.
    pub fn edge(&self, counts: &BorderCounts) -> Option<Side> {
        if counts[0] < self.threshold {
            Some(Side::Left)
        } else if counts[BORDER_SENSOR_COUNT - 1] < self.threshold {
            Some(Side::Right)
        } else {
            None
        }
    }
}
