//! Sensor capabilities read once per control cycle.
//!
//! Reads are infallible: a driver always hands back its latest value, and a
//! missing or garbage reading is indistinguishable from a valid low one.

use ringside_types::{ProximityCounts, RawAcceleration};

/// Number of downward-facing reflectance sensors in the border array.
pub const BORDER_SENSOR_COUNT: usize = 5;

/// One reading of the border array, leftmost sensor first.
pub type BorderCounts = [u16; BORDER_SENSOR_COUNT];

/// Downward-facing line sensor array that sees the ring's edge.
pub trait BorderSensor: Send {
    /// Sample every sensor in the array.  Lower counts mean a more
    /// reflective (whiter) surface.
    fn read(&mut self) -> BorderCounts;
}

/// Directional short-range proximity array.
pub trait ProximitySensor: Send {
    /// Run one emitter/detector sweep and return the four counts.
    fn read(&mut self) -> ProximityCounts;
}

/// Low-level 2-axis accelerometer.
///
/// The sensor refreshes more slowly than the loop polls it, so consecutive
/// reads frequently return the same frame.
pub trait Accelerometer: Send {
    fn read_raw(&mut self) -> RawAcceleration;
}

/// Monotonic millisecond clock with a blocking delay.
pub trait Clock: Send {
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBorder(BorderCounts);

    impl BorderSensor for FixedBorder {
        fn read(&mut self) -> BorderCounts {
            self.0
        }
    }

    struct StepClock {
        now: u64,
    }

    impl Clock for StepClock {
        fn now_ms(&self) -> u64 {
            self.now
        }

        fn delay_ms(&mut self, ms: u64) {
            self.now += ms;
        }
    }

    #[test]
    fn border_sensor_reads_leftmost_first() {
        let mut sensor = FixedBorder([100, 2000, 2000, 2000, 2000]);
        let counts = sensor.read();
        assert_eq!(counts.len(), BORDER_SENSOR_COUNT);
        assert_eq!(counts[0], 100);
    }

    #[test]
    fn clock_delay_advances_time() {
        let mut clock = StepClock { now: 10 };
        clock.delay_ms(250);
        assert_eq!(clock.now_ms(), 260);
    }
}
