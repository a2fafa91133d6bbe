//! Smoothed accelerometer readings.
//!
//! [`AccelerationMonitor`] owns the low-level [`Accelerometer`] capability.
//! Each cycle it reads one raw frame; a frame identical to the last stored
//! sample is dropped (the sensor refreshes more slowly than the loop polls
//! it), otherwise the sample is stored and each axis is pushed into its own
//! [`RunningAverage`].
//!
//! The contact decision uses [`AccelerationMonitor::smoothed_squared_magnitude`],
//! which avoids a square root on the hot path.  The instant magnitude and
//! direction queries exist for diagnostics only.

use ringside_hal::Accelerometer;
use ringside_types::RawAcceleration;
use tracing::trace;

use crate::running_average::RunningAverage;

/// One stored (deduplicated) accelerometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelSample {
    pub timestamp_ms: u64,
    pub x: i16,
    pub y: i16,
}

/// Deduplicating, smoothing wrapper around an [`Accelerometer`].
pub struct AccelerationMonitor {
    sensor: Box<dyn Accelerometer>,
    /// Most recent frame handed to [`update`][Self::update], duplicate or not.
    current: RawAcceleration,
    /// Last distinct sample that reached the filters.
    last: Option<AccelSample>,
    avg_x: RunningAverage<i32>,
    avg_y: RunningAverage<i32>,
}

impl AccelerationMonitor {
    /// Wrap `sensor`, smoothing each axis over `window` distinct samples.
    pub fn new(sensor: Box<dyn Accelerometer>, window: usize) -> Self {
        Self {
            sensor,
            current: RawAcceleration::default(),
            last: None,
            avg_x: RunningAverage::new(window),
            avg_y: RunningAverage::new(window),
        }
    }

    /// Read one frame from the sensor and feed it to [`update`][Self::update].
    ///
    /// Returns `true` when the frame was new and reached the filters.
    pub fn read(&mut self, timestamp_ms: u64) -> bool {
        let raw = self.sensor.read_raw();
        let stored = self.update(timestamp_ms, raw.x, raw.y);
        if stored {
            trace!(
                x = raw.x,
                y = raw.y,
                len = self.instant_magnitude(),
                dir = self.instant_direction(),
                smoothed_dir = self.smoothed_direction(),
                "accelerometer sample"
            );
        }
        stored
    }

    /// Store `(x, y)` unless it repeats the last stored sample.
    ///
    /// Returns `true` when the sample was stored.
    pub fn update(&mut self, timestamp_ms: u64, x: i16, y: i16) -> bool {
        self.current = RawAcceleration { x, y };
        if let Some(last) = self.last
            && last.x == x
            && last.y == y
        {
            return false;
        }
        self.last = Some(AccelSample { timestamp_ms, x, y });
        self.avg_x.add_value(i32::from(x));
        self.avg_y.add_value(i32::from(y));
        true
    }

    /// Forget all samples, e.g. at the start of a round.
    pub fn reset(&mut self) {
        self.current = RawAcceleration::default();
        self.last = None;
        self.avg_x.clear();
        self.avg_y.clear();
    }

    pub fn last_sample(&self) -> Option<AccelSample> {
        self.last
    }

    /// `sqrt(last.x * current.x + last.y * current.y)`.
    ///
    /// Mixes the last stored sample with the most recent raw frame, so it is
    /// only a true magnitude when the two coincide.  Diagnostic use only; may
    /// be NaN when the product is negative.
    pub fn instant_magnitude(&self) -> f64 {
        let (lx, ly) = self.last_xy();
        let dot = lx * f64::from(self.current.x) + ly * f64::from(self.current.y);
        dot.sqrt()
    }

    /// `atan2(x, y)` of the last stored sample, in degrees.
    pub fn instant_direction(&self) -> f64 {
        let (lx, ly) = self.last_xy();
        lx.atan2(ly).to_degrees()
    }

    pub fn average_x(&self) -> i32 {
        self.avg_x.average()
    }

    pub fn average_y(&self) -> i32 {
        self.avg_y.average()
    }

    /// Number of samples currently held by the x and y filters.
    pub fn filter_counts(&self) -> (usize, usize) {
        (self.avg_x.count(), self.avg_y.count())
    }

    /// `avg_x² + avg_y²`.
    pub fn smoothed_squared_magnitude(&self) -> i64 {
        let x = i64::from(self.avg_x.average());
        let y = i64::from(self.avg_y.average());
        x * x + y * y
    }

    /// `atan2(avg_x, avg_y)` in degrees.
    pub fn smoothed_direction(&self) -> f64 {
        f64::from(self.avg_x.average())
            .atan2(f64::from(self.avg_y.average()))
            .to_degrees()
    }

    fn last_xy(&self) -> (f64, f64) {
        self.last
            .map(|s| (f64::from(s.x), f64::from(s.y)))
            .unwrap_or((0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed list of frames, repeating the final one.
    struct ScriptedAccel {
        frames: VecDeque<RawAcceleration>,
        last: RawAcceleration,
    }

    impl ScriptedAccel {
        fn boxed(frames: &[(i16, i16)]) -> Box<Self> {
            Box::new(Self {
                frames: frames.iter().map(|&(x, y)| RawAcceleration { x, y }).collect(),
                last: RawAcceleration::default(),
            })
        }
    }

    impl Accelerometer for ScriptedAccel {
        fn read_raw(&mut self) -> RawAcceleration {
            if let Some(next) = self.frames.pop_front() {
                self.last = next;
            }
            self.last
        }
    }

    fn monitor() -> AccelerationMonitor {
        AccelerationMonitor::new(ScriptedAccel::boxed(&[]), 3)
    }

    #[test]
    fn duplicate_update_leaves_filters_untouched() {
        let mut m = monitor();
        assert!(m.update(0, 100, 200));
        assert_eq!(m.filter_counts(), (1, 1));

        assert!(!m.update(5, 100, 200));
        assert_eq!(m.filter_counts(), (1, 1));
        assert_eq!(m.last_sample().unwrap().timestamp_ms, 0);
    }

    #[test]
    fn distinct_samples_reach_both_filters() {
        let mut m = monitor();
        m.update(0, 300, 0);
        m.update(1, 0, 300);
        m.update(2, 300, 300);
        assert_eq!(m.filter_counts(), (3, 3));
        assert_eq!(m.average_x(), 200);
        assert_eq!(m.average_y(), 200);
        assert_eq!(m.smoothed_squared_magnitude(), 80_000);
    }

    #[test]
    fn repeated_value_after_a_different_one_is_stored() {
        let mut m = monitor();
        m.update(0, 10, 10);
        m.update(1, 20, 20);
        assert!(m.update(2, 10, 10));
        assert_eq!(m.filter_counts(), (3, 3));
    }

    #[test]
    fn read_pulls_frames_from_the_sensor() {
        let mut m = AccelerationMonitor::new(ScriptedAccel::boxed(&[(5, 5), (5, 5), (9, 1)]), 3);
        assert!(m.read(0));
        assert!(!m.read(1));
        assert!(m.read(2));
        assert_eq!(m.filter_counts(), (2, 2));
        assert_eq!(m.last_sample(), Some(AccelSample { timestamp_ms: 2, x: 9, y: 1 }));
    }

    #[test]
    fn instant_magnitude_of_a_stored_sample() {
        let mut m = monitor();
        m.update(0, 3, 4);
        assert!((m.instant_magnitude() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn instant_direction_is_atan2_x_over_y_in_degrees() {
        let mut m = monitor();
        m.update(0, 100, 0);
        assert!((m.instant_direction() - 90.0).abs() < 1e-9);
        m.update(1, 0, -100);
        assert!((m.instant_direction() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn smoothed_direction_follows_averages() {
        let mut m = monitor();
        m.update(0, 50, 50);
        assert!((m.smoothed_direction() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_samples_and_filters() {
        let mut m = monitor();
        m.update(0, 1000, 1000);
        m.reset();
        assert_eq!(m.filter_counts(), (0, 0));
        assert_eq!(m.smoothed_squared_magnitude(), 0);
        assert!(m.last_sample().is_none());
        // The same frame is accepted again after a reset.
        assert!(m.update(1, 1000, 1000));
    }
}
