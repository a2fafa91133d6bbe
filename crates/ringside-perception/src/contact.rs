//! [`ContactDetector`] – impact detection with lockout windows.
//!
//! Contact fires when the smoothed squared acceleration magnitude exceeds
//! the squared threshold, unless the robot is inside one of two lockout
//! windows:
//!
//! - **after turn**: a border turn jolts the accelerometer, so readings
//!   shortly after one are ignored;
//! - **between contacts**: a fresh contact is not re-reported until the
//!   previous one is old enough.
//!
//! The detector is pure.  Recording the contact time and setting the
//! in-contact flag is the caller's job.

use ringside_types::Tuning;

/// Timestamps the lockout windows are measured from.
///
/// `None` means the event has not happened since the round started, so its
/// window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactWindow {
    pub now_ms: u64,
    pub last_turn_ms: Option<u64>,
    pub last_contact_ms: Option<u64>,
}

/// Thresholded, lockout-gated contact detector.
#[derive(Debug, Clone, Copy)]
pub struct ContactDetector {
    threshold_squared: i64,
    after_turn_lockout_ms: u64,
    between_contacts_lockout_ms: u64,
}

impl ContactDetector {
    pub fn new(threshold: i32, after_turn_lockout_ms: u64, between_contacts_lockout_ms: u64) -> Self {
        Self {
            threshold_squared: i64::from(threshold) * i64::from(threshold),
            after_turn_lockout_ms,
            between_contacts_lockout_ms,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(
            tuning.accel_threshold,
            tuning.min_delay_after_turn_ms,
            tuning.min_delay_between_contacts_ms,
        )
    }

    pub fn threshold_squared(&self) -> i64 {
        self.threshold_squared
    }

    /// `true` iff the magnitude is above threshold and both lockouts have
    /// expired (strictly longer than the lockout has elapsed).
    pub fn check(&self, smoothed_squared_magnitude: i64, window: ContactWindow) -> bool {
        smoothed_squared_magnitude > self.threshold_squared
            && expired(window.now_ms, window.last_turn_ms, self.after_turn_lockout_ms)
            && expired(window.now_ms, window.last_contact_ms, self.between_contacts_lockout_ms)
    }
}

fn expired(now_ms: u64, since: Option<u64>, lockout_ms: u64) -> bool {
    match since {
        Some(t) => now_ms.saturating_sub(t) > lockout_ms,
        None => true,
    }
}
