use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest magnitude accepted by the motor driver (full forward / full reverse).
pub const MAX_MOTOR_SPEED: i16 = 400;

/// One side of the robot, also used as a turn direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Turn sign: `-1` for left, `+1` for right.
    pub fn sign(self) -> i16 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Counts reported by the proximity array for one cycle.
///
/// `front_left`/`front_right` are the forward-facing detector counts under
/// the left and right emitters; `left`/`right` are the side detector counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProximityCounts {
    pub front_left: u8,
    pub front_right: u8,
    pub left: u8,
    pub right: u8,
}

impl ProximityCounts {
    pub fn new(front_left: u8, front_right: u8, left: u8, right: u8) -> Self {
        Self {
            front_left,
            front_right,
            left,
            right,
        }
    }
}

/// One raw accelerometer frame (x/y axes only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAcceleration {
    pub x: i16,
    pub y: i16,
}

/// Left/right motor speeds on the symmetric `-MAX_MOTOR_SPEED..=MAX_MOTOR_SPEED` scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorCommand {
    pub left: i16,
    pub right: i16,
}

impl MotorCommand {
    pub const STOP: MotorCommand = MotorCommand { left: 0, right: 0 };

    pub fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Both wheels at the same speed.
    pub fn straight(speed: i16) -> Self {
        Self::new(speed, speed)
    }

    /// In-place pivot toward `toward` at `speed`.
    ///
    /// A right pivot drives the left wheel forward and the right wheel
    /// backward.
    pub fn pivot(toward: Side, speed: i16) -> Self {
        let s = speed * toward.sign();
        Self::new(s, -s)
    }

    /// Forward arc bending toward `toward`: the inner wheel runs at
    /// `inner`, the outer wheel at `outer`.
    pub fn arc(toward: Side, inner: i16, outer: i16) -> Self {
        match toward {
            Side::Left => Self::new(inner, outer),
            Side::Right => Self::new(outer, inner),
        }
    }

    /// Both wheels within `±max`.  Compares magnitudes as `u16` so
    /// `i16::MIN` is out of range rather than an overflow.
    pub fn is_within(&self, max: i16) -> bool {
        let limit = max.max(0).unsigned_abs();
        self.left.unsigned_abs() <= limit && self.right.unsigned_abs() <= limit
    }
}

/// Discrete opponent bearing derived from one set of proximity counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bearing {
    Ahead,
    MuchLeft,
    MuchRight,
    Left,
    Right,
    NoTarget,
}

/// Sound effects requested from the buzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertEffect {
    CountdownBeep,
    Go,
    Charge,
}

/// Short status tokens shown on the robot's display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayToken {
    Ready,
    Countdown(u8),
    Go,
    Search,
    Turn,
    Track,
    Berserk,
}

impl std::fmt::Display for DisplayToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayToken::Ready => write!(f, "ready"),
            DisplayToken::Countdown(n) => write!(f, "{n}"),
            DisplayToken::Go => write!(f, "go!"),
            DisplayToken::Search => write!(f, "search"),
            DisplayToken::Turn => write!(f, "turn"),
            DisplayToken::Track => write!(f, "track"),
            DisplayToken::Berserk => write!(f, "berserk"),
        }
    }
}

/// Which branch of the per-cycle priority ladder produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "branch", rename_all = "snake_case")]
pub enum Branch {
    /// Border seen under `border`; the robot turned away toward `toward`.
    BorderTurn { border: Side, toward: Side },
    /// Accelerometer contact fired.
    Contact,
    /// Opponent far to one side; full differential pivot.
    SharpPivot { toward: Side },
    /// Opponent to one side while not facing it.
    Pivot { toward: Side },
    /// Opponent to one side while already facing it.
    Arc { toward: Side },
    /// Opponent ahead (or still ahead from an earlier cycle).
    Charge,
    /// Nothing detected; `slowed` once the search streak outlasts its window.
    Search { slowed: bool },
}

/// The outcome of one control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Loop start time of the cycle (ms).
    pub at_ms: u64,
    pub branch: Branch,
    /// Final motor command left in effect when the cycle returned.
    pub command: MotorCommand,
}

/// Every tunable constant used by the perception and motion layers.
///
/// Durations are milliseconds, speeds are motor-scale units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Border sensor readings below this value mean the ring edge is under the sensor.
    pub border_threshold: u16,
    pub reverse_speed: i16,
    pub turn_speed: i16,
    pub search_speed: i16,
    pub sustained_speed: i16,
    pub full_speed: i16,
    pub max_speed: i16,
    /// Inner wheel speed of the arc correction.
    pub arc_inner_speed: i16,
    pub sharp_pivot_speed: i16,
    /// Pivot speed at the start of a search streak.
    pub round_go_speed: i16,
    /// Rotation speed once the search streak has lasted `search_slowdown_ms`.
    pub search_rotate_speed: i16,
    /// Direction the search pivot turns in.
    pub search_direction: Side,
    pub search_slowdown_ms: u64,
    pub reverse_duration_ms: u64,
    pub turn_duration_ms: u64,
    pub full_speed_duration_limit_ms: u64,
    /// Running-average window of the accelerometer filters.
    pub accel_window: usize,
    pub accel_threshold: i32,
    pub min_delay_after_turn_ms: u64,
    pub min_delay_between_contacts_ms: u64,
    pub countdown_ms: u64,
    /// Delay inserted after each control cycle.
    pub cycle_period_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            border_threshold: 1000,
            reverse_speed: 200,
            turn_speed: 200,
            search_speed: 200,
            sustained_speed: 400,
            full_speed: 400,
            max_speed: MAX_MOTOR_SPEED,
            arc_inner_speed: 300,
            sharp_pivot_speed: 400,
            round_go_speed: 300,
            search_rotate_speed: 150,
            search_direction: Side::Right,
            search_slowdown_ms: 1000,
            reverse_duration_ms: 200,
            turn_duration_ms: 300,
            full_speed_duration_limit_ms: 250,
            accel_window: 3,
            accel_threshold: 2400,
            min_delay_after_turn_ms: 400,
            min_delay_between_contacts_ms: 1000,
            countdown_ms: 5000,
            cycle_period_ms: 10,
        }
    }
}

impl Tuning {
    /// Squared contact threshold, compared against the smoothed squared magnitude.
    pub fn accel_threshold_squared(&self) -> i64 {
        i64::from(self.accel_threshold) * i64::from(self.accel_threshold)
    }

    /// Reject configurations the controller cannot execute.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::InvalidTuning`] naming the first offending field.
    pub fn validate(&self) -> Result<(), RingError> {
        if self.max_speed <= 0 || self.max_speed > MAX_MOTOR_SPEED {
            return Err(RingError::InvalidTuning(format!(
                "max_speed must be within 1..={MAX_MOTOR_SPEED}, got {}",
                self.max_speed
            )));
        }
        let speeds = [
            ("reverse_speed", self.reverse_speed),
            ("turn_speed", self.turn_speed),
            ("search_speed", self.search_speed),
            ("sustained_speed", self.sustained_speed),
            ("full_speed", self.full_speed),
            ("arc_inner_speed", self.arc_inner_speed),
            ("sharp_pivot_speed", self.sharp_pivot_speed),
            ("round_go_speed", self.round_go_speed),
            ("search_rotate_speed", self.search_rotate_speed),
        ];
        for (name, speed) in speeds {
            if speed.unsigned_abs() > self.max_speed.unsigned_abs() {
                return Err(RingError::InvalidTuning(format!(
                    "{name} ({speed}) exceeds max_speed ({})",
                    self.max_speed
                )));
            }
        }
        if self.accel_window == 0 {
            return Err(RingError::InvalidTuning(
                "accel_window must be at least 1".to_string(),
            ));
        }
        if self.turn_duration_ms == 0 {
            return Err(RingError::InvalidTuning(
                "turn_duration_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Workspace error type.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RingError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_right_drives_left_wheel_forward() {
        assert_eq!(MotorCommand::pivot(Side::Right, 200), MotorCommand::new(200, -200));
        assert_eq!(MotorCommand::pivot(Side::Left, 200), MotorCommand::new(-200, 200));
    }

    #[test]
    fn arc_slows_the_inner_wheel() {
        assert_eq!(MotorCommand::arc(Side::Left, 300, 400), MotorCommand::new(300, 400));
        assert_eq!(MotorCommand::arc(Side::Right, 300, 400), MotorCommand::new(400, 300));
    }

    #[test]
    fn default_tuning_is_valid() {
        Tuning::default().validate().expect("defaults must validate");
        assert_eq!(Tuning::default().accel_threshold_squared(), 5_760_000);
    }

    #[test]
    fn validate_rejects_speed_above_max() {
        let tuning = Tuning {
            full_speed: 450,
            ..Tuning::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(err.to_string().contains("full_speed"));
    }

    #[test]
    fn validate_rejects_i16_min_speed() {
        let tuning = Tuning {
            reverse_speed: i16::MIN,
            ..Tuning::default()
        };
        assert!(matches!(tuning.validate(), Err(RingError::InvalidTuning(_))));
    }

    #[test]
    fn is_within_rejects_i16_min() {
        assert!(!MotorCommand::new(i16::MIN, 0).is_within(400));
        assert!(!MotorCommand::new(0, i16::MIN).is_within(i16::MAX));
        assert!(MotorCommand::new(-400, 400).is_within(400));
    }

    #[test]
    fn validate_rejects_empty_window() {
        let tuning = Tuning {
            accel_window: 0,
            ..Tuning::default()
        };
        assert!(matches!(tuning.validate(), Err(RingError::InvalidTuning(_))));
    }

    #[test]
    fn partial_tuning_fills_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{"border_threshold": 700}"#).unwrap();
        assert_eq!(tuning.border_threshold, 700);
        assert_eq!(tuning.turn_duration_ms, 300);
    }

    #[test]
    fn decision_serializes_with_branch_tag() {
        let decision = Decision {
            at_ms: 42,
            branch: Branch::Pivot { toward: Side::Left },
            command: MotorCommand::pivot(Side::Left, 200),
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains(r#""branch":"pivot""#));
        assert!(json.contains(r#""toward":"left""#));
    }

    #[test]
    fn ring_error_display() {
        let err = RingError::HardwareFault {
            component: "motors".to_string(),
            details: "speed out of range".to_string(),
        };
        assert!(err.to_string().contains("motors"));
    }
}
