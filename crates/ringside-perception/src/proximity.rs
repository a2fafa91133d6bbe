//! Opponent bearing from one sweep of the proximity array.
//!
//! Rules are evaluated in strict priority order and the first match wins:
//!
//! | Bearing     | Condition                                                        |
//! |-------------|------------------------------------------------------------------|
//! | `Ahead`     | `front_left + front_right >= 6`                                  |
//! | `MuchLeft`  | both fronts `< 3`, `left - 1 > right`, and not the mirrored case |
//! | `MuchRight` | mirror of `MuchLeft`                                             |
//! | `Left`      | `front_left - 1 > front_right` or `left - 1 > right`, not `Right`'s condition |
//! | `Right`     | mirror of `Left`                                                 |
//! | `NoTarget`  | otherwise                                                        |
//!
//! The `- 1` bias demands strict dominance by at least two counts.  When
//! both a side's condition and its mirror hold, neither side wins.

use ringside_types::{Bearing, ProximityCounts};

/// Front counts at or above this sum mean the opponent is dead ahead.
pub const AHEAD_SUM: i32 = 6;

/// Both front counts must be below this for a "much" side classification.
pub const MUCH_SIDE_FRONT_LIMIT: i32 = 3;

/// Stateless classifier over [`ProximityCounts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityInterpreter;

impl ProximityInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Classify one set of counts.  Total over every input.
    pub fn classify(&self, counts: ProximityCounts) -> Bearing {
        let fl = i32::from(counts.front_left);
        let fr = i32::from(counts.front_right);
        let l = i32::from(counts.left);
        let r = i32::from(counts.right);

        if fl + fr >= AHEAD_SUM {
            return Bearing::Ahead;
        }

        let fronts_weak = fl < MUCH_SIDE_FRONT_LIMIT && fr < MUCH_SIDE_FRONT_LIMIT;
        let side_left = l - 1 > r;
        let side_right = r - 1 > l;
        if fronts_weak && side_left && !side_right {
            return Bearing::MuchLeft;
        }
        if fronts_weak && side_right && !side_left {
            return Bearing::MuchRight;
        }

        let leans_left = fl - 1 > fr || side_left;
        let leans_right = fr - 1 > fl || side_right;
        match (leans_left, leans_right) {
            (true, false) => Bearing::Left,
            (false, true) => Bearing::Right,
            _ => Bearing::NoTarget,
        }
    }
}
