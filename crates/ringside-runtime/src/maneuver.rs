//! Timed turn maneuver as an explicit sub-state machine.
//!
//! A border turn is three phases:
//!
//! ```text
//! Reversing ──reverse_ms──▶ Pivoting ──pivot_ms──▶ Resuming ──▶ Done
//! ```
//!
//! [`Maneuver::start`] returns the first command; [`Maneuver::poll`] is
//! called with the current time and returns the next command whenever a
//! phase boundary has been crossed.  The controller drives it to completion
//! with blocking delays, but a scheduler could poll it from a timer instead
//! without changing the emitted command sequence.

use ringside_types::{MotorCommand, Side, Tuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverPhase {
    Idle,
    Reversing,
    Pivoting,
    Resuming,
    Done,
}

/// A reverse-then-pivot-then-resume turn.
#[derive(Debug, Clone)]
pub struct Maneuver {
    phase: ManeuverPhase,
    phase_started_ms: u64,
    reverse: MotorCommand,
    reverse_ms: u64,
    pivot: MotorCommand,
    pivot_ms: u64,
    resume: MotorCommand,
}

impl Maneuver {
    /// Turn toward `toward`, pivoting for `pivot_ms` and then driving
    /// straight at `resume_speed`.
    pub fn turn(toward: Side, pivot_ms: u64, resume_speed: i16, tuning: &Tuning) -> Self {
        Self {
            phase: ManeuverPhase::Idle,
            phase_started_ms: 0,
            reverse: MotorCommand::straight(-tuning.reverse_speed),
            reverse_ms: tuning.reverse_duration_ms,
            pivot: MotorCommand::pivot(toward, tuning.turn_speed),
            pivot_ms,
            resume: MotorCommand::straight(resume_speed),
        }
    }

    /// Enter `Reversing` at `now_ms` and return the reverse command.
    pub fn start(&mut self, now_ms: u64) -> MotorCommand {
        self.enter(ManeuverPhase::Reversing, now_ms);
        self.reverse
    }

    /// Advance past any elapsed phase, returning the command for the phase
    /// just entered.  `Resuming` completes on the poll after it is entered.
    pub fn poll(&mut self, now_ms: u64) -> Option<MotorCommand> {
        let elapsed = now_ms.saturating_sub(self.phase_started_ms);
        match self.phase {
            ManeuverPhase::Reversing if elapsed >= self.reverse_ms => {
                self.enter(ManeuverPhase::Pivoting, now_ms);
                Some(self.pivot)
            }
            ManeuverPhase::Pivoting if elapsed >= self.pivot_ms => {
                self.enter(ManeuverPhase::Resuming, now_ms);
                Some(self.resume)
            }
            ManeuverPhase::Resuming => {
                self.enter(ManeuverPhase::Done, now_ms);
                None
            }
            _ => None,
        }
    }

    /// Time left in the current phase.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.phase_started_ms);
        let duration = match self.phase {
            ManeuverPhase::Reversing => self.reverse_ms,
            ManeuverPhase::Pivoting => self.pivot_ms,
            _ => 0,
        };
        duration.saturating_sub(elapsed)
    }

    pub fn phase(&self) -> ManeuverPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == ManeuverPhase::Done
    }

    pub fn pivot_ms(&self) -> u64 {
        self.pivot_ms
    }

    fn enter(&mut self, phase: ManeuverPhase, now_ms: u64) {
        self.phase = phase;
        self.phase_started_ms = now_ms;
    }
}
