//! [`ControlLoop`] – the single-threaded polling loop.
//!
//! A round is:
//!
//! 1. [`ControlLoop::await_start`]: stop, show `Ready`, block on the start
//!    button, run the blocking countdown, then reset all motion state and
//!    accelerometer history.
//! 2. [`ControlLoop::run_round`]: repeat [`ControlLoop::cycle`] until the
//!    abort button is seen (or an optional cycle limit is reached).
//!
//! One cycle reads the accelerometer, border array and proximity array in
//! that order, classifies them, and hands the result to the
//! [`MotionController`].  The abort button is polled only at cycle
//! boundaries; a border turn in progress always runs to completion.

use ringside_hal::{Accelerometer, Rig};
use ringside_perception::{AccelerationMonitor, BorderCheck, ProximityInterpreter};
use ringside_types::{AlertEffect, Decision, DisplayToken, RingError, Tuning};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::motion::{CycleInputs, MotionController, MotionStats};

/// Why a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// The operator pressed the abort button.
    Aborted,
    /// The caller-supplied cycle limit was reached.
    CycleLimit,
}

/// Summary of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub outcome: RoundOutcome,
    pub cycles: u64,
    pub stats: MotionStats,
    pub ended_at_ms: u64,
}

/// Owns every piece of the robot and drives it one cycle at a time.
pub struct ControlLoop {
    rig: Rig,
    monitor: AccelerationMonitor,
    border: BorderCheck,
    proximity: ProximityInterpreter,
    controller: MotionController,
}

impl ControlLoop {
    /// Assemble a loop around `rig`, `accelerometer` and `controller`.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::InvalidTuning`] if the controller's tuning does
    /// not validate.
    pub fn new(
        rig: Rig,
        accelerometer: Box<dyn Accelerometer>,
        controller: MotionController,
    ) -> Result<Self, RingError> {
        let tuning = controller.tuning();
        tuning.validate()?;
        Ok(Self {
            monitor: AccelerationMonitor::new(accelerometer, tuning.accel_window),
            border: BorderCheck::new(tuning.border_threshold),
            proximity: ProximityInterpreter::new(),
            rig,
            controller,
        })
    }

    pub fn tuning(&self) -> &Tuning {
        self.controller.tuning()
    }

    pub fn controller(&self) -> &MotionController {
        &self.controller
    }

    pub fn monitor(&self) -> &AccelerationMonitor {
        &self.monitor
    }

    pub fn rig_mut(&mut self) -> &mut Rig {
        &mut self.rig
    }

    /// Idle until the start button, count down, then reset for a new round.
    pub fn await_start(&mut self) -> Result<(), RingError> {
        self.rig.stop()?;
        self.rig.show(DisplayToken::Ready);
        info!("awaiting start signal");
        self.rig.wait_for_start();

        self.countdown();

        self.controller.reset();
        self.monitor.reset();
        info!(at_ms = self.rig.now_ms(), "round started");
        Ok(())
    }

    /// Run one sense-decide-act cycle, then wait out the cycle period.
    pub fn cycle(&mut self) -> Result<Decision, RingError> {
        let now_ms = self.rig.now_ms();

        self.monitor.read(now_ms);
        let border_edge = self.border.edge(&self.rig.read_border());
        let bearing = self.proximity.classify(self.rig.read_proximity());

        let inputs = CycleInputs {
            now_ms,
            border_edge,
            bearing,
            smoothed_squared_magnitude: self.monitor.smoothed_squared_magnitude(),
        };
        let decision = self.controller.decide(&inputs, &mut self.rig)?;

        let period = self.tuning().cycle_period_ms;
        self.rig.delay_ms(period);
        Ok(decision)
    }

    /// Cycle until aborted or `max_cycles` cycles have run.
    ///
    /// Either way the round ends with the motors stopped and `Ready` shown.
    /// `on_decision` sees every decision as it is made.  On a hardware fault
    /// the motors are stopped (best effort) and the fault is returned.
    pub fn run_round(
        &mut self,
        max_cycles: Option<u64>,
        mut on_decision: impl FnMut(&Decision),
    ) -> Result<RoundReport, RingError> {
        let mut cycles = 0u64;
        let outcome = loop {
            if max_cycles.is_some_and(|max| cycles >= max) {
                info!(cycles, "cycle limit reached");
                self.rig.stop()?;
                self.rig.show(DisplayToken::Ready);
                break RoundOutcome::CycleLimit;
            }
            if self.rig.abort_requested() {
                warn!(cycles, "round aborted by operator");
                self.rig.stop()?;
                self.rig.show(DisplayToken::Ready);
                break RoundOutcome::Aborted;
            }
            match self.cycle() {
                Ok(decision) => on_decision(&decision),
                Err(e) => {
                    error!(error = %e, cycles, "cycle failed; stopping motors");
                    if let Err(stop_err) = self.rig.stop() {
                        error!(error = %stop_err, "failed to stop motors");
                    }
                    return Err(e);
                }
            }
            cycles += 1;
        };

        let report = RoundReport {
            outcome,
            cycles,
            stats: self.controller.stats(),
            ended_at_ms: self.rig.now_ms(),
        };
        info!(outcome = ?report.outcome, cycles, turns = report.stats.border_turns, contacts = report.stats.contacts_made, "round finished");
        Ok(report)
    }

    /// Blocking countdown: one beep per (possibly partial) second, then "go".
    fn countdown(&mut self) {
        let mut remaining = self.tuning().countdown_ms;
        while remaining > 0 {
            let secs = remaining.div_ceil(1000);
            let step = remaining - (secs - 1) * 1000;
            self.rig.show(DisplayToken::Countdown(u8::try_from(secs).unwrap_or(u8::MAX)));
            self.rig.play(AlertEffect::CountdownBeep);
            self.rig.delay_ms(step);
            remaining -= step;
        }
        self.rig.show(DisplayToken::Go);
        self.rig.play(AlertEffect::Go);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringside_hal::sim::SimWorld;
    use ringside_types::{Branch, MotorCommand, ProximityCounts};

    fn sim_loop(tuning: Tuning) -> (SimWorld, ControlLoop) {
        let world = SimWorld::new();
        let control =
            ControlLoop::new(world.rig(), world.accelerometer(), MotionController::with_seed(tuning, 1))
                .expect("valid tuning");
        (world, control)
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        let world = SimWorld::new();
        let tuning = Tuning {
            accel_window: 0,
            ..Tuning::default()
        };
        let result = ControlLoop::new(world.rig(), world.accelerometer(), MotionController::new(tuning));
        assert!(matches!(result, Err(RingError::InvalidTuning(_))));
    }

    #[test]
    fn await_start_counts_down_and_resets() {
        let (world, mut control) = sim_loop(Tuning::default());
        control.await_start().unwrap();

        assert_eq!(world.start_presses(), 1);
        assert_eq!(world.now_ms(), 5000);
        assert_eq!(
            world.display_tokens(),
            vec![
                DisplayToken::Ready,
                DisplayToken::Countdown(5),
                DisplayToken::Countdown(4),
                DisplayToken::Countdown(3),
                DisplayToken::Countdown(2),
                DisplayToken::Countdown(1),
                DisplayToken::Go,
            ]
        );
        let beeps = world.alerts().iter().filter(|a| **a == AlertEffect::CountdownBeep).count();
        assert_eq!(beeps, 5);
        assert_eq!(world.alerts().last(), Some(&AlertEffect::Go));
        assert_eq!(world.last_command(), Some(MotorCommand::STOP));
    }

    #[test]
    fn partial_second_countdown_starts_with_the_remainder() {
        let tuning = Tuning {
            countdown_ms: 2500,
            ..Tuning::default()
        };
        let (world, mut control) = sim_loop(tuning);
        control.await_start().unwrap();
        assert_eq!(world.now_ms(), 2500);
        assert_eq!(world.display_tokens()[1], DisplayToken::Countdown(3));
    }

    #[test]
    fn cycle_advances_by_the_cycle_period() {
        let (world, mut control) = sim_loop(Tuning::default());
        let d = control.cycle().unwrap();
        assert_eq!(d.at_ms, 0);
        assert_eq!(world.now_ms(), 10);
    }

    #[test]
    fn cycle_limit_ends_the_round() {
        let (_world, mut control) = sim_loop(Tuning::default());
        let mut seen = 0;
        let report = control.run_round(Some(25), |_| seen += 1).unwrap();
        assert_eq!(report.outcome, RoundOutcome::CycleLimit);
        assert_eq!(report.cycles, 25);
        assert_eq!(seen, 25);
    }

    #[test]
    fn cycle_limit_stops_the_motors() {
        let (world, mut control) = sim_loop(Tuning::default());
        control.await_start().unwrap();
        world.set_proximity(ProximityCounts::new(5, 5, 0, 0));

        let report = control.run_round(Some(5), |_| {}).unwrap();
        assert_eq!(report.outcome, RoundOutcome::CycleLimit);
        assert_eq!(world.last_command(), Some(MotorCommand::STOP));
        assert_eq!(world.display_tokens().last(), Some(&DisplayToken::Ready));
    }

    #[test]
    fn abort_stops_motors_between_cycles() {
        let (world, mut control) = sim_loop(Tuning::default());
        world.set_proximity(ProximityCounts::new(5, 5, 0, 0));
        let abort_world = world.clone();
        let mut cycles = 0;
        let report = control
            .run_round(Some(1000), |d| {
                assert_eq!(d.branch, Branch::Charge);
                cycles += 1;
                if cycles == 3 {
                    abort_world.request_abort();
                }
            })
            .unwrap();
        assert_eq!(report.outcome, RoundOutcome::Aborted);
        assert_eq!(report.cycles, 3);
        assert_eq!(world.last_command(), Some(MotorCommand::STOP));
        assert_eq!(world.display_tokens().last(), Some(&DisplayToken::Ready));
    }

    #[test]
    fn round_report_serializes_with_snake_case_outcome() {
        let report = RoundReport {
            outcome: RoundOutcome::CycleLimit,
            cycles: 2,
            stats: MotionStats::default(),
            ended_at_ms: 20,
        };
        let json = serde_json::to_value(report).expect("serialize");
        assert_eq!(json["outcome"], "cycle_limit");
        assert_eq!(json["stats"]["border_turns"], 0);
    }

    #[test]
    fn faulting_motor_command_ends_the_round_with_an_error() {
        // A sharp pivot speed above the driver scale cannot pass validation,
        // so corrupt it after construction.
        let (world, mut control) = sim_loop(Tuning::default());
        let bad = Tuning {
            sharp_pivot_speed: 500,
            ..Tuning::default()
        };
        control.controller = MotionController::with_seed(bad, 1);
        world.set_proximity(ProximityCounts::new(0, 0, 5, 0));

        let err = control.run_round(Some(10), |_| {}).unwrap_err();
        assert!(matches!(err, RingError::HardwareFault { .. }));
        assert_eq!(world.last_command(), Some(MotorCommand::STOP));
    }
}
