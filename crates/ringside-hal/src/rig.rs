//! [`Rig`] – the bundle of peripheral drivers owned by the control loop.
//!
//! The rig holds one driver per capability and is the only path by which
//! motor commands reach hardware.  Every command is range-checked against
//! the motor scale before it is forwarded, and the last accepted command is
//! remembered so callers can report what is currently in effect.
//!
//! The accelerometer is not part of the rig; it is owned by the
//! acceleration monitor in `ringside-perception`, which wraps it.

use ringside_types::{AlertEffect, DisplayToken, MAX_MOTOR_SPEED, MotorCommand, ProximityCounts, RingError};
use tracing::warn;

use crate::motor::MotorDrive;
use crate::sensor::{BorderCounts, BorderSensor, Clock, ProximitySensor};
use crate::signal::{AlertSignal, StartControl, StatusDisplay};

/// The drivers a [`Rig`] is assembled from.
pub struct RigDrivers {
    pub border: Box<dyn BorderSensor>,
    pub proximity: Box<dyn ProximitySensor>,
    pub motors: Box<dyn MotorDrive>,
    pub alert: Box<dyn AlertSignal>,
    pub display: Box<dyn StatusDisplay>,
    pub start: Box<dyn StartControl>,
    pub clock: Box<dyn Clock>,
}

/// Peripheral bundle used by the control loop.
///
/// Construct with [`Rig::new`], then read sensors and issue commands through
/// its methods.
pub struct Rig {
    drivers: RigDrivers,
    last_command: MotorCommand,
}

impl Rig {
    pub fn new(drivers: RigDrivers) -> Self {
        Self {
            drivers,
            last_command: MotorCommand::STOP,
        }
    }

    pub fn read_border(&mut self) -> BorderCounts {
        self.drivers.border.read()
    }

    pub fn read_proximity(&mut self) -> ProximityCounts {
        self.drivers.proximity.read()
    }

    pub fn now_ms(&self) -> u64 {
        self.drivers.clock.now_ms()
    }

    /// Block for `ms` milliseconds.  Zero is a no-op.
    pub fn delay_ms(&mut self, ms: u64) {
        if ms > 0 {
            self.drivers.clock.delay_ms(ms);
        }
    }

    /// Forward `command` to the motor driver.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::HardwareFault`] when either speed lies outside
    /// `±MAX_MOTOR_SPEED`, or when the driver itself rejects the command.
    pub fn set_speeds(&mut self, command: MotorCommand) -> Result<(), RingError> {
        if !command.is_within(MAX_MOTOR_SPEED) {
            warn!(left = command.left, right = command.right, "motor command outside driver scale");
            return Err(RingError::HardwareFault {
                component: "motors".to_string(),
                details: format!(
                    "speeds ({}, {}) outside ±{MAX_MOTOR_SPEED}",
                    command.left, command.right
                ),
            });
        }
        self.drivers.motors.set_speeds(command)?;
        self.last_command = command;
        Ok(())
    }

    /// Stop both motors.
    pub fn stop(&mut self) -> Result<(), RingError> {
        self.set_speeds(MotorCommand::STOP)
    }

    /// The most recent command accepted by the motor driver.
    pub fn last_command(&self) -> MotorCommand {
        self.last_command
    }

    pub fn play(&mut self, effect: AlertEffect) {
        self.drivers.alert.play(effect);
    }

    pub fn show(&mut self, token: DisplayToken) {
        self.drivers.display.show(token);
    }

    pub fn wait_for_start(&mut self) {
        self.drivers.start.wait_for_start();
    }

    pub fn abort_requested(&mut self) -> bool {
        self.drivers.start.abort_requested()
    }
}
