//! `MotorDrive` trait for the differential drive base.
//!
//! Drivers implement this trait and are handed to a [`Rig`][crate::rig::Rig].
//! The control core only ever talks to the trait, so a PWM driver can be
//! swapped for the simulation without touching decision logic.

use ringside_types::{MotorCommand, RingError};

/// Left/right motor pair on the symmetric `-400..=400` speed scale.
pub trait MotorDrive: Send {
    /// Apply `command` to both motors.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::HardwareFault`] if the command cannot be applied
    /// (e.g. a speed is outside the driver's scale).
    fn set_speeds(&mut self, command: MotorCommand) -> Result<(), RingError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringside_types::MAX_MOTOR_SPEED;

    /// Minimal in-process motor pair used only for tests.
    struct MockMotors {
        last: MotorCommand,
    }

    impl MotorDrive for MockMotors {
        fn set_speeds(&mut self, command: MotorCommand) -> Result<(), RingError> {
            if !command.is_within(MAX_MOTOR_SPEED) {
                return Err(RingError::HardwareFault {
                    component: "motors".to_string(),
                    details: format!("{command:?} out of range"),
                });
            }
            self.last = command;
            Ok(())
        }
    }

    #[test]
    fn mock_motors_record_and_reject() {
        let mut motors = MockMotors {
            last: MotorCommand::STOP,
        };
        motors.set_speeds(MotorCommand::new(400, -400)).unwrap();
        assert_eq!(motors.last, MotorCommand::new(400, -400));

        assert!(motors.set_speeds(MotorCommand::new(401, 0)).is_err());
        assert_eq!(motors.last, MotorCommand::new(400, -400));
    }
}
