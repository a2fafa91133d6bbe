//! `ringside-hal` – capability interfaces for the sumo robot's peripherals.
//!
//! The control core never touches registers or buses.  It talks to the
//! traits defined here, and concrete drivers (or the in-process simulation)
//! plug in behind them.
//!
//! # Modules
//!
//! - [`sensor`] – [`BorderSensor`], [`ProximitySensor`], [`Accelerometer`]
//!   and the monotonic [`Clock`].
//! - [`motor`] – [`MotorDrive`], the differential motor driver.
//! - [`signal`] – fire-and-forget [`AlertSignal`] / [`StatusDisplay`] and the
//!   [`StartControl`] button.
//! - [`rig`] – [`Rig`], the bundle of drivers owned by the control loop.
//! - [`sim`] – [`SimWorld`][sim::SimWorld], a scripted in-process robot for
//!   tests and headless runs.

pub mod motor;
pub mod rig;
pub mod sensor;
pub mod signal;
pub mod sim;

pub use motor::MotorDrive;
pub use rig::{Rig, RigDrivers};
pub use sensor::{Accelerometer, BORDER_SENSOR_COUNT, BorderCounts, BorderSensor, Clock, ProximitySensor};
pub use signal::{AlertSignal, StartControl, StatusDisplay};
