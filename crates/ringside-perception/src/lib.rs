//! `ringside-perception` – turns raw sensor frames into the discrete signals
//! the motion controller decides on.
//!
//! # Modules
//!
//! - [`running_average`] – [`RunningAverage`]: fixed-capacity circular-buffer
//!   mean filter.
//! - [`acceleration`] – [`AccelerationMonitor`]: deduplicates accelerometer
//!   frames and smooths each axis with a [`RunningAverage`].
//! - [`proximity`] – [`ProximityInterpreter`]: maps proximity counts to an
//!   opponent [`Bearing`][ringside_types::Bearing].
//! - [`border`] – [`BorderCheck`]: which outer border sensor sees the ring edge.
//! - [`contact`] – [`ContactDetector`]: thresholded impact detection gated by
//!   post-turn and between-contact lockout windows.

pub mod acceleration;
pub mod border;
pub mod contact;
pub mod proximity;
pub mod running_average;

pub use acceleration::{AccelSample, AccelerationMonitor};
pub use border::BorderCheck;
pub use contact::{ContactDetector, ContactWindow};
pub use proximity::ProximityInterpreter;
pub use running_average::{Averageable, RunningAverage};
