//! `ringside-runtime` – the sumo bot's control loop.
//!
//! # Modules
//!
//! - [`motion`] – [`MotionController`][motion::MotionController]: the
//!   per-cycle priority ladder (border turn, contact, opponent bearing,
//!   search) over a single explicit [`MotionState`][motion::MotionState].
//! - [`maneuver`] – [`Maneuver`][maneuver::Maneuver]: the timed
//!   Reversing → Pivoting → Resuming sub-state machine behind a border turn.
//! - [`control_loop`] – [`ControlLoop`][control_loop::ControlLoop]: waits for
//!   the start button, runs the countdown, then polls sensors and feeds the
//!   controller until the round is aborted.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.
//!
//! # Preemption
//!
//! The abort button is polled between cycles only.  A border turn runs to
//! completion once started, so an abort pressed mid-turn takes effect at the
//! next cycle boundary.

pub mod control_loop;
pub mod maneuver;
pub mod motion;
pub mod telemetry;

pub use control_loop::{ControlLoop, RoundOutcome, RoundReport};
pub use maneuver::{Maneuver, ManeuverPhase};
pub use motion::{CycleInputs, ForwardSpeedProfile, MotionController, MotionState, MotionStats};
pub use telemetry::{TracerProviderGuard, init_tracing};
