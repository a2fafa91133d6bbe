//! In-process simulated robot for tests and headless runs.
//!
//! [`SimWorld`] is a cheaply cloneable handle to shared world state: a
//! virtual clock, the values every sensor will report next, and recorders
//! for everything the robot emits (motor commands, alerts, display tokens).
//! [`SimWorld::rig`] builds a [`Rig`] whose drivers all read from and write
//! to that state, so a test can script the arena between cycles and assert
//! on what the controller did.
//!
//! The virtual clock only moves when a driver calls
//! [`Clock::delay_ms`] or the test calls [`SimWorld::advance`]; blocking
//! maneuvers therefore complete instantly in wall-clock terms.
//!
//! # Example
//!
//! ```rust
//! use ringside_hal::sim::SimWorld;
//! use ringside_types::MotorCommand;
//!
//! let world = SimWorld::new();
//! let mut rig = world.rig();
//!
//! rig.set_speeds(MotorCommand::straight(200)).expect("sim motors accept in-range speeds");
//! rig.delay_ms(50);
//!
//! assert_eq!(world.now_ms(), 50);
//! assert_eq!(world.last_command(), Some(MotorCommand::straight(200)));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ringside_types::{AlertEffect, DisplayToken, MotorCommand, ProximityCounts, RawAcceleration, RingError};

use crate::motor::MotorDrive;
use crate::rig::{Rig, RigDrivers};
use crate::sensor::{Accelerometer, BORDER_SENSOR_COUNT, BorderCounts, BorderSensor, Clock, ProximitySensor};
use crate::signal::{AlertSignal, StartControl, StatusDisplay};

/// Border reading of the dark ring surface, well above any sane threshold.
pub const SIM_BORDER_CLEAR: u16 = 2000;

/// Border reading of the white edge line.
pub const SIM_BORDER_LINE: u16 = 200;

// ────────────────────────────────────────────────────────────────────────────
// Shared state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct WorldState {
    now_ms: u64,
    border: BorderCounts,
    proximity: ProximityCounts,
    acceleration: RawAcceleration,
    motor_log: Vec<(u64, MotorCommand)>,
    alerts: Vec<(u64, AlertEffect)>,
    display: Vec<(u64, DisplayToken)>,
    start_presses: u32,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            now_ms: 0,
            border: [SIM_BORDER_CLEAR; BORDER_SENSOR_COUNT],
            proximity: ProximityCounts::default(),
            acceleration: RawAcceleration::default(),
            motor_log: Vec::new(),
            alerts: Vec::new(),
            display: Vec::new(),
            start_presses: 0,
        }
    }
}

/// Handle to a simulated arena and robot.  Clones share the same state.
#[derive(Clone, Default)]
pub struct SimWorld {
    state: Arc<Mutex<WorldState>>,
    abort: Arc<AtomicBool>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a [`Rig`] whose drivers are all backed by this world.
    pub fn rig(&self) -> Rig {
        Rig::new(RigDrivers {
            border: Box::new(SimBorder(self.clone())),
            proximity: Box::new(SimProximity(self.clone())),
            motors: Box::new(SimMotors(self.clone())),
            alert: Box::new(SimAlert(self.clone())),
            display: Box::new(SimDisplay(self.clone())),
            start: Box::new(SimStart(self.clone())),
            clock: Box::new(SimClock(self.clone())),
        })
    }

    /// A simulated accelerometer reporting [`SimWorld::set_acceleration`].
    pub fn accelerometer(&self) -> Box<dyn Accelerometer> {
        Box::new(SimAccelerometer(self.clone()))
    }

    // ── clock ────────────────────────────────────────────────────────────

    pub fn now_ms(&self) -> u64 {
        self.lock().now_ms
    }

    pub fn advance(&self, ms: u64) {
        self.lock().now_ms += ms;
    }

    // ── scripted sensors ─────────────────────────────────────────────────

    pub fn set_border(&self, counts: BorderCounts) {
        self.lock().border = counts;
    }

    /// Put the edge line under the leftmost or rightmost sensor only.
    pub fn set_border_line(&self, leftmost: bool, rightmost: bool) {
        let mut counts = [SIM_BORDER_CLEAR; BORDER_SENSOR_COUNT];
        if leftmost {
            counts[0] = SIM_BORDER_LINE;
        }
        if rightmost {
            counts[BORDER_SENSOR_COUNT - 1] = SIM_BORDER_LINE;
        }
        self.set_border(counts);
    }

    pub fn clear_border(&self) {
        self.set_border([SIM_BORDER_CLEAR; BORDER_SENSOR_COUNT]);
    }

    pub fn set_proximity(&self, counts: ProximityCounts) {
        self.lock().proximity = counts;
    }

    pub fn set_acceleration(&self, x: i16, y: i16) {
        self.lock().acceleration = RawAcceleration { x, y };
    }

    // ── start button ─────────────────────────────────────────────────────

    /// Request an abort; consumed by the next `abort_requested` poll.
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    /// Shared abort flag, e.g. for a Ctrl-C handler.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    pub fn start_presses(&self) -> u32 {
        self.lock().start_presses
    }

    // ── recorders ────────────────────────────────────────────────────────

    /// Every motor command with the virtual time it was applied.
    pub fn motor_log(&self) -> Vec<(u64, MotorCommand)> {
        self.lock().motor_log.clone()
    }

    pub fn last_command(&self) -> Option<MotorCommand> {
        self.lock().motor_log.last().map(|(_, cmd)| *cmd)
    }

    pub fn alerts(&self) -> Vec<AlertEffect> {
        self.lock().alerts.iter().map(|(_, a)| *a).collect()
    }

    pub fn display_tokens(&self) -> Vec<DisplayToken> {
        self.lock().display.iter().map(|(_, t)| *t).collect()
    }

    /// Forget everything recorded so far; sensor values and time are kept.
    pub fn clear_logs(&self) {
        let mut state = self.lock();
        state.motor_log.clear();
        state.alerts.clear();
        state.display.clear();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub drivers
// ────────────────────────────────────────────────────────────────────────────

struct SimBorder(SimWorld);

impl BorderSensor for SimBorder {
    fn read(&mut self) -> BorderCounts {
        self.0.lock().border
    }
}

struct SimProximity(SimWorld);

impl ProximitySensor for SimProximity {
    fn read(&mut self) -> ProximityCounts {
        self.0.lock().proximity
    }
}

struct SimAccelerometer(SimWorld);

impl Accelerometer for SimAccelerometer {
    fn read_raw(&mut self) -> RawAcceleration {
        self.0.lock().acceleration
    }
}

/// Records every command.  Always succeeds; range checks live in [`Rig`].
struct SimMotors(SimWorld);

impl MotorDrive for SimMotors {
    fn set_speeds(&mut self, command: MotorCommand) -> Result<(), RingError> {
        let mut state = self.0.lock();
        let now = state.now_ms;
        state.motor_log.push((now, command));
        Ok(())
    }
}

struct SimAlert(SimWorld);

impl AlertSignal for SimAlert {
    fn play(&mut self, effect: AlertEffect) {
        let mut state = self.0.lock();
        let now = state.now_ms;
        state.alerts.push((now, effect));
    }
}

struct SimDisplay(SimWorld);

impl StatusDisplay for SimDisplay {
    fn show(&mut self, token: DisplayToken) {
        let mut state = self.0.lock();
        let now = state.now_ms;
        state.display.push((now, token));
    }
}

/// The simulated button is pressed as soon as it is waited on.
struct SimStart(SimWorld);

impl StartControl for SimStart {
    fn wait_for_start(&mut self) {
        self.0.lock().start_presses += 1;
    }

    fn abort_requested(&mut self) -> bool {
        self.0.abort.swap(false, Ordering::SeqCst)
    }
}

struct SimClock(SimWorld);

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.0.now_ms()
    }

    fn delay_ms(&mut self, ms: u64) {
        self.0.advance(ms);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
