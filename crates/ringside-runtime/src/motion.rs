//! [`MotionController`] – per-cycle motor decision.
//!
//! Each cycle the controller first settles the forward-speed profile (a Full
//! burst older than `full_speed_duration_limit_ms` drops to Sustained), then
//! walks a fixed priority ladder and takes the first branch that applies:
//!
//! 1. **Border turn** – an outer border sensor sees the edge: blocking
//!    reverse/pivot/resume [`Maneuver`] away from it.
//! 2. **Contact** – the [`ContactDetector`] fires: Berserker charge.
//! 3. **Sharp pivot** – opponent much to one side: full differential pivot.
//! 4. **Pivot** – opponent to one side, not yet facing it.
//! 5. **Arc** – opponent to one side while already facing it (sticky
//!    `ahead` flag): asymmetric forward speeds.
//! 6. **Charge** – opponent ahead, or still flagged ahead: Berserker.
//! 7. **Search** – nothing seen: pivot at round-go speed, slowing to a
//!    gentler rotation once the streak outlasts `search_slowdown_ms`.
//!
//! All process-lifetime flags live in one [`MotionState`], reset at every
//! round start.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringside_hal::Rig;
use ringside_perception::{ContactDetector, ContactWindow};
use ringside_types::{AlertEffect, Bearing, Branch, Decision, DisplayToken, MotorCommand, RingError, Side, Tuning};
use serde::Serialize;
use tracing::{debug, info};

use crate::maneuver::Maneuver;

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

/// Forward-speed escalation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "profile", rename_all = "snake_case")]
pub enum ForwardSpeedProfile {
    Search,
    Sustained,
    /// Full-speed burst entered at `since_ms`.
    Full { since_ms: u64 },
}

/// Flags and timestamps the controller carries from one cycle to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MotionState {
    pub in_contact: bool,
    pub contact_made_ms: Option<u64>,
    /// End time of the most recent border turn.
    pub last_turn_ms: Option<u64>,
    pub forward_speed: ForwardSpeedProfile,
    /// Sticky: the opponent was last seen dead ahead.
    pub ahead: bool,
    /// Start of the current search streak, if one is running.
    pub round_go_since_ms: Option<u64>,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            in_contact: false,
            contact_made_ms: None,
            last_turn_ms: None,
            forward_speed: ForwardSpeedProfile::Search,
            ahead: false,
            round_go_since_ms: None,
        }
    }
}

impl MotionState {
    /// Back to the "awaiting start" values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Contact is over: drop back to search speed.
    pub fn on_contact_lost(&mut self) {
        self.in_contact = false;
        self.forward_speed = ForwardSpeedProfile::Search;
    }

    /// Record a contact at `now_ms` and start a fresh Full burst.
    pub fn on_contact_made(&mut self, now_ms: u64) {
        self.in_contact = true;
        self.contact_made_ms = Some(now_ms);
        self.forward_speed = ForwardSpeedProfile::Full { since_ms: now_ms };
    }

    /// Contact continues at `now_ms`.  The speed profile is left to settle.
    pub fn on_contact_held(&mut self, now_ms: u64) {
        self.in_contact = true;
        self.contact_made_ms = Some(now_ms);
    }
}

/// Per-round counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MotionStats {
    /// Transitions into contact.
    pub contacts_made: u32,
    /// `on_contact_lost` invocations (one per border turn).
    pub contacts_lost: u32,
    pub border_turns: u32,
}

/// Everything the controller needs from perception for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleInputs {
    /// Loop start time.
    pub now_ms: u64,
    /// Outer border sensor that sees the edge, if any.
    pub border_edge: Option<Side>,
    pub bearing: Bearing,
    pub smoothed_squared_magnitude: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller
// ─────────────────────────────────────────────────────────────────────────────

/// Priority-encoded motion controller.
pub struct MotionController {
    tuning: Tuning,
    detector: ContactDetector,
    state: MotionState,
    stats: MotionStats,
    rng: StdRng,
    shown: Option<DisplayToken>,
}

impl MotionController {
    /// Controller whose turn randomization is seeded from the OS.
    pub fn new(tuning: Tuning) -> Self {
        Self::with_rng(tuning, StdRng::from_os_rng())
    }

    /// Controller with a reproducible turn randomization.
    pub fn with_seed(tuning: Tuning, seed: u64) -> Self {
        Self::with_rng(tuning, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tuning: Tuning, rng: StdRng) -> Self {
        Self {
            detector: ContactDetector::from_tuning(&tuning),
            tuning,
            state: MotionState::default(),
            stats: MotionStats::default(),
            rng,
            shown: None,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MotionState {
        &mut self.state
    }

    pub fn stats(&self) -> MotionStats {
        self.stats
    }

    /// Reset state and counters for a new round.
    pub fn reset(&mut self) {
        self.state.reset();
        self.stats = MotionStats::default();
        self.shown = None;
    }

    /// Straight-line speed of the current profile.
    pub fn forward_speed(&self) -> i16 {
        match self.state.forward_speed {
            ForwardSpeedProfile::Search => self.tuning.search_speed,
            ForwardSpeedProfile::Sustained => self.tuning.sustained_speed,
            ForwardSpeedProfile::Full { .. } => self.tuning.full_speed,
        }
    }

    /// Run one decision and apply it to `rig`.
    ///
    /// # Errors
    ///
    /// Propagates [`RingError::HardwareFault`] from the motor driver.
    pub fn decide(&mut self, inputs: &CycleInputs, rig: &mut Rig) -> Result<Decision, RingError> {
        let now = inputs.now_ms;
        self.settle_forward_speed(now);

        let branch = if let Some(border) = inputs.border_edge {
            let toward = border.opposite();
            self.turn(toward, true, rig)?;
            Branch::BorderTurn { border, toward }
        } else if self.contact_fires(inputs) {
            self.berserk(now, true, rig)?;
            Branch::Contact
        } else {
            self.steer(now, inputs.bearing, rig)?
        };

        if !matches!(branch, Branch::Search { .. }) {
            self.state.round_go_since_ms = None;
        }

        let decision = Decision {
            at_ms: now,
            branch,
            command: rig.last_command(),
        };
        debug!(at_ms = now, branch = ?decision.branch, left = decision.command.left, right = decision.command.right, "cycle decision");
        Ok(decision)
    }

    /// Execute a blocking border turn toward `toward`.
    ///
    /// Contact is considered lost before the robot moves.  With `randomize`
    /// the pivot lasts `turn_duration_ms` plus a random whole number of
    /// quarter-durations in `-2..=2`.  `last_turn_ms` is stamped with the
    /// time the maneuver finished.
    pub fn turn(&mut self, toward: Side, randomize: bool, rig: &mut Rig) -> Result<(), RingError> {
        self.state.on_contact_lost();
        self.stats.contacts_lost += 1;
        self.state.ahead = false;
        self.show(DisplayToken::Turn, rig);

        let pivot_ms = if randomize {
            let quarter = self.tuning.turn_duration_ms / 4;
            let offset: i64 = self.rng.random_range(-2..=2);
            let pivot = self.tuning.turn_duration_ms as i64 + offset * quarter as i64;
            pivot.max(0) as u64
        } else {
            self.tuning.turn_duration_ms
        };
        info!(toward = ?toward, pivot_ms, "border detected; turning away");

        let mut maneuver = Maneuver::turn(toward, pivot_ms, self.forward_speed(), &self.tuning);
        rig.set_speeds(maneuver.start(rig.now_ms()))?;
        while !maneuver.is_done() {
            rig.delay_ms(maneuver.remaining_ms(rig.now_ms()));
            if let Some(command) = maneuver.poll(rig.now_ms()) {
                rig.set_speeds(command)?;
            }
        }

        self.state.last_turn_ms = Some(rig.now_ms());
        self.stats.border_turns += 1;
        Ok(())
    }

    // ── internals ────────────────────────────────────────────────────────

    fn settle_forward_speed(&mut self, now_ms: u64) {
        if let ForwardSpeedProfile::Full { since_ms } = self.state.forward_speed
            && now_ms.saturating_sub(since_ms) > self.tuning.full_speed_duration_limit_ms
        {
            debug!(since_ms, now_ms, "full-speed burst over; settling to sustained");
            self.state.forward_speed = ForwardSpeedProfile::Sustained;
        }
    }

    fn contact_fires(&self, inputs: &CycleInputs) -> bool {
        self.detector.check(
            inputs.smoothed_squared_magnitude,
            ContactWindow {
                now_ms: inputs.now_ms,
                last_turn_ms: self.state.last_turn_ms,
                last_contact_ms: self.state.contact_made_ms,
            },
        )
    }

    /// Bearing-driven branches 3 to 7.
    fn steer(&mut self, now_ms: u64, bearing: Bearing, rig: &mut Rig) -> Result<Branch, RingError> {
        let t = &self.tuning;
        let (branch, command) = match bearing {
            Bearing::MuchLeft | Bearing::MuchRight => {
                let toward = if bearing == Bearing::MuchLeft { Side::Left } else { Side::Right };
                self.state.ahead = false;
                (Branch::SharpPivot { toward }, MotorCommand::pivot(toward, t.sharp_pivot_speed))
            }
            Bearing::Left | Bearing::Right => {
                let toward = if bearing == Bearing::Left { Side::Left } else { Side::Right };
                if self.state.ahead {
                    (Branch::Arc { toward }, MotorCommand::arc(toward, t.arc_inner_speed, t.max_speed))
                } else {
                    (Branch::Pivot { toward }, MotorCommand::pivot(toward, t.turn_speed))
                }
            }
            Bearing::Ahead => {
                self.state.ahead = true;
                self.berserk(now_ms, false, rig)?;
                return Ok(Branch::Charge);
            }
            Bearing::NoTarget if self.state.ahead => {
                self.berserk(now_ms, false, rig)?;
                return Ok(Branch::Charge);
            }
            Bearing::NoTarget => return self.search(now_ms, rig),
        };
        self.show(DisplayToken::Track, rig);
        rig.set_speeds(command)?;
        Ok(branch)
    }

    /// Full-speed charge.  `always_alert` marks a fresh hit: the buzzer
    /// sounds and the Full burst restarts even when already in contact.
    fn berserk(&mut self, now_ms: u64, always_alert: bool, rig: &mut Rig) -> Result<(), RingError> {
        let entering = !self.state.in_contact;
        if entering {
            self.stats.contacts_made += 1;
            info!(at_ms = now_ms, "contact made; berserker charge");
        }
        if entering || always_alert {
            self.state.on_contact_made(now_ms);
            rig.play(AlertEffect::Charge);
        } else {
            self.state.on_contact_held(now_ms);
        }
        self.show(DisplayToken::Berserk, rig);
        rig.set_speeds(MotorCommand::straight(self.tuning.max_speed))
    }

    fn search(&mut self, now_ms: u64, rig: &mut Rig) -> Result<Branch, RingError> {
        let t = &self.tuning;
        let started = *self.state.round_go_since_ms.get_or_insert(now_ms);
        let slowed = now_ms.saturating_sub(started) > t.search_slowdown_ms;
        let speed = if slowed { t.search_rotate_speed } else { t.round_go_speed };
        let command = MotorCommand::pivot(t.search_direction, speed);
        self.show(DisplayToken::Search, rig);
        rig.set_speeds(command)?;
        Ok(Branch::Search { slowed })
    }

    /// Show `token` unless it is already on the display.
    fn show(&mut self, token: DisplayToken, rig: &mut Rig) {
        if self.shown != Some(token) {
            rig.show(token);
            self.shown = Some(token);
        }
    }
}
