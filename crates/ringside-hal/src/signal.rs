//! Operator-facing peripherals: buzzer, display and the start button.

use ringside_types::{AlertEffect, DisplayToken};

/// Buzzer.  Best effort; never blocks the decision logic.
pub trait AlertSignal: Send {
    fn play(&mut self, effect: AlertEffect);
}

/// Small status display.  Best effort; never blocks the decision logic.
pub trait StatusDisplay: Send {
    fn show(&mut self, token: DisplayToken);
}

/// The start/abort button.
pub trait StartControl: Send {
    /// Block until the operator gives the "go" signal.
    fn wait_for_start(&mut self);

    /// Return `true` if the operator asked to abort the current round since
    /// the last call.  Polled between control cycles only.
    fn abort_requested(&mut self) -> bool;
}
