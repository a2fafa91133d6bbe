//! Scripted arenas for the simulated rig.
//!
//! A scenario is a list of sensor changes keyed by time since the round
//! started.  The [`ScenarioPlayer`] applies every change that has fallen due
//! between control cycles, so the robot sees each one on its next read.
//!
//! ```toml
//! name = "edge dance"
//!
//! [[event]]
//! at_ms = 500
//! kind = "border_line"
//! leftmost = true
//!
//! [[event]]
//! at_ms = 600
//! kind = "border_clear"
//!
//! [[event]]
//! at_ms = 2000
//! kind = "abort"
//! ```

use ringside_hal::sim::SimWorld;
use ringside_types::ProximityCounts;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// One change to the simulated arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorChange {
    /// Put the edge line under the leftmost and/or rightmost border sensor.
    BorderLine {
        #[serde(default)]
        leftmost: bool,
        #[serde(default)]
        rightmost: bool,
    },
    BorderClear,
    Proximity {
        #[serde(default)]
        front_left: u8,
        #[serde(default)]
        front_right: u8,
        #[serde(default)]
        left: u8,
        #[serde(default)]
        right: u8,
    },
    Acceleration { x: i16, y: i16 },
    /// Press the abort button.
    Abort,
}

impl SensorChange {
    pub fn apply(&self, world: &SimWorld) {
        match *self {
            SensorChange::BorderLine { leftmost, rightmost } => world.set_border_line(leftmost, rightmost),
            SensorChange::BorderClear => world.clear_border(),
            SensorChange::Proximity {
                front_left,
                front_right,
                left,
                right,
            } => world.set_proximity(ProximityCounts::new(front_left, front_right, left, right)),
            SensorChange::Acceleration { x, y } => world.set_acceleration(x, y),
            SensorChange::Abort => world.request_abort(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    /// Milliseconds after the round started.
    pub at_ms: u64,
    #[serde(flatten)]
    pub change: SensorChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default, rename = "event")]
    pub events: Vec<ScriptedEvent>,
}

fn default_name() -> String {
    "unnamed".to_string()
}

impl Scenario {
    /// Parse a scenario from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| format!("Failed to parse scenario: {}", e))
    }

    /// Load a scenario file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scenario at {}: {}", path.display(), e))?;
        Self::from_toml_str(&raw)
    }

    /// The built-in round: a search interrupted by a hit from behind, an
    /// opponent sweeping in from the right into a head-on charge, then both
    /// edges of the ring.
    pub fn demo() -> Self {
        use SensorChange::*;
        let events = [
            (1200, Acceleration { x: 6000, y: 800 }),
            (1210, Acceleration { x: 5900, y: 820 }),
            (1300, Acceleration { x: 0, y: 0 }),
            (2000, Proximity { front_left: 0, front_right: 0, left: 0, right: 5 }),
            (2200, Proximity { front_left: 1, front_right: 4, left: 0, right: 2 }),
            (2400, Proximity { front_left: 5, front_right: 5, left: 0, right: 0 }),
            (3200, Proximity { front_left: 0, front_right: 0, left: 0, right: 0 }),
            (3200, BorderLine { leftmost: true, rightmost: false }),
            (3300, BorderClear),
            (4500, BorderLine { leftmost: false, rightmost: true }),
            (4600, BorderClear),
            (6000, Abort),
        ]
        .into_iter()
        .map(|(at_ms, change)| ScriptedEvent { at_ms, change })
        .collect();
        Self {
            name: "demo".to_string(),
            events,
        }
    }
}

/// Replays a [`Scenario`] against a [`SimWorld`] as a round progresses.
pub struct ScenarioPlayer {
    events: Vec<ScriptedEvent>,
    next: usize,
}

impl ScenarioPlayer {
    pub fn new(scenario: &Scenario) -> Self {
        let mut events = scenario.events.clone();
        // Stable: events sharing a timestamp keep file order.
        events.sort_by_key(|e| e.at_ms);
        Self { events, next: 0 }
    }

    /// Apply every event due at or before `elapsed_ms`; returns how many ran.
    pub fn apply_due(&mut self, world: &SimWorld, elapsed_ms: u64) -> usize {
        let start = self.next;
        while let Some(event) = self.events.get(self.next) {
            if event.at_ms > elapsed_ms {
                break;
            }
            debug!(at_ms = event.at_ms, elapsed_ms, change = ?event.change, "scenario event");
            event.change.apply(world);
            self.next += 1;
        }
        self.next - start
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.events.len()
    }

    /// Rewind for another round.
    pub fn rewind(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringside_hal::Accelerometer;

    const EDGE_DANCE: &str = r#"
name = "edge dance"

[[event]]
at_ms = 600
kind = "border_clear"

[[event]]
at_ms = 500
kind = "border_line"
leftmost = true

[[event]]
at_ms = 700
kind = "proximity"
front_left = 5
front_right = 5

[[event]]
at_ms = 2000
kind = "abort"
"#;

    #[test]
    fn parses_toml_events() {
        let scenario = Scenario::from_toml_str(EDGE_DANCE).expect("valid scenario");
        assert_eq!(scenario.name, "edge dance");
        assert_eq!(scenario.events.len(), 4);
        assert_eq!(
            scenario.events[1],
            ScriptedEvent {
                at_ms: 500,
                change: SensorChange::BorderLine {
                    leftmost: true,
                    rightmost: false
                }
            }
        );
        assert_eq!(
            scenario.events[2].change,
            SensorChange::Proximity {
                front_left: 5,
                front_right: 5,
                left: 0,
                right: 0
            }
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Scenario::from_toml_str("[[event]]\nat_ms = 1\nkind = \"earthquake\"\n").unwrap_err();
        assert!(err.starts_with("Failed to parse scenario"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let err = Scenario::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.starts_with("Failed to read scenario"));
    }

    #[test]
    fn load_reads_a_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("edge.toml");
        std::fs::write(&path, EDGE_DANCE).expect("write");
        assert_eq!(Scenario::load(&path).expect("load").events.len(), 4);
    }

    #[test]
    fn player_applies_events_in_time_order() {
        let scenario = Scenario::from_toml_str(EDGE_DANCE).expect("valid scenario");
        let world = SimWorld::new();
        let mut player = ScenarioPlayer::new(&scenario);

        assert_eq!(player.apply_due(&world, 499), 0);
        assert_eq!(player.apply_due(&world, 550), 1);

        // The line is under the leftmost sensor now.
        let mut rig = world.rig();
        assert!(rig.read_border()[0] < 1000);

        assert_eq!(player.apply_due(&world, 700), 2);
        assert!(rig.read_border().iter().all(|v| *v >= 1000));
        assert!(!player.is_finished());

        assert_eq!(player.apply_due(&world, 5000), 1);
        assert!(player.is_finished());
        assert!(rig.abort_requested());

        player.rewind();
        assert!(!player.is_finished());
    }

    #[test]
    fn demo_is_ordered_and_ends_with_abort() {
        let demo = Scenario::demo();
        assert!(demo.events.windows(2).all(|w| w[0].at_ms <= w[1].at_ms));
        assert_eq!(demo.events.last().map(|e| e.change), Some(SensorChange::Abort));
    }

    #[test]
    fn acceleration_change_reaches_the_sensor() {
        let world = SimWorld::new();
        SensorChange::Acceleration { x: 12, y: -4 }.apply(&world);
        let mut accel = world.accelerometer();
        let raw = accel.read_raw();
        assert_eq!((raw.x, raw.y), (12, -4));
    }
}
