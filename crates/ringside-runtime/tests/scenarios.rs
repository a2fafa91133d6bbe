//! End-to-end scenarios: the full control loop over the simulated rig.

use ringside_hal::sim::SimWorld;
use ringside_runtime::{ControlLoop, ForwardSpeedProfile, MotionController, RoundOutcome};
use ringside_types::{AlertEffect, Branch, Decision, MotorCommand, ProximityCounts, Side, Tuning};

fn started_loop() -> (SimWorld, ControlLoop) {
    let world = SimWorld::new();
    let mut control = ControlLoop::new(
        world.rig(),
        world.accelerometer(),
        MotionController::with_seed(Tuning::default(), 42),
    )
    .expect("default tuning is valid");
    control.await_start().expect("sim start succeeds");
    world.clear_logs();
    (world, control)
}

#[test]
fn left_border_triggers_a_right_turn_and_resumes_at_search_speed() {
    let (world, mut control) = started_loop();

    // Get into contact first so losing it is observable.
    world.set_proximity(ProximityCounts::new(5, 5, 0, 0));
    control.cycle().unwrap();
    assert!(control.controller().state().in_contact);
    assert_eq!(control.controller().forward_speed(), 400);

    world.set_proximity(ProximityCounts::default());
    world.set_border_line(true, false);
    let loop_start = world.now_ms();
    let decision = control.cycle().unwrap();

    assert_eq!(
        decision.branch,
        Branch::BorderTurn {
            border: Side::Left,
            toward: Side::Right
        }
    );

    let stats = control.controller().stats();
    assert_eq!(stats.contacts_lost, 1);
    assert_eq!(stats.border_turns, 1);

    let state = control.controller().state();
    assert!(!state.in_contact);
    assert!(!state.ahead);
    assert_eq!(state.forward_speed, ForwardSpeedProfile::Search);

    // Reverse, pivot right, then straight at the (now Search) forward speed.
    let turn: Vec<(u64, MotorCommand)> = world
        .motor_log()
        .into_iter()
        .filter(|(t, _)| *t >= loop_start)
        .collect();
    assert_eq!(turn.len(), 3);
    assert_eq!(turn[0], (loop_start, MotorCommand::straight(-200)));
    assert_eq!(turn[1].1, MotorCommand::new(200, -200));
    assert_eq!(turn[2].1, MotorCommand::straight(200));
    assert_eq!(decision.command, MotorCommand::straight(200));

    // last turn time is the maneuver's end, not the loop start.
    assert_eq!(state.last_turn_ms, Some(turn[2].0));
    assert!(turn[2].0 > loop_start);
}

#[test]
fn right_border_turns_left() {
    let (world, mut control) = started_loop();
    world.set_border_line(false, true);
    let decision = control.cycle().unwrap();
    assert_eq!(
        decision.branch,
        Branch::BorderTurn {
            border: Side::Right,
            toward: Side::Left
        }
    );
    let log = world.motor_log();
    assert_eq!(log[1].1, MotorCommand::new(-200, 200));
}

#[test]
fn opponent_ahead_triggers_berserker() {
    let (world, mut control) = started_loop();
    world.set_proximity(ProximityCounts::new(5, 5, 0, 0));
    let now = world.now_ms();

    let decision = control.cycle().unwrap();

    assert_eq!(decision.branch, Branch::Charge);
    assert_eq!(decision.command, MotorCommand::new(400, 400));
    let state = control.controller().state();
    assert!(state.in_contact);
    assert!(state.ahead);
    assert_eq!(state.contact_made_ms, Some(now));
    assert_eq!(world.alerts(), vec![AlertEffect::Charge]);
}

#[test]
fn search_slows_after_one_second_without_a_target() {
    let (world, mut control) = started_loop();
    let start = world.now_ms();

    let mut decisions: Vec<Decision> = Vec::new();
    while world.now_ms() < start + 1200 {
        decisions.push(control.cycle().unwrap());
    }

    let pivot = MotorCommand::new(300, -300);
    let slowed = MotorCommand::new(150, -150);
    for d in &decisions {
        let elapsed = d.at_ms - start;
        if elapsed <= 1000 {
            assert_eq!(d.branch, Branch::Search { slowed: false }, "at +{elapsed} ms");
            assert_eq!(d.command, pivot);
        } else {
            assert_eq!(d.branch, Branch::Search { slowed: true }, "at +{elapsed} ms");
            assert_eq!(d.command, slowed);
        }
    }
    assert!(decisions.iter().any(|d| d.command == slowed));
}

#[test]
fn hard_hit_fires_contact_once_filters_fill() {
    let (world, mut control) = started_loop();

    // Each frame differs so every read reaches the filters.
    for (i, x) in [3000i16, 3010, 3020].into_iter().enumerate() {
        world.set_acceleration(x, 0);
        let d = control.cycle().unwrap();
        if i == 0 {
            // avg = 3000 after one sample: already above 2400.
            assert_eq!(d.branch, Branch::Contact);
        }
    }
    assert_eq!(control.controller().stats().contacts_made, 1);
}

#[test]
fn repeated_accelerometer_frames_do_not_refill_the_filters() {
    let (world, mut control) = started_loop();
    world.set_acceleration(100, 100);
    for _ in 0..10 {
        control.cycle().unwrap();
    }
    assert_eq!(control.monitor().filter_counts(), (1, 1));
}

#[test]
fn contact_suppressed_right_after_a_turn() {
    let (world, mut control) = started_loop();
    world.set_border_line(true, false);
    control.cycle().unwrap();
    world.clear_border();

    // Jolt right after the turn: inside the 400 ms lockout.
    world.set_acceleration(5000, 5000);
    let d = control.cycle().unwrap();
    let threshold = Tuning::default().accel_threshold_squared();
    assert!(control.monitor().smoothed_squared_magnitude() > threshold);
    assert_ne!(d.branch, Branch::Contact);

    // Still shaking once the lockout has passed: contact.
    world.advance(400);
    world.set_acceleration(5001, 5000);
    let d = control.cycle().unwrap();
    assert_eq!(d.branch, Branch::Contact);
}

#[test]
fn abort_returns_to_awaiting_start_and_next_round_is_fresh() {
    let (world, mut control) = started_loop();
    world.set_proximity(ProximityCounts::new(5, 5, 0, 0));
    let handle = world.clone();
    let report = control
        .run_round(None, |d| {
            if d.at_ms >= 5100 {
                handle.request_abort();
            }
        })
        .unwrap();
    assert_eq!(report.outcome, RoundOutcome::Aborted);
    assert_eq!(report.stats.contacts_made, 1);

    control.await_start().unwrap();
    assert_eq!(world.start_presses(), 2);
    assert!(!control.controller().state().in_contact);
    assert_eq!(control.controller().stats().contacts_made, 0);
    assert_eq!(control.monitor().filter_counts(), (0, 0));
}
