//! Control-loop thread lifecycle: connect, telemetry, faults and shutdown.

use std::time::{Duration, Instant};

use actuator_core::{ActuatorBuilder, ActuatorHandle, Event, Pacing, spawn};
use actuator_hardware::SimulatedActuator;
use crossbeam_channel::Receiver;
use rstest::rstest;

const WAIT: Duration = Duration::from_secs(2);

fn start(sim: SimulatedActuator, pacing: Pacing) -> ActuatorHandle {
    let core = ActuatorBuilder::new()
        .with_transport(sim)
        .build()
        .expect("build core");
    spawn(core, pacing)
}

/// Wait for the first event matching `pred`, returning everything seen so far.
fn wait_for(events: &Receiver<Event>, pred: impl Fn(&Event) -> bool) -> Vec<Event> {
    let deadline = Instant::now() + WAIT;
    let mut seen = Vec::new();
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match events.recv_timeout(left) {
            Ok(e) => {
                let hit = pred(&e);
                seen.push(e);
                if hit {
                    return seen;
                }
            }
            Err(_) => break,
        }
    }
    panic!("event not seen; got {seen:?}");
}

#[rstest]
#[case(Pacing::fixed_hz(200))]
#[case(Pacing::Uncapped)]
fn connect_streams_telemetry_then_shuts_down(#[case] pacing: Pacing) {
    let sim = SimulatedActuator::new().with_initial_position(200);
    let monitor = sim.monitor();
    let handle = start(sim, pacing);
    let events = handle.events().clone();

    handle.connect().unwrap();
    wait_for(&events, |e| *e == Event::Connected);

    let t = handle.wait_telemetry(WAIT).expect("telemetry");
    assert!(t.raw_position >= 200);
    assert_eq!(t.raw_velocity, 600);

    let report = handle.shutdown().expect("clean shutdown");
    assert!(report.stats.cycles > 0);
    assert!(report.fault.is_none());
    assert!(monitor.is_open());
    wait_for(&events, |e| *e == Event::LoopFinished);
}

#[rstest]
fn commands_reach_the_board_at_cycle_boundaries() {
    let sim = SimulatedActuator::new().with_initial_position(500);
    let monitor = sim.monitor();
    let handle = start(sim, Pacing::fixed_hz(200));
    let events = handle.events().clone();

    handle.connect().unwrap();
    wait_for(&events, |e| *e == Event::Connected);
    handle.set_velocity(2000).unwrap();
    handle.toggle_oscillation(100, 900).unwrap();
    wait_for(&events, |e| *e == Event::OscillationState(true));
    handle.set_position(300).unwrap();
    wait_for(&events, |e| *e == Event::OscillationState(false));
    drop(handle);

    let speeds = monitor.writes_of(actuator_traits::CommandCode::SetSpeed);
    assert_eq!(speeds, vec![600, 1000]);
    assert_eq!(monitor.target(), 300);
}

#[rstest]
fn transport_fault_ends_loop_with_fault_then_finished() {
    let sim = SimulatedActuator::new().with_feedback_failure_after(3);
    let handle = start(sim, Pacing::fixed_hz(200));
    let events = handle.events().clone();

    handle.connect().unwrap();
    let seen = wait_for(&events, |e| *e == Event::LoopFinished);
    let n = seen.len();
    assert!(n >= 2, "{seen:?}");
    match &seen[n - 2] {
        Event::LoopFault(reason) => assert!(reason.contains("timeout"), "{reason}"),
        other => panic!("expected LoopFault before LoopFinished, got {other:?}"),
    }

    let deadline = Instant::now() + WAIT;
    while !handle.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    let report = handle.shutdown().unwrap();
    assert_eq!(report.stats.cycles, 3);
    assert!(report.fault.is_some());
}

#[rstest]
fn failed_connect_keeps_loop_alive_and_rejects_commands() {
    let sim = SimulatedActuator::new().with_failed_open();
    let handle = start(sim, Pacing::default());
    let events = handle.events().clone();

    handle.connect().unwrap();
    wait_for(&events, |e| matches!(e, Event::ConnectFailed(_)));
    handle.set_position(400).unwrap();
    let seen = wait_for(&events, |e| matches!(e, Event::CommandRejected(_)));
    assert!(matches!(seen.last(), Some(Event::CommandRejected(r)) if r.contains("not connected")));
    assert!(!handle.is_finished());
    assert!(handle.latest_telemetry().is_none());
}

#[rstest]
fn invalid_bounds_are_reported_not_fatal() {
    let handle = start(SimulatedActuator::new(), Pacing::fixed_hz(200));
    let events = handle.events().clone();
    handle.connect().unwrap();
    wait_for(&events, |e| *e == Event::Connected);
    handle.toggle_oscillation(900, 100).unwrap();
    wait_for(&events, |e| matches!(e, Event::CommandRejected(_)));
    assert!(handle.wait_telemetry(WAIT).is_some(), "loop keeps cycling");
}

#[test]
fn dropping_handle_joins_thread() {
    for _ in 0..10 {
        let handle = start(SimulatedActuator::new(), Pacing::fixed_hz(100));
        handle.connect().unwrap();
        std::thread::sleep(Duration::from_millis(5));
        drop(handle);
    }
}

#[rstest]
fn uncapped_sweep_reports_real_velocity() {
    let sim = SimulatedActuator::new().with_initial_position(500);
    let handle = start(sim, Pacing::Uncapped);
    let events = handle.events().clone();

    handle.connect().unwrap();
    wait_for(&events, |e| *e == Event::Connected);
    handle.toggle_oscillation(50, 950).unwrap();
    wait_for(&events, |e| *e == Event::OscillationState(true));

    let samples: Vec<_> = (0..40)
        .filter_map(|_| {
            std::thread::sleep(Duration::from_millis(1));
            handle.wait_telemetry(WAIT)
        })
        .collect();
    assert_eq!(samples.len(), 40);
    // Cycles are far shorter than a millisecond, yet the rod is moving.
    let moving = samples.iter().filter(|t| t.real_velocity_mm_per_ms != 0.0).count();
    assert!(moving > samples.len() / 2, "only {moving} of {} snapshots moving", samples.len());
    assert!(samples.iter().all(|t| t.real_velocity_mm_per_ms.is_finite()));
}
