use actuator_core::mocks::{ScriptedTransport, Trace, TraceLog};
use actuator_core::{
    ActuatorBuilder, ActuatorCore, ActuatorError, ActuatorSettings, Event, Limits,
    OscillationState, Oscillator,
};
use actuator_hardware::SimulatedActuator;
use actuator_traits::{CommandCode, ManualClock};
use proptest::prelude::*;
use rstest::rstest;
use std::time::Duration;

fn scripted(feedback: &[u16], accuracy: u16, log: &TraceLog) -> ActuatorCore<ScriptedTransport> {
    let mut core = ActuatorBuilder::new()
        .with_transport(
            ScriptedTransport::new()
                .with_feedback(feedback.iter().copied())
                .with_log(log.clone()),
        )
        .with_settings(ActuatorSettings {
            accuracy,
            ..ActuatorSettings::default()
        })
        .with_event_sink(log.sink())
        .with_clock(Box::new(ManualClock::new()))
        .build()
        .unwrap();
    core.connect().unwrap();
    core
}

fn position_writes(log: &TraceLog) -> Vec<u16> {
    log.writes()
        .into_iter()
        .filter(|(c, _)| *c == CommandCode::SetPosition.code())
        .map(|(_, v)| v)
        .collect()
}

#[rstest]
fn settling_at_max_redirects_on_next_cycle() {
    let log = TraceLog::default();
    // toggle read, then two cycles parked 4 counts short of max
    let mut core = scripted(&[100, 946, 946], 10, &log);
    core.toggle_oscillation(50, 950).unwrap();
    assert_eq!(position_writes(&log), vec![500, 950]);
    assert!(core.oscillator().is_moving);

    core.step().unwrap();
    assert!(!core.oscillator().is_moving, "within accuracy/2 of max");
    assert!(core.oscillator().max_endpoint_reached);
    assert_eq!(position_writes(&log), vec![500, 950]);

    core.step().unwrap();
    assert_eq!(position_writes(&log), vec![500, 950, 50]);
    assert_eq!(core.oscillator().state(), OscillationState::SweepingToMin);
}

#[rstest]
fn settling_outside_tolerance_keeps_moving() {
    let log = TraceLog::default();
    let mut core = scripted(&[100, 944, 944], 10, &log);
    core.toggle_oscillation(50, 950).unwrap();
    core.step().unwrap();
    core.step().unwrap();
    assert!(core.oscillator().is_moving);
    assert_eq!(position_writes(&log), vec![500, 950]);
}

#[rstest]
fn arrival_at_min_clears_max_reached() {
    let log = TraceLog::default();
    let mut core = scripted(&[900, 52, 52], 5, &log);
    core.toggle_oscillation(50, 950).unwrap();
    assert_eq!(core.oscillator().state(), OscillationState::SweepingToMin);
    core.step().unwrap();
    assert!(!core.oscillator().is_moving);
    assert!(!core.oscillator().max_endpoint_reached);
    core.step().unwrap();
    assert_eq!(position_writes(&log), vec![500, 50, 950]);
}

#[rstest]
fn toggling_twice_returns_to_disabled() {
    let log = TraceLog::default();
    let mut core = scripted(&[500], 5, &log);
    core.toggle_oscillation(100, 900).unwrap();
    core.toggle_oscillation(100, 900).unwrap();
    assert!(!core.oscillator().enabled);
    assert_eq!(core.oscillator().state(), OscillationState::Idle);
    assert_eq!(
        log.events(),
        vec![
            Event::Connected,
            Event::OscillationState(true),
            Event::OscillationState(false),
        ]
    );

    // No automatic commands once off.
    let before = position_writes(&log);
    for _ in 0..5 {
        assert!(!core.step().unwrap().oscillation_active);
    }
    assert_eq!(position_writes(&log), before);
}

#[rstest]
fn manual_position_disables_oscillation_before_writing() {
    let log = TraceLog::default();
    let mut core = scripted(&[300], 5, &log);
    core.toggle_oscillation(50, 950).unwrap();
    core.set_position(500).unwrap();

    let entries = log.entries();
    let disabled_at = entries
        .iter()
        .position(|t| *t == Trace::Event(Event::OscillationState(false)))
        .expect("disabled notification");
    let manual_at = entries
        .iter()
        .rposition(|t| *t == Trace::Write(0x20, 500))
        .expect("manual write");
    assert!(disabled_at < manual_at, "{entries:?}");
    assert!(!core.oscillator().enabled);
}

#[rstest]
#[case(950, 50)]
#[case(500, 500)]
#[case(960, 2000)]
fn invalid_bounds_are_rejected_without_side_effects(#[case] min: i32, #[case] max: i32) {
    let log = TraceLog::default();
    let mut core = scripted(&[500], 5, &log);
    let before = *core.oscillator();
    let writes = position_writes(&log);

    let err = core.toggle_oscillation(min, max).expect_err("must reject");
    assert!(matches!(
        err.downcast_ref::<ActuatorError>(),
        Some(ActuatorError::InvalidBounds { .. })
    ));
    assert_eq!(*core.oscillator(), before);
    assert_eq!(position_writes(&log), writes);
    assert_eq!(log.events(), vec![Event::Connected]);
}

#[rstest]
fn pure_machine_settles_then_redirects() {
    let limits = Limits::default();
    let (o, cmd) = Oscillator::new(&limits)
        .enabled_towards(50, 950, 100, &limits)
        .unwrap();
    assert_eq!(cmd, Some(950));
    let (o, cmd) = o.advance(946, 5);
    assert_eq!(cmd, None);
    assert!(!o.is_moving);
    let (o, cmd) = o.advance(946, 5);
    assert_eq!(cmd, Some(50));
    assert!(o.is_moving);
}

/// Drive a simulated board and return the oscillation position commands.
fn sweep_with_sim(min: i32, max: i32, start: u16, velocity: i32, cycles: usize) -> Vec<u16> {
    let sim = SimulatedActuator::new().with_initial_position(start);
    let monitor = sim.monitor();
    let mut core = ActuatorBuilder::new()
        .with_transport(sim)
        .with_settings(ActuatorSettings {
            accuracy: 5,
            default_velocity: velocity,
            default_position: i32::from(start),
        })
        .with_clock(Box::new(ManualClock::new()))
        .build()
        .unwrap();
    core.connect().unwrap();
    let connect_writes = monitor.writes_of(CommandCode::SetPosition).len();
    core.toggle_oscillation(min, max).unwrap();
    for _ in 0..cycles {
        let t = core.step().unwrap();
        assert!(t.oscillation_active);
    }
    monitor.writes_of(CommandCode::SetPosition)[connect_writes..].to_vec()
}

#[rstest]
fn sweeps_alternate_between_endpoints_on_simulated_board() {
    let writes = sweep_with_sim(100, 900, 500, 1000, 400);
    assert!(writes.len() >= 4, "{writes:?}");
    for pair in writes.chunks(2) {
        assert_eq!(pair[0], 900);
        if let Some(second) = pair.get(1) {
            assert_eq!(*second, 100);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn commanded_positions_alternate_within_bounds(
        min in 50i32..900,
        span in 1i32..900,
        start in 50u16..=950,
        velocity in 100i32..=1000,
    ) {
        let max = (min + span).min(950);
        prop_assume!(min < max);
        let writes = sweep_with_sim(min, max, start, velocity, 300);
        prop_assert!(!writes.is_empty());
        for w in &writes {
            prop_assert!(i32::from(*w) == min || i32::from(*w) == max, "{w} not an endpoint");
        }
        for pair in writes.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
    }
}

#[test]
fn clock_advances_between_cycles_feed_velocity() {
    let clock = ManualClock::new();
    let mut core = ActuatorBuilder::new()
        .with_transport(ScriptedTransport::new().with_feedback([0, 1024]))
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    core.connect().unwrap();
    let first = core.step().unwrap();
    assert_eq!(first.dt_ms, 0);
    assert_eq!(first.real_velocity_mm_per_ms, 0.0);

    clock.advance(Duration::from_millis(16));
    let second = core.step().unwrap();
    assert_eq!(second.dt_ms, 16);
    assert!((second.metric_position_mm - 100.0).abs() < 1e-9);
    assert!((second.real_velocity_mm_per_ms - 6.25).abs() < 1e-9);
    assert_eq!(second.raw_velocity, 600);
}
