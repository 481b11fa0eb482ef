use actuator_core::error::BuildError;
use actuator_core::mocks::ScriptedTransport;
use actuator_core::{ActuatorBuilder, ActuatorSettings, ConnectionState, Limits, UnitConverter};
use rstest::rstest;

#[rstest]
fn builder_missing_transport_yields_typed_build_error() {
    let err = ActuatorBuilder::new()
        .with_limits(Limits::default())
        .try_build()
        .expect_err("should fail with MissingTransport");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingTransport) => {}
        other => panic!("expected MissingTransport, got: {other:?}"),
    }
}

#[rstest]
fn zero_accuracy_is_rejected() {
    let err = ActuatorBuilder::new()
        .with_transport(ScriptedTransport::new())
        .with_settings(ActuatorSettings {
            accuracy: 0,
            ..ActuatorSettings::default()
        })
        .build()
        .expect_err("accuracy 0 must be rejected");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(m)) if m.contains("accuracy")
    ));
}

#[rstest]
#[case(0.0)]
#[case(-1.0)]
#[case(f64::NAN)]
fn non_positive_stroke_is_rejected(#[case] stroke: f64) {
    let err = ActuatorBuilder::new()
        .with_transport(ScriptedTransport::new())
        .with_units(UnitConverter::new(stroke, 1024))
        .build()
        .expect_err("stroke must be > 0");
    assert!(format!("{err}").contains("stroke_length_mm"));
}

#[rstest]
fn zero_full_scale_is_rejected() {
    let err = ActuatorBuilder::new()
        .with_transport(ScriptedTransport::new())
        .with_units(UnitConverter::new(100.0, 0))
        .build()
        .expect_err("full scale must be > 0");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(m)) if m.contains("raw_full_scale")
    ));
}

#[rstest]
#[case(950, 50, 100, 1000)]
#[case(500, 500, 100, 1000)]
#[case(50, 950, 1000, 100)]
fn inverted_limits_are_rejected(
    #[case] pmin: i32,
    #[case] pmax: i32,
    #[case] vmin: i32,
    #[case] vmax: i32,
) {
    assert!(matches!(
        Limits::new(pmin, pmax, vmin, vmax),
        Err(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn built_core_starts_disconnected_with_idle_oscillation() {
    let core = ActuatorBuilder::new()
        .with_transport(ScriptedTransport::new())
        .build()
        .expect("defaults build");
    assert_eq!(core.connection_state(), ConnectionState::Disconnected);
    assert!(!core.oscillator().enabled);
    assert_eq!((core.oscillator().min, core.oscillator().max), (50, 950));
}
