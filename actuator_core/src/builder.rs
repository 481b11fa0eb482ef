//! Type-state builder for `ActuatorCore`.
//!
//! The builder enforces at compile time that a transport is provided before
//! `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use actuator_traits::{Clock, MonotonicClock, Transport};

use crate::command::Gateway;
use crate::config::{ActuatorSettings, BoardTuning};
use crate::core::{ActuatorCore, ConnectionState, EventSink};
use crate::error::{BuildError, Result};
use crate::limits::Limits;
use crate::mocks::NoTransport;
use crate::oscillation::Oscillator;
use crate::telemetry::Event;
use crate::units::UnitConverter;
use crate::velocity::VelocityEstimator;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `ActuatorCore`. All fields are validated on `build()`.
pub struct ActuatorBuilder<S, T> {
    transport: Option<T>,
    limits: Option<Limits>,
    settings: Option<ActuatorSettings>,
    units: Option<UnitConverter>,
    tuning: Option<BoardTuning>,
    device_index: Option<u8>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    event_sink: Option<EventSink>,
    _s: PhantomData<S>,
}

impl Default for ActuatorBuilder<Missing, NoTransport> {
    fn default() -> Self {
        Self {
            transport: None,
            limits: None,
            settings: None,
            units: None,
            tuning: None,
            device_index: None,
            clock: None,
            event_sink: None,
            _s: PhantomData,
        }
    }
}

impl ActuatorBuilder<Missing, NoTransport> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Validate configuration and construct an `ActuatorCore`.
///
/// This is the single source of truth for validation and construction.
#[allow(clippy::too_many_arguments)]
fn validate_and_build<T: Transport>(
    transport: T,
    limits: Limits,
    settings: ActuatorSettings,
    units: UnitConverter,
    tuning: BoardTuning,
    device_index: u8,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    event_sink: Option<EventSink>,
) -> Result<ActuatorCore<T>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if settings.accuracy == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "accuracy must be >= 1",
        )));
    }
    let stroke = units.stroke_length_mm();
    if !stroke.is_finite() || stroke <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stroke_length_mm must be > 0",
        )));
    }
    if units.raw_full_scale() <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "raw_full_scale must be > 0",
        )));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let epoch = clock.now();

    Ok(ActuatorCore {
        gateway: Gateway::new(transport),
        oscillator: Oscillator::new(&limits),
        velocity_command: limits.clamp_velocity(settings.default_velocity),
        limits,
        settings,
        units,
        tuning,
        device_index,
        clock,
        epoch,
        state: ConnectionState::Disconnected,
        estimator: VelocityEstimator::new(),
        last_raw: None,
        event_sink,
    })
}

impl<S, T: Transport> ActuatorBuilder<S, T> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<ActuatorCore<T>> {
        let transport = self
            .transport
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTransport))?;
        validate_and_build(
            transport,
            self.limits.unwrap_or_default(),
            self.settings.unwrap_or_default(),
            self.units.unwrap_or_default(),
            self.tuning.unwrap_or_default(),
            self.device_index.unwrap_or(1),
            self.clock,
            self.event_sink,
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<S, T> ActuatorBuilder<S, T> {
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }
    pub fn with_settings(mut self, settings: ActuatorSettings) -> Self {
        self.settings = Some(settings);
        self
    }
    pub fn with_units(mut self, units: UnitConverter) -> Self {
        self.units = Some(units);
        self
    }
    pub fn with_tuning(mut self, tuning: BoardTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }
    /// Board index handed to `Transport::open`; defaults to 1.
    pub fn with_device_index(mut self, index: u8) -> Self {
        self.device_index = Some(index);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_event_sink<F>(mut self, f: F) -> Self
    where
        F: Fn(Event) + Send + 'static,
    {
        self.event_sink = Some(Box::new(f));
        self
    }
}

// Setter that advances type-state
impl<T> ActuatorBuilder<Missing, T> {
    pub fn with_transport<U: Transport>(self, transport: U) -> ActuatorBuilder<Set, U> {
        ActuatorBuilder {
            transport: Some(transport),
            limits: self.limits,
            settings: self.settings,
            units: self.units,
            tuning: self.tuning,
            device_index: self.device_index,
            clock: self.clock,
            event_sink: self.event_sink,
            _s: PhantomData,
        }
    }
}

impl<T: Transport> ActuatorBuilder<Set, T> {
    /// Validate and build. Only available once a transport is set.
    pub fn build(self) -> Result<ActuatorCore<T>> {
        self.try_build()
    }
}
