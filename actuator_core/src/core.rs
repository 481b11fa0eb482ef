//! The actuator control core (`ActuatorCore`).
//!
//! Owns every piece of mutable control state: connection state, oscillation
//! machine, velocity history and the last commanded speed. The runner drives
//! it from a single thread; tests can drive it directly one `step` at a time.

use std::sync::Arc;
use std::time::Instant;

use actuator_traits::{Clock, Transport};
use eyre::WrapErr;
use tracing::{debug, info, trace, warn};

use crate::command::Gateway;
use crate::config::{ActuatorSettings, BoardTuning};
use crate::error::{ActuatorError, Result};
use crate::limits::Limits;
use crate::oscillation::{Oscillator, settle_tolerance};
use crate::telemetry::{Event, Telemetry};
use crate::units::UnitConverter;
use crate::util::duration_ms;
use crate::velocity::VelocityEstimator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

pub(crate) type EventSink = Box<dyn Fn(Event) + Send>;

pub struct ActuatorCore<T: Transport> {
    pub(crate) gateway: Gateway<T>,
    pub(crate) limits: Limits,
    pub(crate) settings: ActuatorSettings,
    pub(crate) units: UnitConverter,
    pub(crate) tuning: BoardTuning,
    pub(crate) device_index: u8,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) state: ConnectionState,
    pub(crate) oscillator: Oscillator,
    pub(crate) estimator: VelocityEstimator,
    pub(crate) velocity_command: i32,
    pub(crate) last_raw: Option<u16>,
    pub(crate) event_sink: Option<EventSink>,
}

impl<T: Transport> core::fmt::Debug for ActuatorCore<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActuatorCore")
            .field("state", &self.state)
            .field("limits", &self.limits)
            .field("oscillator", &self.oscillator)
            .field("velocity_command", &self.velocity_command)
            .field("last_raw", &self.last_raw)
            .finish_non_exhaustive()
    }
}

fn not_connected() -> eyre::Report {
    eyre::Report::new(ActuatorError::State("not connected".into()))
}

impl<T: Transport> ActuatorCore<T> {
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn units(&self) -> &UnitConverter {
        &self.units
    }

    pub fn settings(&self) -> &ActuatorSettings {
        &self.settings
    }

    pub fn velocity_command(&self) -> i32 {
        self.velocity_command
    }

    pub fn transport(&self) -> &T {
        self.gateway.transport()
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    /// Replace the event sink. Events emitted with no sink are only logged.
    pub fn set_event_sink(&mut self, sink: impl Fn(Event) + Send + 'static) {
        self.event_sink = Some(Box::new(sink));
    }

    pub(crate) fn emit(&self, event: Event) {
        debug!(?event, "event");
        if let Some(sink) = &self.event_sink {
            sink(event);
        }
    }

    /// Open the board and apply connect-time settings.
    ///
    /// Idempotent while connected. On failure the state returns to
    /// `Disconnected`, `ConnectFailed` is emitted and a later call may retry.
    pub fn connect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            debug!("connect ignored: already connected");
            return Ok(());
        }
        self.state = ConnectionState::Connecting;

        let velocity = self.limits.clamp_velocity(self.settings.default_velocity);
        match self.connect_sequence(velocity) {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                self.velocity_command = velocity;
                self.estimator.reset();
                self.last_raw = None;
                self.epoch = self.clock.now();
                info!(
                    device_index = self.device_index,
                    accuracy = self.settings.accuracy,
                    velocity,
                    "actuator connected"
                );
                self.emit(Event::Connected);
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                let reason = format!("{e:#}");
                warn!(device_index = self.device_index, error = %reason, "connect failed");
                self.emit(Event::ConnectFailed(reason.clone()));
                Err(e.wrap_err(ActuatorError::Connection(reason)))
            }
        }
    }

    fn connect_sequence(&mut self, velocity: i32) -> Result<()> {
        self.gateway.open(self.device_index)?;
        self.gateway.set_accuracy(self.settings.accuracy)?;
        self.gateway
            .apply_tuning(&self.tuning)
            .wrap_err("board tuning")?;
        self.gateway.set_speed(velocity)?;
        self.gateway
            .set_position(self.limits.clamp_position(self.settings.default_position))?;
        Ok(())
    }

    /// Manual position command. Switches oscillation off first when active.
    pub fn set_position(&mut self, raw: i32) -> Result<()> {
        if !self.is_connected() {
            return Err(not_connected());
        }
        if self.oscillator.enabled {
            self.oscillator = self.oscillator.disabled();
            info!("oscillation stopped by manual position command");
            self.emit(Event::OscillationState(false));
        }
        let clamped = self.limits.clamp_position(raw);
        self.gateway.set_position(clamped)
    }

    pub fn set_velocity(&mut self, raw: i32) -> Result<()> {
        if !self.is_connected() {
            return Err(not_connected());
        }
        let clamped = self.limits.clamp_velocity(raw);
        self.gateway.set_speed(clamped)?;
        self.velocity_command = clamped;
        Ok(())
    }

    /// Switch oscillation on (bounds clamped then validated) or off.
    pub fn toggle_oscillation(&mut self, min: i32, max: i32) -> Result<()> {
        if !self.is_connected() {
            return Err(not_connected());
        }
        if self.oscillator.enabled {
            self.oscillator = self.oscillator.disabled();
            info!("oscillation stopped");
            self.emit(Event::OscillationState(false));
            return Ok(());
        }

        let position = match self.last_raw {
            Some(raw) => raw,
            None => self.gateway.get_feedback()?,
        };
        let (next, command) = self
            .oscillator
            .enabled_towards(min, max, i32::from(position), &self.limits)
            .map_err(eyre::Report::new)?;
        if let Some(target) = command {
            self.gateway.set_position(target)?;
        }
        self.oscillator = next;
        info!(min = next.min, max = next.max, "oscillation started");
        self.emit(Event::OscillationState(true));
        Ok(())
    }

    /// One control cycle: feedback, derived telemetry, one oscillation step.
    pub fn step(&mut self) -> Result<Telemetry> {
        if !self.is_connected() {
            return Err(not_connected());
        }
        let elapsed = self.clock.now().saturating_duration_since(self.epoch);
        let timestamp_ms = duration_ms(elapsed);
        let raw = self.gateway.get_feedback()?;
        let metric = self.units.raw_to_metric_position(i32::from(raw));
        let v = self.estimator.update(metric, elapsed);

        let tolerance = settle_tolerance(self.settings.accuracy);
        let (next, command) = self.oscillator.advance(i32::from(raw), tolerance);
        if let Some(target) = command {
            self.gateway
                .set_position(target)
                .wrap_err("oscillation command")?;
            debug!(target, state = ?next.state(), "oscillation redirect");
        }
        self.oscillator = next;
        self.last_raw = Some(raw);

        let telemetry = Telemetry {
            dt_ms: v.dt_ms,
            timestamp_ms,
            raw_position: raw,
            metric_position_mm: metric,
            raw_velocity: self.velocity_command,
            metric_velocity_percent: self
                .units
                .raw_to_metric_velocity_percent(self.velocity_command),
            real_velocity_mm_per_ms: v.mm_per_ms,
            oscillation_active: self.oscillator.enabled,
        };
        trace!(
            raw,
            mm = metric,
            dt_ms = v.dt_ms,
            mm_per_ms = v.mm_per_ms,
            oscillating = telemetry.oscillation_active,
            "cycle"
        );
        Ok(telemetry)
    }
}
