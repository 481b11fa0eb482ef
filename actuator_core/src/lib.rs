#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core actuator control logic (hardware-agnostic).
//!
//! All board interaction goes through `actuator_traits::Transport`.
//!
//! ## Architecture
//!
//! - **Limits**: clamping of every raw position/velocity (`limits` module)
//! - **Units**: raw counts to millimetres and speed percent (`units` module)
//! - **Velocity**: real velocity from consecutive samples (`velocity` module)
//! - **Oscillation**: autonomous endpoint sweeps (`oscillation` module)
//! - **Gateway**: one logical command per `(code, value)` pair (`command` module)
//! - **Core**: connection state and the per-cycle step (`ActuatorCore`)
//! - **Runner**: dedicated loop thread with command/event/telemetry channels
//!
//! Raw values are `i32` counts until they reach the gateway, which writes
//! them as the board's 16-bit field.

pub mod builder;
pub mod command;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod hw_error;
pub mod limits;
pub mod mocks;
pub mod oscillation;
pub mod runner;
pub mod telemetry;
pub mod units;
pub mod util;
pub mod velocity;

pub use crate::builder::{ActuatorBuilder, Missing, Set};
pub use crate::config::{ActuatorSettings, BoardTuning, Pacing};
pub use crate::core::{ActuatorCore, ConnectionState};
pub use crate::error::{ActuatorError, BuildError, Result};
pub use crate::limits::Limits;
pub use crate::oscillation::{OscillationState, Oscillator};
pub use crate::runner::{ActuatorHandle, Command, CycleStats, RunReport, spawn};
pub use crate::telemetry::{Event, Telemetry};
pub use crate::units::UnitConverter;
pub use crate::velocity::{VelocityEstimator, VelocitySample};
