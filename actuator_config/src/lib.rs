#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the linear actuator controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Only `[device]` is mandatory; every other section has working defaults
//!   matching the reference board.
use std::path::Path;

use eyre::WrapErr;
use serde::Deserialize;

/// Largest raw value the board accepts in a command packet.
pub const MAX_RAW_VALUE: i32 = u16::MAX as i32;

#[derive(Debug, Deserialize)]
pub struct Device {
    /// Board index handed to the transport's `open` (1-based on the reference board).
    pub index: u8,
    /// Physical stroke length in millimetres.
    pub stroke_length_mm: f32,
    /// Encoder full-scale count.
    #[serde(default = "default_raw_full_scale")]
    pub raw_full_scale: u32,
}

fn default_raw_full_scale() -> u32 {
    1024
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Limits {
    pub position_min: i32,
    pub position_max: i32,
    pub velocity_min: i32,
    pub velocity_max: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            position_min: 50,
            position_max: 950,
            velocity_min: 100,
            velocity_max: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Settings {
    /// Settling tolerance in raw counts, also sent to the board at connect.
    pub accuracy: u16,
    pub default_velocity: i32,
    pub default_position: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accuracy: 5,
            default_velocity: 600,
            default_position: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    /// Sleep until the next cycle boundary (5 ms floor).
    #[default]
    Fixed,
    /// Cycle as fast as feedback allows.
    Uncapped,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    pub pacing: PacingMode,
    /// Target loop rate for fixed pacing.
    pub refresh_hz: u32,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            pacing: PacingMode::Fixed,
            refresh_hz: 60,
        }
    }
}

/// Default sweep endpoints used when the CLI asks to oscillate without bounds.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct OscillationCfg {
    pub min: i32,
    pub max: i32,
}

impl Default for OscillationCfg {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            min: limits.position_min,
            max: limits.position_max,
        }
    }
}

/// Optional board tuning registers written once at connect.
///
/// Values are forwarded untouched; the firmware decides what they mean.
#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(default)]
pub struct BoardTuning {
    pub retract_limit: Option<u16>,
    pub extend_limit: Option<u16>,
    pub movement_threshold: Option<u16>,
    pub stall_time: Option<u16>,
    pub pwm_threshold: Option<u16>,
    pub derivative_threshold: Option<u16>,
    pub derivative_maximum: Option<u16>,
    pub derivative_minimum: Option<u16>,
    pub pwm_maximum: Option<u16>,
    pub pwm_minimum: Option<u16>,
    pub proportional_gain: Option<u16>,
    pub derivative_gain: Option<u16>,
    pub average_rc: Option<u16>,
    pub average_adc: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Serial ports in board order; `device.index` picks one (1-based).
    pub ports: Vec<String>,
    pub baud_rate: u32,
    /// Max wait for a board reply before the read is treated as a timeout.
    pub read_timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            ports: vec!["/dev/ttyACM0".to_string()],
            baud_rate: 9600,
            read_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub device: Device,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub oscillation: OscillationCfg,
    #[serde(default)]
    pub board: BoardTuning,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if !self.device.stroke_length_mm.is_finite() || self.device.stroke_length_mm <= 0.0 {
            eyre::bail!("device.stroke_length_mm must be > 0");
        }
        if self.device.raw_full_scale == 0 {
            eyre::bail!("device.raw_full_scale must be > 0");
        }

        // Limits
        let l = &self.limits;
        if l.position_min >= l.position_max {
            eyre::bail!("limits.position_min must be < limits.position_max");
        }
        if l.velocity_min >= l.velocity_max {
            eyre::bail!("limits.velocity_min must be < limits.velocity_max");
        }
        for (name, v) in [
            ("limits.position_min", l.position_min),
            ("limits.position_max", l.position_max),
            ("limits.velocity_min", l.velocity_min),
            ("limits.velocity_max", l.velocity_max),
        ] {
            if !(0..=MAX_RAW_VALUE).contains(&v) {
                eyre::bail!("{name} must be in [0, {MAX_RAW_VALUE}]");
            }
        }

        // Settings
        if self.settings.accuracy == 0 {
            eyre::bail!("settings.accuracy must be >= 1");
        }

        // Runner
        if self.runner.refresh_hz == 0 {
            eyre::bail!("runner.refresh_hz must be > 0");
        }

        // Oscillation
        if self.oscillation.min >= self.oscillation.max {
            eyre::bail!("oscillation.min must be < oscillation.max");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {r:?}");
        }

        // Hardware
        if self.hardware.read_timeout_ms == 0 {
            eyre::bail!("hardware.read_timeout_ms must be >= 1");
        }
        if self.hardware.baud_rate == 0 {
            eyre::bail!("hardware.baud_rate must be > 0");
        }

        Ok(())
    }
}
