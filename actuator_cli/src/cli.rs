//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "actuator", version, about = "Linear actuator controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/actuator_config.toml")]
    pub config: PathBuf,

    /// Telemetry, events and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides RUST_LOG and [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Cycle pacing override.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum PacingArg {
    /// Sleep to the configured refresh rate
    Fixed,
    /// Cycle as fast as the board answers
    Uncapped,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect, apply the given commands and stream telemetry
    Run {
        /// Raw speed to command after connect (clamped to the velocity limits)
        #[arg(long, allow_negative_numbers = true)]
        velocity: Option<i32>,
        /// Raw position to command after connect (clamped to the position limits)
        #[arg(long, allow_negative_numbers = true)]
        position: Option<i32>,
        /// Start oscillating between MIN and MAX; without values uses [oscillation]
        #[arg(
            long,
            num_args = 0..=2,
            value_names = ["MIN", "MAX"],
            allow_negative_numbers = true
        )]
        oscillate: Option<Vec<i32>>,
        /// Stop after this many milliseconds (default: until Ctrl-C)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Minimum spacing between printed telemetry lines
        #[arg(long, value_name = "MS", default_value_t = 100)]
        print_every_ms: u64,
        /// Override [runner].pacing
        #[arg(long, value_enum, value_name = "MODE")]
        pacing: Option<PacingArg>,
        /// Print control loop timing stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Open the board and read its position once
    SelfCheck,
}
