#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Command-line front-end for the linear actuator controller.

mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use actuator_core::error::{ActuatorError, Result};
use actuator_core::{ActuatorBuilder, Limits};
use actuator_traits::Transport;
use clap::Parser;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::{RunArgs, oscillation_bounds, pacing_for, run_session, self_check};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn config_error(e: &eyre::Report) -> eyre::Report {
    eyre::Report::new(ActuatorError::Config(format!("{e:#}")))
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = actuator_config::load_file(&cli.config).map_err(|e| config_error(&e))?;
    init_tracing(&cli, &cfg.logging)?;
    tracing::info!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Commands::SelfCheck => {
            let transport = make_transport(&cfg);
            self_check(
                transport,
                cfg.device.index,
                &(&cfg.device).into(),
                cli.json,
            )?;
            Ok(())
        }
        Commands::Run {
            velocity,
            position,
            oscillate,
            duration_ms,
            print_every_ms,
            pacing,
            stats,
        } => {
            let args = RunArgs {
                velocity,
                position,
                oscillate: oscillation_bounds(oscillate.as_deref(), &cfg.oscillation)?,
                duration: duration_ms.map(Duration::from_millis),
                print_every: Duration::from_millis(print_every_ms),
                stats,
                json: cli.json,
            };
            let limits = Limits::try_from(&cfg.limits).map_err(eyre::Report::new)?;
            let core = ActuatorBuilder::new()
                .with_limits(limits)
                .with_settings((&cfg.settings).into())
                .with_units((&cfg.device).into())
                .with_tuning((&cfg.board).into())
                .with_device_index(cfg.device.index)
                .with_transport(make_transport(&cfg))
                .build()?;

            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = shutdown.clone();
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .map_err(|e| eyre::eyre!("install Ctrl-C handler: {e}"))?;
            }

            let report = run_session(core, pacing_for(&cfg.runner, pacing), &args, &shutdown)?;
            tracing::info!(cycles = report.stats.cycles, "run complete");
            Ok(())
        }
    }
}

/// Console logging to stderr plus an optional JSON file from `[logging]`.
///
/// Level precedence: `--log-level`, then `RUST_LOG`, then `[logging].level`, then `info`.
fn init_tracing(cli: &Cli, logging: &actuator_config::Logging) -> Result<()> {
    let filter = match (&cli.log_level, EnvFilter::try_from_default_env()) {
        (Some(level), _) => EnvFilter::try_new(level),
        (None, Ok(env)) => Ok(env),
        (None, Err(_)) => EnvFilter::try_new(logging.level.as_deref().unwrap_or("info")),
    }
    .map_err(|e| eyre::Report::new(ActuatorError::Config(format!("log level: {e}"))))?;

    let console = if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map_or_else(|| "actuator.log".into(), |n| n.to_os_string());
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("install tracing subscriber: {e}"))
}

/// The board link for this build: serial with `hardware`, otherwise the simulator.
#[cfg(feature = "hardware")]
fn make_transport(cfg: &actuator_config::Config) -> Box<dyn Transport + Send> {
    Box::new(actuator_hardware::serial::serial_transport(
        cfg.hardware.ports.clone(),
        cfg.hardware.baud_rate,
        Duration::from_millis(cfg.hardware.read_timeout_ms),
    ))
}

/// The board link for this build: serial with `hardware`, otherwise the simulator.
///
/// `ACTUATOR_TEST_SIM_NO_DEVICE` makes `open` fail; `ACTUATOR_TEST_SIM_FAIL_AFTER=N`
/// lets N feedback reads succeed and times out the rest.
#[cfg(not(feature = "hardware"))]
fn make_transport(cfg: &actuator_config::Config) -> Box<dyn Transport + Send> {
    let mut sim = actuator_hardware::SimulatedActuator::new();
    if std::env::var_os("ACTUATOR_TEST_SIM_NO_DEVICE").is_some() {
        sim = sim.with_failed_open();
    }
    if let Some(n) = std::env::var("ACTUATOR_TEST_SIM_FAIL_AFTER")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        sim = sim.with_feedback_failure_after(n);
    }
    tracing::info!(device_index = cfg.device.index, "using simulated board");
    Box::new(sim)
}
