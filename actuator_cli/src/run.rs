//! The `run` and `self-check` commands: drive the control loop and print what it reports.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use actuator_core::command::Gateway;
use actuator_core::error::{ActuatorError, Result};
use actuator_core::{
    ActuatorCore, CycleStats, Event, Limits, Pacing, RunReport, Telemetry, UnitConverter,
};
use actuator_traits::Transport;
use eyre::WrapErr;
use serde_json::json;
use tracing::{info, warn};

use crate::cli::PacingArg;

/// How long `run` waits for the board to accept the connect sequence.
const CONNECT_WAIT: Duration = Duration::from_secs(5);
/// Event poll interval of the printing loop.
const TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub velocity: Option<i32>,
    pub position: Option<i32>,
    pub oscillate: Option<(i32, i32)>,
    pub duration: Option<Duration>,
    pub print_every: Duration,
    pub stats: bool,
    pub json: bool,
}

/// Resolve the effective pacing from config and an optional CLI override.
pub fn pacing_for(runner: &actuator_config::RunnerCfg, over: Option<PacingArg>) -> Pacing {
    match over {
        Some(PacingArg::Fixed) => Pacing::fixed_hz(runner.refresh_hz),
        Some(PacingArg::Uncapped) => Pacing::Uncapped,
        None => runner.into(),
    }
}

/// `--oscillate` takes both bounds or none; none falls back to `[oscillation]`.
pub fn oscillation_bounds(
    values: Option<&[i32]>,
    defaults: &actuator_config::OscillationCfg,
) -> Result<Option<(i32, i32)>> {
    match values {
        None => Ok(None),
        Some([]) => Ok(Some((defaults.min, defaults.max))),
        Some([min, max]) => Ok(Some((*min, *max))),
        Some(_) => Err(eyre::Report::new(ActuatorError::Config(
            "--oscillate takes MIN and MAX, or no values".into(),
        ))),
    }
}

pub fn telemetry_json(t: &Telemetry) -> serde_json::Value {
    json!({
        "timestamp_ms": t.timestamp_ms,
        "dt_ms": t.dt_ms,
        "refresh_hz": t.refresh_hz(),
        "raw_position": t.raw_position,
        "position_mm": t.metric_position_mm,
        "raw_velocity": t.raw_velocity,
        "velocity_percent": t.metric_velocity_percent,
        "real_velocity_mm_s": t.real_velocity_mm_per_ms * 1000.0,
        "oscillating": t.oscillation_active,
    })
}

pub fn event_json(e: &Event) -> serde_json::Value {
    match e {
        Event::Connected => json!({ "event": "connected" }),
        Event::ConnectFailed(r) => json!({ "event": "connect_failed", "reason": r }),
        Event::OscillationState(on) => json!({ "event": "oscillation", "active": on }),
        Event::CommandRejected(r) => json!({ "event": "command_rejected", "reason": r }),
        Event::LoopFault(r) => json!({ "event": "loop_fault", "reason": r }),
        Event::LoopFinished => json!({ "event": "loop_finished" }),
    }
}

fn ms(d: Option<Duration>) -> Option<f64> {
    d.map(|d| d.as_secs_f64() * 1000.0)
}

pub fn stats_json(s: &CycleStats) -> serde_json::Value {
    json!({
        "stats": {
            "cycles": s.cycles,
            "min_interval_ms": ms(s.min_interval),
            "avg_interval_ms": ms(s.avg_interval()),
            "max_interval_ms": ms(s.max_interval),
            "max_work_ms": s.max_work.as_secs_f64() * 1000.0,
            "overruns": s.overruns,
        }
    })
}

pub fn stats_text(s: &CycleStats) -> String {
    let fmt = |d: Option<Duration>| ms(d).map_or_else(|| "--".to_string(), |v| format!("{v:.2}ms"));
    format!(
        "cycles={} interval min/avg/max={}/{}/{} max_work={:.2}ms overruns={}",
        s.cycles,
        fmt(s.min_interval),
        fmt(s.avg_interval()),
        fmt(s.max_interval),
        s.max_work.as_secs_f64() * 1000.0,
        s.overruns
    )
}

enum Flow {
    Continue,
    Stop,
}

struct Printer<'a> {
    out: std::io::StdoutLock<'a>,
    json: bool,
    limits: Limits,
}

impl Printer<'_> {
    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}").wrap_err("write to stdout")
    }

    fn telemetry(&mut self, t: &Telemetry) -> Result<()> {
        let line = if self.json {
            telemetry_json(t).to_string()
        } else {
            actuator_ui::render_line(t, &self.limits)
        };
        self.line(&line)
    }

    fn event(&mut self, e: &Event) -> Result<Flow> {
        if self.json {
            self.line(&event_json(e).to_string())?;
        }
        match e {
            Event::Connected if !self.json => self.line(actuator_ui::CONNECTED_TEXT)?,
            Event::CommandRejected(reason) => {
                warn!(%reason, "command rejected");
                if !self.json {
                    eprintln!("command rejected: {reason}");
                }
            }
            Event::LoopFault(_) | Event::LoopFinished => return Ok(Flow::Stop),
            _ => {}
        }
        Ok(Flow::Continue)
    }
}

/// Wait for the outcome of a `connect` request.
fn await_connect(handle: &actuator_core::ActuatorHandle, printer: &mut Printer<'_>) -> Result<()> {
    let deadline = Instant::now() + CONNECT_WAIT;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let ev = handle.events().recv_timeout(left).map_err(|_| {
            eyre::Report::new(ActuatorError::Connection(
                "no answer to connect request".into(),
            ))
        })?;
        match ev {
            Event::Connected => {
                printer.event(&ev)?;
                return Ok(());
            }
            Event::ConnectFailed(reason) => {
                return Err(eyre::Report::new(ActuatorError::Connection(reason)));
            }
            Event::LoopFinished | Event::LoopFault(_) => {
                return Err(eyre::Report::new(ActuatorError::Connection(
                    "control loop stopped before connecting".into(),
                )));
            }
            other => {
                printer.event(&other)?;
            }
        }
    }
}

/// Run the control loop until `duration` elapses, `shutdown` is raised or the loop faults.
pub fn run_session<T>(
    core: ActuatorCore<T>,
    pacing: Pacing,
    args: &RunArgs,
    shutdown: &Arc<AtomicBool>,
) -> Result<RunReport>
where
    T: Transport + Send + 'static,
{
    let stdout = std::io::stdout();
    let mut printer = Printer {
        out: stdout.lock(),
        json: args.json,
        limits: *core.limits(),
    };

    let handle = actuator_core::spawn(core, pacing);
    handle.connect()?;
    await_connect(&handle, &mut printer)?;

    if let Some(v) = args.velocity {
        handle.set_velocity(v)?;
    }
    if let Some(p) = args.position {
        handle.set_position(p)?;
    }
    if let Some((min, max)) = args.oscillate {
        handle.toggle_oscillation(min, max)?;
    }

    let started = Instant::now();
    let mut last_print: Option<Instant> = None;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("interrupted");
            break;
        }
        if args.duration.is_some_and(|d| started.elapsed() >= d) {
            break;
        }

        let flow = match handle.events().recv_timeout(TICK) {
            Ok(ev) => printer.event(&ev)?,
            Err(e) if e.is_disconnected() => Flow::Stop,
            Err(_) => Flow::Continue,
        };
        if matches!(flow, Flow::Stop) {
            break;
        }

        let due = last_print.is_none_or(|t| t.elapsed() >= args.print_every);
        if due && let Some(t) = handle.latest_telemetry() {
            printer.telemetry(&t)?;
            last_print = Some(Instant::now());
        }
    }

    let report = handle.shutdown()?;
    if args.stats {
        let line = if args.json {
            stats_json(&report.stats).to_string()
        } else {
            stats_text(&report.stats)
        };
        printer.line(&line)?;
    }
    if let Some(reason) = &report.fault {
        return Err(eyre::Report::new(ActuatorError::Transport(reason.clone())));
    }
    Ok(report)
}

/// Open the board and read one position sample without moving the rod.
pub fn self_check<T: Transport>(
    transport: T,
    device_index: u8,
    units: &UnitConverter,
    json: bool,
) -> Result<u16> {
    let mut gateway = Gateway::new(transport);
    gateway
        .open(device_index)
        .map_err(|e| match e.downcast_ref::<ActuatorError>() {
            Some(ActuatorError::Connection(_)) => e,
            _ => {
                let reason = format!("{e:#}");
                e.wrap_err(ActuatorError::Connection(reason))
            }
        })?;
    let raw = gateway.get_feedback().wrap_err("self-check feedback")?;
    let mm = units.raw_to_metric_position(i32::from(raw));
    info!(device_index, raw, mm, "self-check ok");
    if json {
        println!(
            "{}",
            json!({ "self_check": "ok", "device_index": device_index, "raw_position": raw, "position_mm": mm })
        );
    } else {
        println!(
            "Self-check ok: board {device_index} at {raw} ({})",
            actuator_ui::format_position_mm(mm)
        );
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuator_hardware::SimulatedActuator;
    use rstest::rstest;

    #[rstest]
    #[case(None, None)]
    #[case(Some(&[][..]), Some((50, 950)))]
    #[case(Some(&[100, 900][..]), Some((100, 900)))]
    fn oscillate_values(#[case] v: Option<&[i32]>, #[case] want: Option<(i32, i32)>) {
        let d = actuator_config::OscillationCfg::default();
        assert_eq!(oscillation_bounds(v, &d).unwrap(), want);
    }

    #[test]
    fn single_oscillate_value_is_a_config_error() {
        let d = actuator_config::OscillationCfg::default();
        let err = oscillation_bounds(Some(&[100]), &d).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActuatorError>(),
            Some(ActuatorError::Config(_))
        ));
    }

    #[test]
    fn pacing_override_wins() {
        let runner = actuator_config::RunnerCfg::default();
        assert_eq!(pacing_for(&runner, None), Pacing::fixed_hz(60));
        assert_eq!(
            pacing_for(&runner, Some(PacingArg::Uncapped)),
            Pacing::Uncapped
        );
    }

    #[test]
    fn telemetry_json_reports_mm_per_second() {
        let t = Telemetry {
            dt_ms: 16,
            timestamp_ms: 160,
            raw_position: 512,
            metric_position_mm: 50.0,
            raw_velocity: 600,
            metric_velocity_percent: 58.59,
            real_velocity_mm_per_ms: 0.25,
            oscillation_active: true,
        };
        let v = telemetry_json(&t);
        assert_eq!(v["raw_position"], 512);
        assert_eq!(v["real_velocity_mm_s"], 250.0);
        assert_eq!(v["refresh_hz"], 62.5);
        assert_eq!(v["oscillating"], true);
    }

    #[test]
    fn stats_text_without_intervals() {
        let s = CycleStats::default();
        assert!(stats_text(&s).starts_with("cycles=0 interval min/avg/max=--/--/--"));
    }

    #[test]
    fn self_check_reads_without_moving() {
        let sim = SimulatedActuator::new().with_initial_position(300);
        let monitor = sim.monitor();
        let raw = self_check(sim, 1, &UnitConverter::default(), true).unwrap();
        assert_eq!(raw, 300);
        assert!(monitor.writes_of(actuator_traits::CommandCode::SetPosition).is_empty());
    }

    #[test]
    fn self_check_without_board_is_a_connection_error() {
        let sim = SimulatedActuator::new().with_failed_open();
        let err = self_check(sim, 1, &UnitConverter::default(), false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ActuatorError>(),
            Some(ActuatorError::Connection(_))
        ));
    }
}
