//! Hosts an `ActuatorCore` on a dedicated control-loop thread.
//!
//! Inbound commands travel over an unbounded channel and are applied at the
//! next cycle boundary. Telemetry goes out through a latest-value slot;
//! lifecycle events go out on their own unbounded channel so none are lost.
//!
//! Each `ActuatorHandle` owns exactly one thread, which is shut down and
//! joined when the handle is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use actuator_traits::Transport;
use crossbeam_channel as xch;
use tracing::{debug, error, info, warn};

use crate::config::Pacing;
use crate::core::ActuatorCore;
use crate::error::{ActuatorError, Result};
use crate::telemetry::{Event, LatestReceiver, LatestSender, Telemetry, latest_slot};
use crate::util::duration_ms;

/// How long a disconnected loop blocks for a command before rechecking `done`.
const IDLE_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    SetPosition(i32),
    SetVelocity(i32),
    ToggleOscillation { min: i32, max: i32 },
}

/// Per-cycle timing collected by the loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleStats {
    pub cycles: u64,
    pub min_interval: Option<Duration>,
    pub max_interval: Option<Duration>,
    total_interval: Duration,
    intervals: u64,
    pub max_work: Duration,
    /// Cycles whose work alone exceeded the fixed period.
    pub overruns: u64,
}

impl CycleStats {
    pub fn record(&mut self, interval: Option<Duration>, work: Duration, period: Option<Duration>) {
        self.cycles += 1;
        if let Some(i) = interval {
            self.min_interval = Some(self.min_interval.map_or(i, |m| m.min(i)));
            self.max_interval = Some(self.max_interval.map_or(i, |m| m.max(i)));
            self.total_interval += i;
            self.intervals += 1;
        }
        self.max_work = self.max_work.max(work);
        if period.is_some_and(|p| work > p) {
            self.overruns += 1;
        }
    }

    pub fn avg_interval(&self) -> Option<Duration> {
        let n = u32::try_from(self.intervals).ok().filter(|n| *n > 0)?;
        Some(self.total_interval / n)
    }
}

/// Returned when the loop exits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub stats: CycleStats,
    /// Set when a transport fault ended the loop.
    pub fault: Option<String>,
}

/// Client side of a running control loop.
pub struct ActuatorHandle {
    commands: xch::Sender<Command>,
    events: xch::Receiver<Event>,
    telemetry: LatestReceiver<Telemetry>,
    done: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<RunReport>>,
}

/// Move `core` onto its own thread and start the loop.
///
/// The loop idles until a `Connect` command succeeds, then cycles until the
/// handle is shut down or a transport fault occurs.
pub fn spawn<T>(mut core: ActuatorCore<T>, pacing: Pacing) -> ActuatorHandle
where
    T: Transport + Send + 'static,
{
    let (cmd_tx, cmd_rx) = xch::unbounded();
    let (ev_tx, ev_rx) = xch::unbounded();
    let (tel_tx, tel_rx) = latest_slot();
    let done = Arc::new(AtomicBool::new(false));
    let done_clone = done.clone();

    core.set_event_sink(move |e| {
        let _ = ev_tx.send(e);
    });

    let join_handle = std::thread::spawn(move || {
        let report = control_loop(&mut core, &cmd_rx, &tel_tx, &done_clone, pacing);
        core.emit(Event::LoopFinished);
        info!(cycles = report.stats.cycles, fault = ?report.fault, "control loop finished");
        report
    });

    ActuatorHandle {
        commands: cmd_tx,
        events: ev_rx,
        telemetry: tel_rx,
        done,
        join_handle: Some(join_handle),
    }
}

enum Applied {
    Ok,
    Fault(String),
}

/// Apply one command. Rejections are reported as events; transport faults end the loop.
fn apply<T: Transport>(core: &mut ActuatorCore<T>, cmd: Command) -> Applied {
    debug!(?cmd, "apply command");
    let res = match cmd {
        Command::Connect => core.connect(),
        Command::SetPosition(p) => core.set_position(p),
        Command::SetVelocity(v) => core.set_velocity(v),
        Command::ToggleOscillation { min, max } => core.toggle_oscillation(min, max),
    };
    let Err(e) = res else {
        return Applied::Ok;
    };
    match e.downcast_ref::<ActuatorError>() {
        // Already reported as ConnectFailed.
        Some(ActuatorError::Connection(_)) => Applied::Ok,
        Some(err) if err.is_fault() => Applied::Fault(format!("{e:#}")),
        _ => {
            warn!(?cmd, error = %e, "command rejected");
            core.emit(Event::CommandRejected(format!("{e:#}")));
            Applied::Ok
        }
    }
}

fn control_loop<T: Transport>(
    core: &mut ActuatorCore<T>,
    commands: &xch::Receiver<Command>,
    telemetry: &LatestSender<Telemetry>,
    done: &AtomicBool,
    pacing: Pacing,
) -> RunReport {
    let clock = core.clock();
    let period = pacing.period();
    let mut report = RunReport::default();
    let mut last_start: Option<Instant> = None;

    loop {
        if done.load(Ordering::Relaxed) {
            debug!("control loop received shutdown signal");
            break;
        }

        if !core.is_connected() {
            match commands.recv_timeout(IDLE_POLL) {
                Ok(cmd) => {
                    if let Applied::Fault(reason) = apply(core, cmd) {
                        report.fault = Some(reason);
                        break;
                    }
                }
                Err(xch::RecvTimeoutError::Timeout) => {}
                Err(xch::RecvTimeoutError::Disconnected) => break,
            }
            last_start = None;
            continue;
        }

        let start = clock.now();
        let mut fault = None;
        for cmd in commands.try_iter() {
            if let Applied::Fault(reason) = apply(core, cmd) {
                fault = Some(reason);
                break;
            }
        }

        if fault.is_none() {
            match core.step() {
                Ok(t) => telemetry.publish(t),
                Err(e) => fault = Some(format!("{e:#}")),
            }
        }
        if let Some(reason) = fault {
            error!(error = %reason, "control loop fault");
            core.emit(Event::LoopFault(reason.clone()));
            report.fault = Some(reason);
            break;
        }

        let work = clock.now().saturating_duration_since(start);
        let interval = last_start.map(|prev| start.saturating_duration_since(prev));
        report.stats.record(interval, work, period);
        last_start = Some(start);

        if let Some(period) = period {
            let deadline = start + period;
            let now = clock.now();
            if now < deadline {
                clock.sleep(deadline - now);
            } else {
                debug!(work_ms = duration_ms(work), "cycle overran period");
            }
        }
    }
    report
}

impl ActuatorHandle {
    fn send(&self, cmd: Command) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| eyre::Report::new(ActuatorError::State("control loop stopped".into())))
    }

    /// Idempotent; outcome arrives as `Connected` or `ConnectFailed`.
    pub fn connect(&self) -> Result<()> {
        self.send(Command::Connect)
    }

    pub fn set_position(&self, raw: i32) -> Result<()> {
        self.send(Command::SetPosition(raw))
    }

    pub fn set_velocity(&self, raw: i32) -> Result<()> {
        self.send(Command::SetVelocity(raw))
    }

    pub fn toggle_oscillation(&self, min: i32, max: i32) -> Result<()> {
        self.send(Command::ToggleOscillation { min, max })
    }

    /// Newest telemetry not yet taken.
    pub fn latest_telemetry(&self) -> Option<Telemetry> {
        self.telemetry.latest()
    }

    /// Block for the next telemetry snapshot.
    pub fn wait_telemetry(&self, timeout: Duration) -> Option<Telemetry> {
        self.telemetry.wait(timeout)
    }

    pub fn events(&self) -> &xch::Receiver<Event> {
        &self.events
    }

    /// Drain all pending events.
    pub fn drain_events(&self) -> Vec<Event> {
        self.events.try_iter().collect()
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the loop and wait for it to exit.
    pub fn shutdown(mut self) -> Result<RunReport> {
        self.done.store(true, Ordering::Relaxed);
        match self.join_handle.take() {
            Some(h) => h.join().map_err(|_| {
                eyre::Report::new(ActuatorError::State("control loop panicked".into()))
            }),
            None => Ok(RunReport::default()),
        }
    }
}

impl Drop for ActuatorHandle {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(_) => tracing::trace!("control loop joined"),
                Err(e) => tracing::warn!(?e, "control loop panicked during shutdown"),
            }
        }
    }
}
