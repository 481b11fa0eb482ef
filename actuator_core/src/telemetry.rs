//! Outbound messages: per-cycle telemetry snapshots and lifecycle events.

use crossbeam_channel as xch;

/// One cycle's view of the actuator. Immutable once emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Milliseconds since the previous cycle; 0 on the first cycle after connect.
    pub dt_ms: u64,
    /// Milliseconds since connect.
    pub timestamp_ms: u64,
    pub raw_position: u16,
    pub metric_position_mm: f64,
    /// Last raw speed written to the board.
    pub raw_velocity: i32,
    pub metric_velocity_percent: f64,
    /// Millimetres per millisecond.
    pub real_velocity_mm_per_ms: f64,
    pub oscillation_active: bool,
}

impl Telemetry {
    /// Loop rate implied by `dt_ms`, if any.
    pub fn refresh_hz(&self) -> Option<f64> {
        (self.dt_ms > 0).then(|| 1000.0 / self.dt_ms as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected,
    ConnectFailed(String),
    /// Oscillation switched on (`true`) or off (`false`).
    OscillationState(bool),
    CommandRejected(String),
    LoopFault(String),
    LoopFinished,
}

/// Producer half of a latest-value slot.
///
/// Publishing replaces any snapshot the consumer has not picked up yet.
#[derive(Debug, Clone)]
pub struct LatestSender<T> {
    tx: xch::Sender<T>,
    stale: xch::Receiver<T>,
}

/// Consumer half of a latest-value slot.
#[derive(Debug, Clone)]
pub struct LatestReceiver<T> {
    rx: xch::Receiver<T>,
}

pub fn latest_slot<T>() -> (LatestSender<T>, LatestReceiver<T>) {
    let (tx, rx) = xch::bounded(1);
    (
        LatestSender {
            tx,
            stale: rx.clone(),
        },
        LatestReceiver { rx },
    )
}

impl<T> LatestSender<T> {
    pub fn publish(&self, value: T) {
        let mut value = value;
        loop {
            match self.tx.try_send(value) {
                Ok(()) | Err(xch::TrySendError::Disconnected(_)) => return,
                Err(xch::TrySendError::Full(v)) => {
                    let _ = self.stale.try_recv();
                    value = v;
                }
            }
        }
    }
}

impl<T> LatestReceiver<T> {
    /// Most recent value not yet taken, if any.
    pub fn latest(&self) -> Option<T> {
        self.rx.try_iter().last()
    }

    /// Block until a value arrives or `timeout` passes.
    pub fn wait(&self, timeout: std::time::Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }
}
