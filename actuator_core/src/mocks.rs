//! Test and helper mocks for actuator_core

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use actuator_traits::{Transport, TransportError};

use crate::telemetry::Event;

/// One observable step: a transport call or an emitted event.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    Open(u8),
    Write(u8, u16),
    Event(Event),
}

/// Shared, ordered record of transport calls and events.
///
/// Hand a clone to the transport and another to the event sink to assert on
/// the interleaving of writes and notifications.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    entries: Arc<Mutex<Vec<Trace>>>,
}

impl TraceLog {
    pub fn push(&self, t: Trace) {
        if let Ok(mut v) = self.entries.lock() {
            v.push(t);
        }
    }

    pub fn entries(&self) -> Vec<Trace> {
        self.entries.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<(u8, u16)> {
        self.entries()
            .into_iter()
            .filter_map(|t| match t {
                Trace::Write(c, v) => Some((c, v)),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<Event> {
        self.entries()
            .into_iter()
            .filter_map(|t| match t {
                Trace::Event(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    /// Event sink that appends to this log.
    pub fn sink(&self) -> impl Fn(Event) + Send + 'static {
        let log = self.clone();
        move |e| log.push(Trace::Event(e))
    }
}

/// A transport that replays scripted feedback and records every call.
///
/// Feedback values are consumed in order; once exhausted the last one repeats.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    log: TraceLog,
    feedback: VecDeque<u16>,
    last_feedback: u16,
    fail_open: Option<String>,
    /// `(code, successes_left, reason)`
    write_failures: Vec<(u8, usize, String)>,
    feedback_budget: Option<usize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: TraceLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_feedback(mut self, values: impl IntoIterator<Item = u16>) -> Self {
        self.feedback.extend(values);
        self
    }

    pub fn with_open_failure(mut self, reason: &str) -> Self {
        self.fail_open = Some(reason.to_string());
        self
    }

    /// Every write of `code` fails with `reason`.
    pub fn with_write_failure(self, code: u8, reason: &str) -> Self {
        self.with_write_failure_after(code, 0, reason)
    }

    /// Writes of `code` succeed `n` times, then fail with `reason`.
    pub fn with_write_failure_after(mut self, code: u8, n: usize, reason: &str) -> Self {
        self.write_failures.push((code, n, reason.to_string()));
        self
    }

    /// Allow `n` feedback reads, then time out.
    pub fn with_feedback_timeout_after(mut self, n: usize) -> Self {
        self.feedback_budget = Some(n);
        self
    }

    pub fn log(&self) -> TraceLog {
        self.log.clone()
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self, device_index: u8) -> Result<(), TransportError> {
        if let Some(reason) = &self.fail_open {
            return Err(Box::new(std::io::Error::other(reason.clone())));
        }
        self.log.push(Trace::Open(device_index));
        Ok(())
    }

    fn write_code(&mut self, code: u8, value: u16) -> Result<u16, TransportError> {
        if let Some((_, left, reason)) = self.write_failures.iter_mut().find(|(c, ..)| *c == code) {
            if *left == 0 {
                return Err(Box::new(std::io::Error::other(reason.clone())));
            }
            *left -= 1;
        }
        if code == actuator_traits::CommandCode::GetFeedback.code() {
            if let Some(budget) = self.feedback_budget.as_mut() {
                if *budget == 0 {
                    return Err(Box::new(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "feedback timeout",
                    )));
                }
                *budget -= 1;
            }
            self.log.push(Trace::Write(code, value));
            if let Some(v) = self.feedback.pop_front() {
                self.last_feedback = v;
            }
            return Ok(self.last_feedback);
        }
        self.log.push(Trace::Write(code, value));
        Ok(value)
    }
}

/// Placeholder transport for a builder that has not been given one yet.
/// Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransport;

impl Transport for NoTransport {
    fn open(&mut self, _device_index: u8) -> Result<(), TransportError> {
        Err(Box::new(std::io::Error::other("no transport")))
    }

    fn write_code(&mut self, _code: u8, _value: u16) -> Result<u16, TransportError> {
        Err(Box::new(std::io::Error::other("no transport")))
    }
}
