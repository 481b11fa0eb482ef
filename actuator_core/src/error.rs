use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("transport fault: {0}")]
    Transport(String),
    #[error("timeout waiting for board reply")]
    Timeout,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid oscillation bounds: min {min} must be < max {max}")]
    InvalidBounds { min: i32, max: i32 },
    #[error("invalid state: {0}")]
    State(String),
}

impl ActuatorError {
    /// Errors that end the control loop rather than a single command.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing transport")]
    MissingTransport,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
