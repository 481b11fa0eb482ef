use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("no actuator board at index {0}")]
    NoDevice(u8),
    #[error("board link not open")]
    NotOpen,
    #[error("board reply timeout")]
    Timeout,
    #[error("malformed board reply: {0}")]
    Protocol(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
