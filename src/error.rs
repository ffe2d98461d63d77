//! Domain error type shared by the state controller and the HTTP layer

use thiserror::Error;

/// Errors produced by clock operations
#[derive(Debug, Error)]
pub enum ClockError {
    /// User-supplied value rejected at the input boundary; nothing was mutated
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the component's current phase
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("alarm not found: {0}")]
    AlarmNotFound(String),

    #[error("failed to lock {0} state")]
    Lock(&'static str),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("audio error: {0}")]
    Audio(String),
}

impl ClockError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ClockError>;
