//! Dispatch error types.

use std::fmt;

/// Error type for host-side command handling.
///
/// None of these cross into PHP: the C dispatcher logs them and returns
/// NULL, which scripts see as `false`.
#[derive(Debug)]
pub enum DispatchError {
    /// No handler registered for the command.
    UnknownCommand(String),
    /// Command name or params were not valid UTF-8.
    InvalidUtf8,
    /// Params were not valid JSON.
    InvalidArgs { command: String, error: String },
    /// The handler reported a failure.
    Failed(String),
    /// The response could not be serialized or contains a nul byte.
    Response(String),
    /// The handler panicked.
    Panicked(String),
}

impl DispatchError {
    /// Convenience for handlers.
    pub fn failed(message: impl Into<String>) -> Self {
        DispatchError::Failed(message.into())
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownCommand(command) => write!(f, "unknown command: {}", command),
            DispatchError::InvalidUtf8 => write!(f, "command or params are not valid UTF-8"),
            DispatchError::InvalidArgs { command, error } => {
                write!(f, "invalid params for {}: {}", command, error)
            }
            DispatchError::Failed(message) => write!(f, "{}", message),
            DispatchError::Response(message) => write!(f, "invalid response: {}", message),
            DispatchError::Panicked(command) => write!(f, "handler for {} panicked", command),
        }
    }
}

impl std::error::Error for DispatchError {}
