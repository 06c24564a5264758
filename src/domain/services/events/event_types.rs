//--------------------------------------------------------------------------------------------------
// STRUCTS & ENUMS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|-------------------|
// | EmitterError            | Error types for registration and dispatch         | error, from       |
// | UnhandledError          | Fault raised by emitting the error event          | context, raised   |
// | ListenerFaults          | Aggregate of listener failures for one emit       | positions         |
//--------------------------------------------------------------------------------------------------

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::domain::models::SharedError;

/// Errors that can occur in the emitter
#[derive(Error, Debug)]
pub enum EmitterError {
    /// Rejected input, e.g. an empty event name
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The error event was emitted
    #[error(transparent)]
    Unhandled(#[from] UnhandledError),

    /// One or more listeners failed while handling an event
    #[error(transparent)]
    ListenerFault(#[from] ListenerFaults),
}

/// Type alias for Result with EmitterError
pub type EmitterResult<T> = Result<T, EmitterError>;

/// Raised when the error event is emitted. It never reaches a channel.
#[derive(Error, Debug, Clone)]
pub enum UnhandledError {
    /// The caller supplied an error instance; this is that same instance.
    #[error("{0}")]
    Raised(SharedError),

    /// The caller supplied something that is not an error, or nothing at all.
    #[error("{message}")]
    Unspecified {
        message: String,
        /// The raw value that was emitted, `None` when nothing was supplied
        context: Option<Value>,
    },
}

impl UnhandledError {
    pub(crate) fn unspecified(event: &str, context: Option<Value>) -> Self {
        let text = match &context {
            Some(Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
            None => "undefined".to_string(),
        };
        UnhandledError::Unspecified {
            message: format!("Uncaught, unspecified \"{}\" event. ({})", event, text),
            context,
        }
    }

    /// The raw value attached to an unspecified error.
    pub fn context(&self) -> Option<&Value> {
        match self {
            UnhandledError::Unspecified { context, .. } => context.as_ref(),
            UnhandledError::Raised(_) => None,
        }
    }

    /// The caller's own error instance, if one was emitted.
    pub fn raised(&self) -> Option<&SharedError> {
        match self {
            UnhandledError::Raised(err) => Some(err),
            UnhandledError::Unspecified { .. } => None,
        }
    }
}

/// A single listener failure.
#[derive(Debug)]
pub struct ListenerFault {
    /// Index of the listener in subscription order at dispatch time
    pub position: usize,
    pub error: anyhow::Error,
}

impl fmt::Display for ListenerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener #{}: {}", self.position, self.error)
    }
}

/// Every listener failure collected during one emit.
#[derive(Error, Debug)]
#[error("{} listener(s) failed while handling \"{}\"", .faults.len(), .event)]
pub struct ListenerFaults {
    pub event: String,
    pub faults: Vec<ListenerFault>,
}

impl ListenerFaults {
    /// Positions of the failing listeners, in dispatch order.
    pub fn positions(&self) -> Vec<usize> {
        self.faults.iter().map(|fault| fault.position).collect()
    }
}
