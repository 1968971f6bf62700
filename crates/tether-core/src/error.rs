//! Error types for Tether

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::OutcomeState;

/// Core Tether errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TetherError {
    // Settlement errors
    #[error("Result already completed")]
    AlreadyCompleted,

    #[error("Result is not complete")]
    Incomplete,

    // Access errors
    #[error("No value present: result is {state}")]
    AbsentValue { state: OutcomeState },

    #[error("No cause present: result is {state}")]
    AbsentCause { state: OutcomeState },

    // Failure causes
    #[error("Operation timed out")]
    Timeout,

    #[error("{0}")]
    Message(String),

    // Execution errors
    #[error("Call task panicked: {0}")]
    TaskPanicked(String),

    #[error("Producer panicked: {0}")]
    ProducerPanicked(String),
}

/// Result type for Tether operations
pub type TetherResult<T> = Result<T, TetherError>;

/// The error carried by a failed outcome.
///
/// Shared behind an `Arc` so a single failure can be handed to any number of
/// observers without requiring the underlying error to be `Clone`.
#[derive(Clone)]
pub struct Cause(Arc<dyn StdError + Send + Sync + 'static>);

impl Cause {
    /// Wrap an arbitrary error
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Cause(Arc::new(error))
    }

    /// Failure described only by a message
    pub fn message(text: impl Into<String>) -> Self {
        Cause::new(TetherError::Message(text.into()))
    }

    /// Synthesized cause for a timeout with no explicit error
    pub fn timeout() -> Self {
        Cause::new(TetherError::Timeout)
    }

    /// Whether this cause records a timeout rather than a generic failure
    pub fn is_timeout(&self) -> bool {
        matches!(self.downcast_ref::<TetherError>(), Some(TetherError::Timeout))
    }

    /// Recover the concrete error type
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl From<TetherError> for Cause {
    fn from(error: TetherError) -> Self {
        Cause::new(error)
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cause").field(&self.0).finish()
    }
}

impl StdError for Cause {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Render a panic payload for logging and error messages
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
