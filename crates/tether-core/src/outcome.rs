//! Outcome container - the eventual result of an asynchronous operation

use std::fmt;

use crate::{Cause, TetherError, TetherResult};

/// Lifecycle state of an outcome.
///
/// `Pending` is the only initial state. Timeouts collapse into `Failure`
/// and are told apart by their cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeState {
    Pending,
    Success,
    Failure,
}

impl OutcomeState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OutcomeState::Pending)
    }
}

impl fmt::Display for OutcomeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeState::Pending => write!(f, "pending"),
            OutcomeState::Success => write!(f, "successful"),
            OutcomeState::Failure => write!(f, "failed"),
        }
    }
}

#[derive(Clone)]
enum Slot<T> {
    Pending,
    Success(T),
    Failure(Cause),
}

/// Result container.
///
/// An `Outcome` has no mutators: once built in a terminal state it stays
/// there. Settable holders ([`crate::Promise`]) store a terminal outcome
/// exactly once.
#[derive(Clone)]
pub struct Outcome<T> {
    slot: Slot<T>,
}

impl<T> Outcome<T> {
    /// A result that has not completed yet
    pub fn pending() -> Self {
        Outcome {
            slot: Slot::Pending,
        }
    }

    /// A successful result holding `value`
    pub fn succeeded(value: T) -> Self {
        Outcome {
            slot: Slot::Success(value),
        }
    }

    /// A failed result with the given cause
    pub fn failed(cause: impl Into<Cause>) -> Self {
        Outcome {
            slot: Slot::Failure(cause.into()),
        }
    }

    /// A failed result with a synthesized timeout cause
    pub fn timeout() -> Self {
        Outcome::failed(Cause::timeout())
    }

    pub fn from_result(result: Result<T, Cause>) -> Self {
        match result {
            Ok(value) => Outcome::succeeded(value),
            Err(cause) => Outcome::failed(cause),
        }
    }

    pub fn state(&self) -> OutcomeState {
        match self.slot {
            Slot::Pending => OutcomeState::Pending,
            Slot::Success(_) => OutcomeState::Success,
            Slot::Failure(_) => OutcomeState::Failure,
        }
    }

    /// True once a terminal outcome has been recorded
    pub fn complete(&self) -> bool {
        self.state().is_terminal()
    }

    /// True iff complete and no error occurred
    pub fn success(&self) -> bool {
        matches!(self.slot, Slot::Success(_))
    }

    /// True iff complete with an error or timeout
    pub fn failure(&self) -> bool {
        matches!(self.slot, Slot::Failure(_))
    }

    /// True iff the failure was a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(&self.slot, Slot::Failure(cause) if cause.is_timeout())
    }

    /// The success value.
    ///
    /// Fails with [`TetherError::AbsentValue`] when pending or failed.
    pub fn value(&self) -> TetherResult<&T> {
        match &self.slot {
            Slot::Success(value) => Ok(value),
            _ => Err(TetherError::AbsentValue {
                state: self.state(),
            }),
        }
    }

    /// The failure cause.
    ///
    /// Fails with [`TetherError::AbsentCause`] when pending or successful.
    pub fn cause(&self) -> TetherResult<&Cause> {
        match &self.slot {
            Slot::Failure(cause) => Ok(cause),
            _ => Err(TetherError::AbsentCause {
                state: self.state(),
            }),
        }
    }

    pub fn value_opt(&self) -> Option<&T> {
        self.value().ok()
    }

    pub fn cause_opt(&self) -> Option<&Cause> {
        self.cause().ok()
    }

    /// Consume the outcome, returning the success value
    pub fn into_value(self) -> TetherResult<T> {
        let state = self.state();
        match self.slot {
            Slot::Success(value) => Ok(value),
            _ => Err(TetherError::AbsentValue { state }),
        }
    }

    /// Consume the outcome as a `Result`. A pending outcome maps to
    /// [`TetherError::Incomplete`].
    pub fn into_result(self) -> Result<T, Cause> {
        match self.slot {
            Slot::Success(value) => Ok(value),
            Slot::Failure(cause) => Err(cause),
            Slot::Pending => Err(TetherError::Incomplete.into()),
        }
    }
}

impl<T> From<Result<T, Cause>> for Outcome<T> {
    fn from(result: Result<T, Cause>) -> Self {
        Outcome::from_result(result)
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::Pending => f.write_str("Outcome::Pending"),
            Slot::Success(value) => f.debug_tuple("Outcome::Success").field(value).finish(),
            Slot::Failure(cause) => f.debug_tuple("Outcome::Failure").field(cause).finish(),
        }
    }
}
