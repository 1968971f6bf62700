//! Recording sinks and sample values

use std::sync::Arc;

use parking_lot::Mutex;
use tether_core::{Callback, Cause, Outcome, ResultCallback};

/// Sample domain value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Employee {
    pub name: String,
}

impl Employee {
    pub fn new(name: impl Into<String>) -> Self {
        Employee { name: name.into() }
    }
}

/// One call observed by a [`Recorder`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery<T> {
    Success(T),
    Fail(String),
    Timeout,
}

/// Simple callback that records every call it receives, duplicates included
pub struct Recorder<T> {
    log: Arc<Mutex<Vec<Delivery<T>>>>,
}

impl<T> Recorder<T> {
    pub fn new() -> Self {
        Recorder {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }
}

impl<T: Clone> Recorder<T> {
    pub fn deliveries(&self) -> Vec<Delivery<T>> {
        self.log.lock().clone()
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Recorder {
            log: Arc::clone(&self.log),
        }
    }
}

impl<T: Send> Callback<T> for Recorder<T> {
    fn success(&self, value: T) {
        self.log.lock().push(Delivery::Success(value));
    }

    fn fail(&self, cause: Cause) {
        self.log.lock().push(Delivery::Fail(cause.to_string()));
    }

    fn timeout(&self) {
        self.log.lock().push(Delivery::Timeout);
    }
}

/// Result callback that keeps the last outcome it received
pub struct OutcomeSlot<T> {
    slot: Arc<Mutex<Option<Outcome<T>>>>,
    calls: Arc<Mutex<usize>>,
}

impl<T> OutcomeSlot<T> {
    pub fn new() -> Self {
        OutcomeSlot {
            slot: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn take(&self) -> Option<Outcome<T>> {
        self.slot.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }

    /// Number of times `on_result` was called
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl<T: Clone> OutcomeSlot<T> {
    pub fn get(&self) -> Option<Outcome<T>> {
        self.slot.lock().clone()
    }
}

impl<T> Default for OutcomeSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for OutcomeSlot<T> {
    fn clone(&self) -> Self {
        OutcomeSlot {
            slot: Arc::clone(&self.slot),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T: Send> ResultCallback<T> for OutcomeSlot<T> {
    fn on_result(&self, outcome: Outcome<T>) {
        *self.calls.lock() += 1;
        *self.slot.lock() = Some(outcome);
    }
}

/// Shared slot written by promise observers
pub struct SharedRef<T> {
    value: Arc<Mutex<Option<T>>>,
}

impl<T> SharedRef<T> {
    pub fn new() -> Self {
        SharedRef {
            value: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set(&self, value: T) {
        *self.value.lock() = Some(value);
    }

    pub fn is_set(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<T: Clone> SharedRef<T> {
    pub fn get(&self) -> Option<T> {
        self.value.lock().clone()
    }
}

impl<T> Default for SharedRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SharedRef<T> {
    fn clone(&self) -> Self {
        SharedRef {
            value: Arc::clone(&self.value),
        }
    }
}
