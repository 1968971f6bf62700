//! Inline converters between the sink shapes
//!
//! Every sink built here delivers on the calling thread and accepts a single
//! terminal call; later calls are logged and dropped.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

use tether_core::{Callback, Cause, Outcome, Promise, ResultCallback};

/// First-call-wins latch shared by converter sinks
#[derive(Debug)]
pub(crate) struct TerminalGuard {
    fired: AtomicBool,
}

impl TerminalGuard {
    pub(crate) fn new() -> Self {
        TerminalGuard {
            fired: AtomicBool::new(false),
        }
    }

    pub(crate) fn claim(&self, call: &'static str) -> bool {
        let first = !self.fired.swap(true, Ordering::AcqRel);
        if !first {
            tracing::warn!(call, "ignoring terminal call on an already completed sink");
        }
        first
    }
}

// ============================================================================
// PROMISE -> SIMPLE CALLBACK
// ============================================================================

/// Simple callback that settles a promise.
///
/// Created by [`convert_promise`].
pub struct PromiseCallback<T> {
    promise: Promise<T>,
    guard: TerminalGuard,
}

/// Expose `promise` as a simple callback.
///
/// Observers already attached to the promise run synchronously inside the
/// terminal call, in attachment order.
pub fn convert_promise<T>(promise: &Promise<T>) -> PromiseCallback<T>
where
    T: Send + Sync + 'static,
{
    PromiseCallback {
        promise: promise.clone(),
        guard: TerminalGuard::new(),
    }
}

impl<T> PromiseCallback<T> {
    pub fn promise(&self) -> &Promise<T> {
        &self.promise
    }
}

impl<T: Send + Sync + 'static> Callback<T> for PromiseCallback<T> {
    fn success(&self, value: T) {
        if self.guard.claim("success") {
            // `settle` logs a conflicting settlement itself.
            let _ = self.promise.resolve(value);
        }
    }

    fn fail(&self, cause: Cause) {
        if self.guard.claim("fail") {
            let _ = self.promise.reject(cause);
        }
    }

    fn timeout(&self) {
        if self.guard.claim("timeout") {
            let _ = self.promise.expire();
        }
    }
}

// ============================================================================
// RESULT CALLBACK -> SIMPLE CALLBACK
// ============================================================================

/// Simple callback that builds an outcome and hands it to a result callback.
///
/// Created by [`convert_result_callback`].
pub struct ResultCallbackAdapter<T, R> {
    callback: R,
    guard: TerminalGuard,
    _value: PhantomData<fn(T)>,
}

/// Expose a result callback as a simple callback
pub fn convert_result_callback<T, R>(callback: R) -> ResultCallbackAdapter<T, R>
where
    R: ResultCallback<T>,
{
    ResultCallbackAdapter {
        callback,
        guard: TerminalGuard::new(),
        _value: PhantomData,
    }
}

impl<T, R: ResultCallback<T>> Callback<T> for ResultCallbackAdapter<T, R> {
    fn success(&self, value: T) {
        if self.guard.claim("success") {
            self.callback.on_result(Outcome::succeeded(value));
        }
    }

    fn fail(&self, cause: Cause) {
        if self.guard.claim("fail") {
            self.callback.on_result(Outcome::failed(cause));
        }
    }

    fn timeout(&self) {
        if self.guard.claim("timeout") {
            self.callback.on_result(Outcome::timeout());
        }
    }
}

// ============================================================================
// SIMPLE CALLBACK -> RESULT CALLBACK
// ============================================================================

/// Result callback that unpacks an outcome onto a simple callback.
///
/// Created by [`convert_callback`].
pub struct SimpleCallbackAdapter<T, C> {
    callback: C,
    guard: TerminalGuard,
    _value: PhantomData<fn(T)>,
}

/// Expose a simple callback as a result callback.
///
/// A timeout cause maps back to `timeout()`, any other failure to `fail`, and
/// a pending outcome to `fail` with [`tether_core::TetherError::Incomplete`].
pub fn convert_callback<T, C>(callback: C) -> SimpleCallbackAdapter<T, C>
where
    C: Callback<T>,
{
    SimpleCallbackAdapter {
        callback,
        guard: TerminalGuard::new(),
        _value: PhantomData,
    }
}

impl<T, C: Callback<T>> ResultCallback<T> for SimpleCallbackAdapter<T, C> {
    fn on_result(&self, outcome: Outcome<T>) {
        if !self.guard.claim("on_result") {
            return;
        }
        deliver_outcome(&self.callback, outcome);
    }
}

/// Unpack `outcome` onto the matching simple-callback method
pub(crate) fn deliver_outcome<T, C>(callback: &C, outcome: Outcome<T>)
where
    C: Callback<T> + ?Sized,
{
    if outcome.is_timeout() {
        callback.timeout();
        return;
    }
    match outcome.into_result() {
        Ok(value) => callback.success(value),
        Err(cause) => callback.fail(cause),
    }
}
