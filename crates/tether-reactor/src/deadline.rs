//! Deadline-tracked callbacks
//!
//! A tracked callback races its producer against a deadline. Whichever
//! terminal call arrives first is delivered; the reactor's sweep supplies
//! `timeout()` when the deadline passes first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tether_core::{Callback, Cause};

/// Type-erased view of a tracked callback, held by the reactor
pub(crate) trait Deadline: Send + Sync {
    fn deadline(&self) -> Instant;

    fn is_done(&self) -> bool;

    /// Deliver `timeout()` unless a terminal call already happened.
    /// Returns whether the timeout was delivered.
    fn expire(&self) -> bool;
}

struct TrackedState<T> {
    callback: Box<dyn Callback<T>>,
    deadline: Instant,
    done: AtomicBool,
}

impl<T> TrackedState<T> {
    /// Claim the single terminal delivery
    fn claim(&self) -> bool {
        !self.done.swap(true, Ordering::AcqRel)
    }
}

impl<T> Deadline for TrackedState<T> {
    fn deadline(&self) -> Instant {
        self.deadline
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn expire(&self) -> bool {
        if !self.claim() {
            return false;
        }
        self.callback.timeout();
        true
    }
}

/// Simple callback whose deadline is enforced by a reactor sweep.
///
/// Created by [`crate::Reactor::track`].
pub struct TrackedCallback<T> {
    state: Arc<TrackedState<T>>,
}

impl<T: 'static> TrackedCallback<T> {
    pub(crate) fn new(callback: Box<dyn Callback<T>>, deadline: Instant) -> Self {
        TrackedCallback {
            state: Arc::new(TrackedState {
                callback,
                deadline,
                done: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn entry(&self) -> Arc<dyn Deadline> {
        self.state.clone()
    }
}

impl<T> TrackedCallback<T> {
    pub fn deadline(&self) -> Instant {
        self.state.deadline
    }

    /// Whether a terminal call (or the deadline) already happened
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }
}

impl<T> Clone for TrackedCallback<T> {
    fn clone(&self) -> Self {
        TrackedCallback {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Callback<T> for TrackedCallback<T> {
    fn success(&self, value: T) {
        if self.state.claim() {
            self.state.callback.success(value);
        } else {
            tracing::warn!("ignoring success on a callback that already completed or expired");
        }
    }

    fn fail(&self, cause: Cause) {
        if self.state.claim() {
            self.state.callback.fail(cause);
        } else {
            tracing::warn!(%cause, "ignoring failure on a callback that already completed or expired");
        }
    }

    fn timeout(&self) {
        if self.state.claim() {
            self.state.callback.timeout();
        } else {
            tracing::warn!("ignoring timeout on a callback that already completed or expired");
        }
    }
}
