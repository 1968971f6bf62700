//! Settable result container with attached observers

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::{panic_message, Cause, Outcome, OutcomeState, ResultCallback, TetherError, TetherResult};

type Observer<T> = Box<dyn FnOnce(&Outcome<T>) + Send>;

struct PromiseInner<T> {
    /// Written once, on the pending -> terminal transition
    outcome: OnceLock<Outcome<T>>,
    /// Observers waiting for settlement, in attachment order
    observers: Mutex<Vec<Observer<T>>>,
}

/// A result container that is settled exactly once.
///
/// Observers attached before settlement run, in attachment order, on the
/// thread that settles the promise. Observers attached after settlement run
/// immediately on the attaching thread. Cloning yields another handle to the
/// same promise.
pub struct Promise<T> {
    inner: Arc<PromiseInner<T>>,
}

impl<T: Send + Sync + 'static> Promise<T> {
    /// Create a pending promise
    pub fn new() -> Self {
        Promise {
            inner: Arc::new(PromiseInner {
                outcome: OnceLock::new(),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Observe the success value
    pub fn then<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.observe(Box::new(move |outcome: &Outcome<T>| {
            if let Ok(value) = outcome.value() {
                f(value);
            }
        }));
        self
    }

    /// Observe the failure cause (timeouts included)
    pub fn catch_error<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&Cause) + Send + 'static,
    {
        self.observe(Box::new(move |outcome: &Outcome<T>| {
            if let Ok(cause) = outcome.cause() {
                f(cause);
            }
        }));
        self
    }

    /// Observe whichever outcome occurs
    pub fn when_complete<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        self.observe(Box::new(f));
        self
    }

    /// Record a terminal outcome and notify observers.
    ///
    /// Returns [`TetherError::AlreadyCompleted`] if the promise was already
    /// settled (the original outcome is kept), or [`TetherError::Incomplete`]
    /// if `outcome` is still pending.
    pub fn settle(&self, outcome: Outcome<T>) -> TetherResult<()> {
        if !outcome.complete() {
            return Err(TetherError::Incomplete);
        }

        let (observers, settled) = {
            let mut observers = self.inner.observers.lock();
            if self.inner.outcome.set(outcome).is_err() {
                tracing::warn!(
                    state = %self.state(),
                    "ignoring settlement of an already completed promise"
                );
                return Err(TetherError::AlreadyCompleted);
            }
            let settled = match self.inner.outcome.get() {
                Some(settled) => settled,
                None => return Err(TetherError::Incomplete),
            };
            (std::mem::take(&mut *observers), settled)
        };

        for observer in observers {
            run_observer(observer, settled);
        }
        Ok(())
    }

    /// Settle successfully
    pub fn resolve(&self, value: T) -> TetherResult<()> {
        self.settle(Outcome::succeeded(value))
    }

    /// Settle as failed
    pub fn reject(&self, cause: impl Into<Cause>) -> TetherResult<()> {
        self.settle(Outcome::failed(cause))
    }

    /// Settle as failed with a synthesized timeout cause
    pub fn expire(&self) -> TetherResult<()> {
        self.settle(Outcome::timeout())
    }

    fn observe(&self, observer: Observer<T>) {
        let mut observers = self.inner.observers.lock();
        match self.inner.outcome.get() {
            Some(outcome) => {
                drop(observers);
                run_observer(observer, outcome);
            }
            None => observers.push(observer),
        }
    }
}

impl<T> Promise<T> {
    /// The settled outcome, if any
    pub fn outcome(&self) -> Option<&Outcome<T>> {
        self.inner.outcome.get()
    }

    pub fn state(&self) -> OutcomeState {
        self.outcome()
            .map(Outcome::state)
            .unwrap_or(OutcomeState::Pending)
    }

    pub fn complete(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn success(&self) -> bool {
        self.state() == OutcomeState::Success
    }

    pub fn failure(&self) -> bool {
        self.state() == OutcomeState::Failure
    }

    /// The success value; fails with [`TetherError::AbsentValue`] otherwise
    pub fn value(&self) -> TetherResult<&T> {
        match self.outcome() {
            Some(outcome) => outcome.value(),
            None => Err(TetherError::AbsentValue {
                state: OutcomeState::Pending,
            }),
        }
    }

    /// The failure cause; fails with [`TetherError::AbsentCause`] otherwise
    pub fn cause(&self) -> TetherResult<&Cause> {
        match self.outcome() {
            Some(outcome) => outcome.cause(),
            None => Err(TetherError::AbsentCause {
                state: OutcomeState::Pending,
            }),
        }
    }

    /// Number of observers still waiting for settlement
    pub fn waiting_observers(&self) -> usize {
        self.inner.observers.lock().len()
    }
}

impl<T: Send + Sync + 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("outcome", &self.outcome())
            .finish()
    }
}

/// A promise accepts outcomes like any other result callback
impl<T: Send + Sync + 'static> ResultCallback<T> for Promise<T> {
    /// A pending outcome is not a result: the promise is rejected with
    /// [`TetherError::Incomplete`] so its observers still hear about it.
    fn on_result(&self, outcome: Outcome<T>) {
        if !outcome.complete() {
            tracing::warn!("pending outcome delivered to promise, rejecting as incomplete");
            // A conflicting settlement is logged by `settle`.
            let _ = self.reject(TetherError::Incomplete);
            return;
        }
        let _ = self.settle(outcome);
    }
}

fn run_observer<T>(observer: Observer<T>, outcome: &Outcome<T>) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| observer(outcome))) {
        tracing::error!(
            panic = %panic_message(&*payload),
            "promise observer panicked"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_then_fires_once_on_resolve() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let promise = Promise::new();
        {
            let seen = Arc::clone(&seen);
            promise.then(move |v: &u32| seen.lock().push(*v));
        }

        assert!(!promise.complete());
        assert_eq!(promise.waiting_observers(), 1);

        promise.resolve(42).unwrap();

        assert_eq!(*seen.lock(), vec![42]);
        assert!(promise.complete());
        assert!(promise.success());
        assert!(!promise.failure());
        assert_eq!(promise.value(), Ok(&42));
        assert_eq!(promise.waiting_observers(), 0);
    }

    #[test]
    fn test_observers_run_in_attachment_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let promise = Promise::new();
        for i in 0..5 {
            let order = Arc::clone(&order);
            promise.then(move |_: &&str| order.lock().push(i));
        }

        promise.resolve("done").unwrap();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_observer_attached_after_settlement_fires_immediately() {
        let promise = Promise::new();
        promise.resolve(String::from("Rick")).unwrap();

        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            promise.then(move |name: &String| *seen.lock() = Some(name.clone()));
        }
        assert_eq!(seen.lock().as_deref(), Some("Rick"));
    }

    #[test]
    fn test_catch_error_on_reject() {
        let value = Arc::new(Mutex::new(None));
        let error = Arc::new(Mutex::new(None));
        let promise: Promise<u32> = Promise::new();
        {
            let value = Arc::clone(&value);
            let error = Arc::clone(&error);
            promise
                .then(move |v| *value.lock() = Some(*v))
                .catch_error(move |e| *error.lock() = Some(e.to_string()));
        }

        promise.reject(Cause::message("NOT FOUND")).unwrap();

        assert!(value.lock().is_none());
        assert_eq!(error.lock().as_deref(), Some("NOT FOUND"));
        assert!(promise.failure());
        assert!(promise.value().is_err());
        assert!(promise.cause().is_ok());
    }

    #[test]
    fn test_expire_reports_timeout_cause() {
        let promise: Promise<u32> = Promise::new();
        let timed_out = Arc::new(Mutex::new(false));
        {
            let timed_out = Arc::clone(&timed_out);
            promise.catch_error(move |e| *timed_out.lock() = e.is_timeout());
        }

        promise.expire().unwrap();
        assert!(*timed_out.lock());
        assert!(promise.outcome().unwrap().is_timeout());
    }

    #[test]
    fn test_double_settle_keeps_first_outcome() {
        let calls = Arc::new(Mutex::new(0));
        let promise = Promise::new();
        {
            let calls = Arc::clone(&calls);
            promise.when_complete(move |_: &Outcome<u32>| *calls.lock() += 1);
        }

        promise.resolve(1).unwrap();
        assert_eq!(promise.resolve(2), Err(TetherError::AlreadyCompleted));
        assert_eq!(promise.expire(), Err(TetherError::AlreadyCompleted));

        assert_eq!(promise.value(), Ok(&1));
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn test_settle_with_pending_is_rejected() {
        let promise: Promise<u32> = Promise::new();
        assert_eq!(
            promise.settle(Outcome::pending()),
            Err(TetherError::Incomplete)
        );
        assert!(!promise.complete());
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let reached = Arc::new(Mutex::new(false));
        let promise = Promise::new();
        promise.then(|_: &u32| panic!("observer failure"));
        {
            let reached = Arc::clone(&reached);
            promise.then(move |_| *reached.lock() = true);
        }

        promise.resolve(3).unwrap();
        assert!(*reached.lock());
    }

    #[test]
    fn test_racing_settlers_single_winner() {
        let promise: Promise<usize> = Promise::new();
        let fired = Arc::new(Mutex::new(0));
        {
            let fired = Arc::clone(&fired);
            promise.then(move |_| *fired.lock() += 1);
        }

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let promise = promise.clone();
                thread::spawn(move || promise.resolve(i).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(*fired.lock(), 1);
        assert!(promise.success());
    }

    #[test]
    fn test_promise_as_result_callback() {
        let promise: Promise<u32> = Promise::new();
        promise.reply(9);
        promise.reply(10);
        assert_eq!(promise.value(), Ok(&9));
    }

    #[test]
    fn test_pending_result_rejects_promise_as_incomplete() {
        let promise: Promise<u32> = Promise::new();
        let fired = Arc::new(Mutex::new(None));
        {
            let fired = Arc::clone(&fired);
            promise.when_complete(move |outcome| *fired.lock() = Some(outcome.state()));
        }

        promise.on_result(Outcome::pending());

        assert!(promise.failure());
        assert_eq!(*fired.lock(), Some(OutcomeState::Failure));
        assert_eq!(promise.waiting_observers(), 0);
        assert_eq!(
            promise.cause().unwrap().downcast_ref::<TetherError>(),
            Some(&TetherError::Incomplete)
        );
    }
}
