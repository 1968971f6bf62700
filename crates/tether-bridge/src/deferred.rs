//! Reactor-mediated converters
//!
//! Terminal calls on these sinks do not deliver anything themselves. They
//! capture the outcome in a [`CallTask`] and queue it on the reactor; the
//! promise is settled, or the target sink invoked, only when a later
//! [`Reactor::process`] pass runs the task.

use std::marker::PhantomData;
use std::sync::Arc;

use tether_core::{Callback, Cause, Outcome, Promise, ResultCallback};
use tether_reactor::{CallTask, Reactor};

use crate::convert::{deliver_outcome, TerminalGuard};

/// Simple callback that settles a promise during a reactor pass.
///
/// Created by [`convert_promise_on`].
pub struct DeferredPromiseCallback<T> {
    reactor: Reactor,
    promise: Promise<T>,
    guard: TerminalGuard,
}

/// Like [`crate::convert_promise`], but settlement and observer invocation
/// both happen inside `reactor.process()`. Until then the promise stays
/// pending.
pub fn convert_promise_on<T>(reactor: &Reactor, promise: &Promise<T>) -> DeferredPromiseCallback<T>
where
    T: Send + Sync + 'static,
{
    DeferredPromiseCallback {
        reactor: reactor.clone(),
        promise: promise.clone(),
        guard: TerminalGuard::new(),
    }
}

impl<T: Send + Sync + 'static> DeferredPromiseCallback<T> {
    fn defer(&self, label: &'static str, outcome: Outcome<T>) {
        if !self.guard.claim(label) {
            return;
        }
        let promise = self.promise.clone();
        self.reactor.enqueue(CallTask::labeled(label, move || {
            let _ = promise.settle(outcome);
        }));
    }
}

impl<T: Send + Sync + 'static> Callback<T> for DeferredPromiseCallback<T> {
    fn success(&self, value: T) {
        self.defer("promise.success", Outcome::succeeded(value));
    }

    fn fail(&self, cause: Cause) {
        self.defer("promise.fail", Outcome::failed(cause));
    }

    fn timeout(&self) {
        self.defer("promise.timeout", Outcome::timeout());
    }
}

/// Simple callback that queues outcomes for a result callback.
///
/// Created by [`convert_result_callback_on`].
pub struct DeferredResultCallback<T, R> {
    reactor: Reactor,
    callback: Arc<R>,
    guard: TerminalGuard,
    _value: PhantomData<fn(T)>,
}

/// Like [`crate::convert_result_callback`], but `on_result` runs inside
/// `reactor.process()`.
pub fn convert_result_callback_on<T, R>(reactor: &Reactor, callback: R) -> DeferredResultCallback<T, R>
where
    T: Send + 'static,
    R: ResultCallback<T> + 'static,
{
    DeferredResultCallback {
        reactor: reactor.clone(),
        callback: Arc::new(callback),
        guard: TerminalGuard::new(),
        _value: PhantomData,
    }
}

impl<T, R> DeferredResultCallback<T, R>
where
    T: Send + 'static,
    R: ResultCallback<T> + 'static,
{
    fn defer(&self, label: &'static str, outcome: Outcome<T>) {
        if !self.guard.claim(label) {
            return;
        }
        let callback = Arc::clone(&self.callback);
        self.reactor
            .enqueue(CallTask::labeled(label, move || callback.on_result(outcome)));
    }
}

impl<T, R> Callback<T> for DeferredResultCallback<T, R>
where
    T: Send + 'static,
    R: ResultCallback<T> + 'static,
{
    fn success(&self, value: T) {
        self.defer("result.success", Outcome::succeeded(value));
    }

    fn fail(&self, cause: Cause) {
        self.defer("result.fail", Outcome::failed(cause));
    }

    fn timeout(&self) {
        self.defer("result.timeout", Outcome::timeout());
    }
}

/// Result callback that queues outcomes for a simple callback.
///
/// Created by [`convert_callback_on`].
pub struct DeferredSimpleCallback<T, C> {
    reactor: Reactor,
    callback: Arc<C>,
    guard: TerminalGuard,
    _value: PhantomData<fn(T)>,
}

/// Like [`crate::convert_callback`], but the simple callback is invoked
/// inside `reactor.process()`.
pub fn convert_callback_on<T, C>(reactor: &Reactor, callback: C) -> DeferredSimpleCallback<T, C>
where
    T: Send + 'static,
    C: Callback<T> + 'static,
{
    DeferredSimpleCallback {
        reactor: reactor.clone(),
        callback: Arc::new(callback),
        guard: TerminalGuard::new(),
        _value: PhantomData,
    }
}

impl<T, C> ResultCallback<T> for DeferredSimpleCallback<T, C>
where
    T: Send + 'static,
    C: Callback<T> + 'static,
{
    fn on_result(&self, outcome: Outcome<T>) {
        if !self.guard.claim("callback.on_result") {
            return;
        }
        let callback = Arc::clone(&self.callback);
        self.reactor.enqueue(CallTask::labeled("callback.on_result", move || {
            deliver_outcome(&*callback, outcome)
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::thread;
    use tether_core::{FnCallback, TetherError};

    #[derive(Clone, Debug, PartialEq)]
    struct Employee {
        name: String,
    }

    fn rick() -> Employee {
        Employee {
            name: "Rick".to_string(),
        }
    }

    #[test]
    fn test_deferred_promise_completes_on_process() {
        let seen = Arc::new(Mutex::new(None));
        let promise = Promise::new();
        {
            let seen = Arc::clone(&seen);
            promise.then(move |e: &Employee| *seen.lock() = Some(e.clone()));
        }
        let reactor = Reactor::new();

        let callback = convert_promise_on(&reactor, &promise);
        callback.success(rick());

        assert!(seen.lock().is_none());
        assert!(!promise.complete());
        assert_eq!(reactor.pending(), 1);

        reactor.process();

        assert_eq!(seen.lock().clone(), Some(rick()));
        assert!(promise.complete());
        assert!(promise.success());
        assert!(!promise.failure());
        assert_eq!(promise.value().unwrap().name, "Rick");
    }

    #[test]
    fn test_deferred_promise_failure_and_timeout() {
        let reactor = Reactor::new();
        let failed: Promise<Employee> = Promise::new();
        let expired: Promise<Employee> = Promise::new();

        convert_promise_on(&reactor, &failed).fail_with_message("NOT FOUND");
        convert_promise_on(&reactor, &expired).timeout();
        assert!(!failed.complete());
        assert!(!expired.complete());

        assert_eq!(reactor.process().executed, 2);

        assert!(failed.failure());
        assert_eq!(failed.cause().unwrap().to_string(), "NOT FOUND");
        assert!(expired.failure());
        assert!(expired.cause().unwrap().is_timeout());
    }

    #[test]
    fn test_deferred_promise_queues_single_task() {
        let reactor = Reactor::new();
        let promise: Promise<u32> = Promise::new();
        let callback = convert_promise_on(&reactor, &promise);

        callback.success(1);
        callback.success(2);
        callback.timeout();

        assert_eq!(reactor.pending(), 1);
        reactor.process();
        assert_eq!(promise.value(), Ok(&1));
    }

    #[test]
    fn test_deferred_result_callback() {
        let slot = Arc::new(Mutex::new(None));
        let sink = {
            let slot = Arc::clone(&slot);
            move |outcome: Outcome<Employee>| *slot.lock() = Some(outcome)
        };
        let reactor = Reactor::new();

        let callback = convert_result_callback_on(&reactor, sink);
        callback.success(rick());
        assert!(slot.lock().is_none());

        reactor.process();

        let outcome = slot.lock().take().unwrap();
        assert!(outcome.complete());
        assert!(outcome.success());
        assert!(!outcome.failure());
        assert_eq!(outcome.value().unwrap().name, "Rick");
    }

    #[test]
    fn test_deferred_simple_callback() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let simple = {
            let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
            FnCallback::new(
                move |v: u32| a.lock().push(format!("success {v}")),
                move |e: Cause| b.lock().push(format!("fail {e}")),
                move || c.lock().push("timeout".to_string()),
            )
        };
        let reactor = Reactor::new();

        let callback = convert_callback_on(&reactor, simple);
        callback.reply_timeout();
        callback.reply(4);
        assert!(log.lock().is_empty());

        reactor.process();
        assert_eq!(*log.lock(), vec!["timeout"]);
    }

    #[test]
    fn test_deliveries_follow_enqueue_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let reactor = Reactor::new();
        let promises: Vec<Promise<usize>> = (0..3).map(|_| Promise::new()).collect();
        for promise in &promises {
            let order = Arc::clone(&order);
            promise.then(move |v| order.lock().push(*v));
        }

        for (i, promise) in promises.iter().enumerate().rev() {
            convert_promise_on(&reactor, promise).success(i);
        }
        reactor.process();

        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[test]
    fn test_producers_on_other_threads() {
        let reactor = Reactor::new();
        let promise: Promise<u32> = Promise::new();
        let callback = Arc::new(convert_promise_on(&reactor, &promise));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let callback = Arc::clone(&callback);
                thread::spawn(move || callback.success(i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(reactor.pending(), 1);
        assert!(!promise.complete());
        reactor.process();
        assert!(promise.success());
    }

    #[test]
    fn test_settled_elsewhere_reports_without_overwrite() {
        let reactor = Reactor::new();
        let promise: Promise<u32> = Promise::new();

        convert_promise_on(&reactor, &promise).success(1);
        promise.resolve(2).unwrap();

        let report = reactor.process();
        assert_eq!(report.panicked, 0);
        assert_eq!(promise.value(), Ok(&2));
        assert_eq!(promise.resolve(3), Err(TetherError::AlreadyCompleted));
    }
}
