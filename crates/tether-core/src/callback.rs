//! The two sink shapes: simple callbacks and result callbacks

use std::sync::Arc;

use crate::{Cause, Outcome};

/// Simple callback - one method per terminal outcome.
///
/// Exactly one of the three methods is meant to be called, exactly once, per
/// logical operation. Calling more than one is a caller error; sinks built by
/// the converters ignore the extra calls.
pub trait Callback<T>: Send + Sync {
    fn success(&self, value: T);

    fn fail(&self, cause: Cause);

    fn timeout(&self);

    /// Fail with a plain message
    fn fail_with_message(&self, message: &str) {
        self.fail(Cause::message(message));
    }

    /// Deliver a `Result` as success or failure
    fn complete_with(&self, result: Result<T, Cause>) {
        match result {
            Ok(value) => self.success(value),
            Err(cause) => self.fail(cause),
        }
    }
}

impl<T, C: Callback<T> + ?Sized> Callback<T> for Arc<C> {
    fn success(&self, value: T) {
        (**self).success(value);
    }

    fn fail(&self, cause: Cause) {
        (**self).fail(cause);
    }

    fn timeout(&self) {
        (**self).timeout();
    }
}

impl<T, C: Callback<T> + ?Sized> Callback<T> for Box<C> {
    fn success(&self, value: T) {
        (**self).success(value);
    }

    fn fail(&self, cause: Cause) {
        (**self).fail(cause);
    }

    fn timeout(&self) {
        (**self).timeout();
    }
}

/// Result callback - a single method receiving a terminal [`Outcome`].
///
/// Any `Fn(Outcome<T>) + Send + Sync` closure is a result callback.
pub trait ResultCallback<T>: Send + Sync {
    fn on_result(&self, outcome: Outcome<T>);

    fn reply(&self, value: T) {
        self.on_result(Outcome::succeeded(value));
    }

    fn reject(&self, cause: Cause) {
        self.on_result(Outcome::failed(cause));
    }

    fn reject_with_message(&self, message: &str) {
        self.on_result(Outcome::failed(Cause::message(message)));
    }

    fn reply_timeout(&self) {
        self.on_result(Outcome::timeout());
    }
}

impl<T, F> ResultCallback<T> for F
where
    F: Fn(Outcome<T>) + Send + Sync,
{
    fn on_result(&self, outcome: Outcome<T>) {
        self(outcome)
    }
}

/// Simple callback assembled from three closures
pub struct FnCallback<S, F, O> {
    on_success: S,
    on_fail: F,
    on_timeout: O,
}

impl<S, F, O> FnCallback<S, F, O> {
    pub fn new(on_success: S, on_fail: F, on_timeout: O) -> Self {
        FnCallback {
            on_success,
            on_fail,
            on_timeout,
        }
    }
}

impl<T, S, F, O> Callback<T> for FnCallback<S, F, O>
where
    S: Fn(T) + Send + Sync,
    F: Fn(Cause) + Send + Sync,
    O: Fn() + Send + Sync,
{
    fn success(&self, value: T) {
        (self.on_success)(value);
    }

    fn fail(&self, cause: Cause) {
        (self.on_fail)(cause);
    }

    fn timeout(&self) {
        (self.on_timeout)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_closure_is_result_callback() {
        let seen: Arc<Mutex<Option<Outcome<u32>>>> = Arc::new(Mutex::new(None));
        let sink = {
            let seen = Arc::clone(&seen);
            move |outcome: Outcome<u32>| *seen.lock() = Some(outcome)
        };

        sink.reply(7);
        let outcome = seen.lock().take().unwrap();
        assert_eq!(outcome.value(), Ok(&7));

        sink.reply_timeout();
        let outcome = seen.lock().take().unwrap();
        assert!(outcome.is_timeout());

        sink.reject_with_message("NOT FOUND");
        let outcome = seen.lock().take().unwrap();
        assert_eq!(outcome.cause().unwrap().to_string(), "NOT FOUND");
    }

    #[test]
    fn test_fn_callback_routes_each_method() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let callback = {
            let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
            FnCallback::new(
                move |v: u32| a.lock().push(format!("success {v}")),
                move |e: Cause| b.lock().push(format!("fail {e}")),
                move || c.lock().push("timeout".to_string()),
            )
        };

        callback.success(1);
        callback.fail_with_message("boom");
        callback.timeout();
        callback.complete_with(Ok(2));

        assert_eq!(
            *log.lock(),
            vec!["success 1", "fail boom", "timeout", "success 2"]
        );
    }

    #[test]
    fn test_arc_callback_delegates() {
        let hits = Arc::new(Mutex::new(0u32));
        let inner = {
            let (a, b, c) = (Arc::clone(&hits), Arc::clone(&hits), Arc::clone(&hits));
            FnCallback::new(
                move |v: u32| *a.lock() += v,
                move |_: Cause| *b.lock() += 100,
                move || *c.lock() += 1000,
            )
        };
        let shared: Arc<dyn Callback<u32>> = Arc::new(inner);

        shared.success(5);
        shared.timeout();
        assert_eq!(*hits.lock(), 1005);
    }
}
