//! Producer guard - run producer code and always deliver a terminal outcome

use std::panic::{self, AssertUnwindSafe};

use tether_core::{panic_message, Callback, Cause, Outcome, ResultCallback, TetherError};

fn run_producer<T, F>(producer: F) -> Outcome<T>
where
    F: FnOnce() -> Result<T, Cause>,
{
    match panic::catch_unwind(AssertUnwindSafe(producer)) {
        Ok(result) => Outcome::from_result(result),
        Err(payload) => {
            let message = panic_message(&*payload);
            tracing::error!(panic = %message, "producer panicked, delivering failure");
            Outcome::failed(TetherError::ProducerPanicked(message))
        }
    }
}

/// Run `producer` and complete `callback` with its result.
///
/// `Ok` becomes `success`, `Err` becomes `fail`, and a panic becomes `fail`
/// with [`TetherError::ProducerPanicked`]; the panic never reaches the sink's
/// caller.
pub fn complete_from<T, C, F>(callback: &C, producer: F)
where
    C: Callback<T> + ?Sized,
    F: FnOnce() -> Result<T, Cause>,
{
    match run_producer(producer).into_result() {
        Ok(value) => callback.success(value),
        Err(cause) => callback.fail(cause),
    }
}

/// Run `producer` and hand its outcome to a result callback
pub fn reply_from<T, R, F>(callback: &R, producer: F)
where
    R: ResultCallback<T> + ?Sized,
    F: FnOnce() -> Result<T, Cause>,
{
    callback.on_result(run_producer(producer));
}
