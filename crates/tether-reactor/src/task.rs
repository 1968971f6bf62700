//! Call tasks - deferred deliveries queued on a reactor

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tether_core::{panic_message, TetherError, TetherResult};

/// A captured, not yet executed unit of work.
///
/// Runs at most once: [`CallTask::execute`] consumes the task.
pub struct CallTask {
    label: &'static str,
    run: Box<dyn FnOnce() + Send>,
}

impl CallTask {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::labeled("call", f)
    }

    /// Create a task with a label used in log output
    pub fn labeled<F>(label: &'static str, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        CallTask {
            label,
            run: Box::new(f),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Run the task, catching a panic as [`TetherError::TaskPanicked`]
    pub fn execute(self) -> TetherResult<()> {
        let run = self.run;
        panic::catch_unwind(AssertUnwindSafe(run))
            .map_err(|payload| TetherError::TaskPanicked(panic_message(&*payload)))
    }
}

impl fmt::Debug for CallTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTask")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
