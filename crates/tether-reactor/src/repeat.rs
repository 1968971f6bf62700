//! Repeating tasks run by the reactor's process pass

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tether_core::{panic_message, TetherError, TetherResult};

pub(crate) struct RepeatingTask {
    interval: Duration,
    last_run: Instant,
    run: Box<dyn FnMut() + Send>,
}

impl RepeatingTask {
    pub(crate) fn new(interval: Duration, registered_at: Instant, run: Box<dyn FnMut() + Send>) -> Self {
        RepeatingTask {
            interval,
            last_run: registered_at,
            run,
        }
    }

    pub(crate) fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_run) >= self.interval
    }

    pub(crate) fn run(&mut self, now: Instant) -> TetherResult<()> {
        self.last_run = now;
        panic::catch_unwind(AssertUnwindSafe(|| (self.run)()))
            .map_err(|payload| TetherError::TaskPanicked(panic_message(&*payload)))
    }
}
