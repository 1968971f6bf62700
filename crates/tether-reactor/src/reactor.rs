//! Tether Reactor - deferred delivery queue and process pass

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tether_core::Callback;

use crate::deadline::{Deadline, TrackedCallback};
use crate::repeat::RepeatingTask;
use crate::CallTask;

/// Reactor configuration
#[derive(Clone, Debug)]
pub struct ReactorConfig {
    /// Label attached to log output
    pub name: String,
    /// Deadline used by [`Reactor::track_default`]
    pub default_timeout: Duration,
    /// A process pass slower than this is logged as a warning
    pub slow_pass_warning: Duration,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        ReactorConfig {
            name: "reactor".to_string(),
            default_timeout: Duration::from_secs(30),
            slow_pass_warning: Duration::from_millis(50),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReactorStats {
    pub process_calls: u64,
    pub skipped_passes: u64,
    pub tasks_enqueued: u64,
    pub tasks_executed: u64,
    pub task_panics: u64,
    pub deadlines_expired: u64,
    pub repeating_runs: u64,
    pub last_process_duration: Duration,
}

/// Summary of a single process pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Call tasks run in this pass, panicked ones included
    pub executed: usize,
    pub panicked: usize,
    /// Tracked callbacks that received `timeout()`
    pub expired: usize,
    pub repeated: usize,
    /// Another pass was already draining; nothing ran
    pub skipped: bool,
}

struct ReactorInner {
    config: ReactorConfig,
    /// Pending call tasks, FIFO
    queue: Mutex<VecDeque<CallTask>>,
    /// Held for the duration of a process pass
    drain: Mutex<()>,
    deadlines: Mutex<Vec<Arc<dyn Deadline>>>,
    repeating: Mutex<Vec<RepeatingTask>>,
    stats: Mutex<ReactorStats>,
}

/// Deferred-execution processor.
///
/// Producers on any thread enqueue call tasks; whoever calls
/// [`Reactor::process`] runs them, in enqueue order, on its own thread.
/// Cloning yields another handle to the same reactor.
#[derive(Clone)]
pub struct Reactor {
    inner: Arc<ReactorInner>,
}

impl Reactor {
    /// Create a reactor with default configuration
    pub fn new() -> Self {
        Self::with_config(ReactorConfig::default())
    }

    /// Create a reactor with custom configuration
    pub fn with_config(config: ReactorConfig) -> Self {
        Reactor {
            inner: Arc::new(ReactorInner {
                config,
                queue: Mutex::new(VecDeque::new()),
                drain: Mutex::new(()),
                deadlines: Mutex::new(Vec::new()),
                repeating: Mutex::new(Vec::new()),
                stats: Mutex::new(ReactorStats::default()),
            }),
        }
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> ReactorStats {
        self.inner.stats.lock().clone()
    }

    /// Number of call tasks waiting for the next pass
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Queue a call task for the next process pass
    pub fn enqueue(&self, task: CallTask) {
        tracing::trace!(reactor = %self.inner.config.name, label = task.label(), "enqueue");
        let mut queue = self.inner.queue.lock();
        queue.push_back(task);
        // Counted under the queue lock so a pass never executes a task
        // before it has been counted as enqueued.
        self.inner.stats.lock().tasks_enqueued += 1;
    }

    /// Queue a closure for the next process pass
    pub fn defer<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(CallTask::new(f));
    }

    /// Wrap `callback` so that the sweep delivers `timeout()` if no terminal
    /// call arrives within `timeout`
    pub fn track<T, C>(&self, callback: C, timeout: Duration) -> TrackedCallback<T>
    where
        T: 'static,
        C: Callback<T> + 'static,
    {
        self.track_until(callback, Instant::now() + timeout)
    }

    /// Like [`Reactor::track`] with the configured default timeout
    pub fn track_default<T, C>(&self, callback: C) -> TrackedCallback<T>
    where
        T: 'static,
        C: Callback<T> + 'static,
    {
        self.track(callback, self.inner.config.default_timeout)
    }

    pub fn track_until<T, C>(&self, callback: C, deadline: Instant) -> TrackedCallback<T>
    where
        T: 'static,
        C: Callback<T> + 'static,
    {
        let tracked = TrackedCallback::new(Box::new(callback), deadline);
        self.inner.deadlines.lock().push(tracked.entry());
        tracked
    }

    /// Number of tracked callbacks still waiting on their deadline
    pub fn tracked(&self) -> usize {
        self.inner
            .deadlines
            .lock()
            .iter()
            .filter(|entry| !entry.is_done())
            .count()
    }

    /// Run `f` during process passes, at most once per `interval`
    pub fn add_repeating_task<F>(&self, interval: Duration, f: F)
    where
        F: FnMut() + Send + 'static,
    {
        let task = RepeatingTask::new(interval, Instant::now(), Box::new(f));
        self.inner.repeating.lock().push(task);
    }

    /// Drain the queue on the calling thread.
    ///
    /// Passes never overlap. If another thread is already draining, this call
    /// returns at once with [`ProcessReport::skipped`] set and runs nothing:
    /// tasks the caller queued earlier have NOT run when it returns, and stay
    /// queued for the next pass. Callers that need their tasks delivered
    /// should drain from a single thread or call again after a skipped pass.
    pub fn process(&self) -> ProcessReport {
        self.process_at(Instant::now())
    }

    /// Drain the queue, using `now` for deadline and repeating-task checks.
    ///
    /// Only the tasks queued when the pass starts are run; tasks queued while
    /// it runs wait for the next pass. A concurrent or re-entrant call returns
    /// a skipped report without running anything.
    pub fn process_at(&self, now: Instant) -> ProcessReport {
        let Some(_draining) = self.inner.drain.try_lock() else {
            tracing::debug!(reactor = %self.inner.config.name, "process pass already active, skipping");
            self.inner.stats.lock().skipped_passes += 1;
            return ProcessReport {
                skipped: true,
                ..ProcessReport::default()
            };
        };

        let start = Instant::now();
        let mut report = ProcessReport::default();

        // Stage 1: Capture the batch
        let batch = std::mem::take(&mut *self.inner.queue.lock());

        // Stage 2: Deliver in FIFO order
        self.run_batch(batch, &mut report);

        // Stage 3: Expire overdue tracked callbacks
        report.expired = self.sweep_deadlines(now);

        // Stage 4: Repeating tasks
        self.run_repeating(now, &mut report);

        let elapsed = start.elapsed();
        {
            let mut stats = self.inner.stats.lock();
            stats.process_calls += 1;
            stats.tasks_executed += report.executed as u64;
            stats.task_panics += report.panicked as u64;
            stats.deadlines_expired += report.expired as u64;
            stats.repeating_runs += report.repeated as u64;
            stats.last_process_duration = elapsed;
        }

        if elapsed > self.inner.config.slow_pass_warning {
            tracing::warn!(
                reactor = %self.inner.config.name,
                elapsed_ms = elapsed.as_millis() as u64,
                executed = report.executed,
                "slow process pass"
            );
        }
        tracing::debug!(
            reactor = %self.inner.config.name,
            executed = report.executed,
            panicked = report.panicked,
            expired = report.expired,
            repeated = report.repeated,
            "process pass complete"
        );

        report
    }

    fn run_batch(&self, batch: VecDeque<CallTask>, report: &mut ProcessReport) {
        for task in batch {
            let label = task.label();
            report.executed += 1;
            if let Err(error) = task.execute() {
                report.panicked += 1;
                tracing::error!(
                    reactor = %self.inner.config.name,
                    label,
                    %error,
                    "call task failed"
                );
            }
        }
    }

    fn sweep_deadlines(&self, now: Instant) -> usize {
        let entries = std::mem::take(&mut *self.inner.deadlines.lock());
        let mut remaining = Vec::with_capacity(entries.len());
        let mut expired = 0;

        for entry in entries {
            if entry.is_done() {
                continue;
            }
            if entry.deadline() > now {
                remaining.push(entry);
                continue;
            }
            let delivered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| entry.expire()));
            match delivered {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(payload) => {
                    expired += 1;
                    tracing::error!(
                        reactor = %self.inner.config.name,
                        panic = %tether_core::panic_message(&*payload),
                        "timeout delivery panicked"
                    );
                }
            }
        }

        // Entries tracked while the sweep ran were pushed onto the live list.
        let mut live = self.inner.deadlines.lock();
        remaining.append(&mut live);
        *live = remaining;
        expired
    }

    fn run_repeating(&self, now: Instant, report: &mut ProcessReport) {
        let mut tasks = std::mem::take(&mut *self.inner.repeating.lock());

        for task in tasks.iter_mut().filter(|task| task.is_due(now)) {
            report.repeated += 1;
            if let Err(error) = task.run(now) {
                report.panicked += 1;
                tracing::error!(reactor = %self.inner.config.name, %error, "repeating task failed");
            }
        }

        let mut live = self.inner.repeating.lock();
        tasks.append(&mut live);
        *live = tasks;
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("name", &self.inner.config.name)
            .field("pending", &self.pending())
            .finish()
    }
}
