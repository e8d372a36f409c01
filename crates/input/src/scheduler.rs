//! Deferred work on a single serial context.
//!
//! The hook callback never does real work: it classifies the event and
//! schedules the follow-up here. Every queue mutation and guard transition
//! made by those follow-ups therefore runs on one thread, one at a time.

use crate::error::InputError;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks after a delay, serially.
pub trait Scheduler: Send + Sync {
    /// Run `task` no earlier than `after` from now.
    fn schedule(&self, after: Duration, task: Task);
}

pub type SchedulerRef = Arc<dyn Scheduler>;

/// Scheduler backed by a dedicated thread running a single-threaded tokio
/// runtime. Delayed tasks overlap while waiting but never run concurrently.
pub struct SerialScheduler {
    tx: Option<mpsc::UnboundedSender<(Duration, Task)>>,
    thread: Option<JoinHandle<()>>,
}

impl SerialScheduler {
    pub fn start() -> Result<Self, InputError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| InputError::SchedulerFailed(e.to_string()))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<(Duration, Task)>();

        let thread = std::thread::Builder::new()
            .name("flowclip-scheduler".into())
            .spawn(move || {
                runtime.block_on(async move {
                    while let Some((after, task)) = rx.recv().await {
                        tokio::spawn(async move {
                            if !after.is_zero() {
                                tokio::time::sleep(after).await;
                            }
                            task();
                        });
                    }
                });
                tracing::debug!("scheduler stopped");
            })
            .map_err(|e| InputError::SchedulerFailed(e.to_string()))?;

        Ok(Self {
            tx: Some(tx),
            thread: Some(thread),
        })
    }
}

impl Scheduler for SerialScheduler {
    fn schedule(&self, after: Duration, task: Task) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send((after, task)).is_err() {
            tracing::warn!("scheduler is gone, dropping task");
        }
    }
}

impl Drop for SerialScheduler {
    fn drop(&mut self) {
        // Closing the channel ends the receive loop; pending delayed tasks are dropped.
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() != std::thread::current().id() {
                let _ = thread.join();
            }
        }
    }
}

impl std::fmt::Debug for SerialScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialScheduler")
            .field("running", &self.tx.is_some())
            .finish_non_exhaustive()
    }
}

struct PendingTask {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingTask>,
}

/// Scheduler driven by hand over a virtual clock.
///
/// Tasks run only when the owner calls [`advance`](Self::advance) or
/// [`run_until_idle`](Self::run_until_idle), on the caller's thread, in due
/// order with ties broken by scheduling order.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed so far.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of tasks not yet run.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Move the clock forward by `by`, running everything that falls due.
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;
        while let Some(task) = self.pop_due(Some(target)) {
            task();
            ran += 1;
        }
        self.lock().now = target;
        ran
    }

    /// Run every pending task, including ones scheduled by tasks that ran,
    /// jumping the clock as needed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop_due(None) {
            task();
            ran += 1;
        }
        ran
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop_due(&self, limit: Option<Duration>) -> Option<Task> {
        let mut state = self.lock();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| limit.map_or(true, |limit| p.due <= limit))
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;

        let pending = state.pending.swap_remove(index);
        state.now = state.now.max(pending.due);
        Some(pending.task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, after: Duration, task: Task) {
        let mut state = self.lock();
        let due = state.now + after;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.push(PendingTask { due, seq, task });
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}
