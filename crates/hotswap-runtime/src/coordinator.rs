//! Multi-session fan-out with per-worker serialization.
//!
//! A live worker/process cannot safely accept concurrent commands, so the
//! batch keeps one FIFO queue per worker: items in the same queue run
//! strictly in submission order inside a single spawned task, while
//! distinct workers drain independently and possibly in parallel. No
//! ordering exists across workers.

use std::collections::HashMap;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hotswap_kernel::{SwapError, SwapResult, WorkerId};

struct WorkItem {
    /// Identifies the item in failure reports, typically the session id.
    label: String,
    task: BoxFuture<'static, SwapResult<()>>,
}

/// Worker-keyed task queues submitted to the coordinator in one call.
#[derive(Default)]
pub struct WorkBatch {
    queues: HashMap<WorkerId, Vec<WorkItem>>,
}

impl WorkBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to `worker`'s queue.
    pub fn push(
        &mut self,
        worker: WorkerId,
        label: impl Into<String>,
        task: BoxFuture<'static, SwapResult<()>>,
    ) {
        self.queues.entry(worker).or_default().push(WorkItem {
            label: label.into(),
            task,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Total number of queued items across all workers.
    pub fn len(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }

    pub fn worker_count(&self) -> usize {
        self.queues.len()
    }
}

/// One session-fatal task failure, reported as data.
#[derive(Debug)]
pub struct TaskFailure {
    pub worker: WorkerId,
    pub label: String,
    pub error: SwapError,
}

/// What happened to a batch: how many items ran, how many were skipped by
/// cancellation or an earlier failure on their worker, and the failures.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: usize,
    pub skipped: usize,
    pub failures: Vec<TaskFailure>,
}

impl BatchReport {
    pub fn all_completed(&self) -> bool {
        self.skipped == 0 && self.failures.is_empty()
    }

    fn merge(&mut self, other: BatchReport) {
        self.completed += other.completed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

/// Runs work batches to completion.
pub struct Coordinator;

impl Coordinator {
    /// Drain every worker's queue, concurrently across workers.
    ///
    /// Cancellation is cooperative: once the token is set no unstarted item
    /// begins, and in-flight items are expected to poll the shared progress
    /// sink themselves; nothing is forcibly preempted. A failing item skips
    /// the rest of its own worker's queue for this pass (the failure is
    /// session-fatal by construction — sub-fatal problems are reported as
    /// data inside tasks) and leaves sibling workers untouched.
    ///
    /// Returns only once every queue has drained or been halted. Never
    /// returns an error: failures, including a panicking worker task, are
    /// folded into the [`BatchReport`].
    pub async fn run(batch: WorkBatch, cancel: CancellationToken) -> BatchReport {
        let mut handles = Vec::with_capacity(batch.queues.len());
        for (worker, queue) in batch.queues {
            let token = cancel.clone();
            let handle = tokio::spawn(Self::drain_worker(worker.clone(), queue, token));
            handles.push((worker, handle));
        }

        let mut report = BatchReport::default();
        for (worker, handle) in handles {
            match handle.await {
                Ok(worker_report) => report.merge(worker_report),
                Err(join_err) => {
                    warn!(worker = %worker, error = %join_err, "worker task aborted");
                    report.failures.push(TaskFailure {
                        worker,
                        label: "<worker queue>".to_string(),
                        error: SwapError::Internal(format!("worker task panicked: {join_err}")),
                    });
                }
            }
        }
        report
    }

    async fn drain_worker(
        worker: WorkerId,
        queue: Vec<WorkItem>,
        cancel: CancellationToken,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut halted = false;

        for item in queue {
            if halted || cancel.is_cancelled() {
                report.skipped += 1;
                continue;
            }
            debug!(worker = %worker, label = %item.label, "running task");
            match item.task.await {
                Ok(()) => report.completed += 1,
                Err(error) => {
                    warn!(worker = %worker, label = %item.label, %error, "task failed, skipping rest of this worker's queue");
                    report.failures.push(TaskFailure {
                        worker: worker.clone(),
                        label: item.label,
                        error,
                    });
                    halted = true;
                }
            }
        }
        report
    }
}
