//! Bounded worker pool with a hard wait budget per submission.
//!
//! The pool provides admission control, not deduplication: two concurrent
//! requests for the same charge are both admitted and both run. Correctness
//! under that race belongs to the optimistic lock and the conflict errors,
//! not to this component.

use std::{
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use chargeflow_interfaces::ObservabilityInterface;
use error_stack::report;
use futures::future::BoxFuture;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};

use crate::{errors::OperationError, metrics, settings::ExecutorSettings};

type Job = BoxFuture<'static, ()>;

/// Tri-state outcome of running work on the pool.
#[derive(Debug)]
pub enum ExecutionResult<T> {
    Completed(T),
    /// The wait budget elapsed but the work was **not** cancelled: it keeps
    /// its worker and persists its own result through the normal
    /// post-operation path. Callers surface this as "operation already in
    /// progress", never as a failure — cancelling a half-completed gateway
    /// call is unsafe, the gateway may have already moved money.
    StillInProgress,
    Failed(error_stack::Report<OperationError>),
}

pub struct GatewayExecutor {
    intake: Mutex<Option<mpsc::Sender<Job>>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
    observability: Arc<dyn ObservabilityInterface>,
    queue_wait_warn_threshold: Duration,
}

impl GatewayExecutor {
    /// Spawns the worker pool. Must be called from within a tokio runtime.
    pub fn new(
        settings: &ExecutorSettings,
        observability: Arc<dyn ObservabilityInterface>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>(settings.queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..settings.pool_size())
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        let job = receiver.lock().await.recv().await;
                        match job {
                            // Spawning the job keeps a panicking work item
                            // from taking the worker down with it.
                            Some(job) => {
                                if let Err(error) = tokio::spawn(job).await {
                                    tracing::error!(worker, %error, "gateway work aborted");
                                }
                            }
                            None => break,
                        }
                    }
                })
            })
            .collect();

        Self {
            intake: Mutex::new(Some(sender)),
            workers: tokio::sync::Mutex::new(workers),
            observability,
            queue_wait_warn_threshold: settings.queue_wait_warn_threshold(),
        }
    }

    /// Runs `work` on the pool, waiting up to `wait_budget` for its result.
    ///
    /// Typed failures from the work pass through unwrapped so callers can
    /// handle them on the normal error path. Work that outlives the budget
    /// continues to completion in the background.
    pub async fn execute<T, F>(&self, wait_budget: Duration, work: F) -> ExecutionResult<T>
    where
        T: Send + 'static,
        F: Future<Output = crate::errors::OperationResult<T>> + Send + 'static,
    {
        let sender = {
            let intake = self.intake.lock().unwrap_or_else(|poisoned| {
                poisoned.into_inner()
            });
            match intake.as_ref() {
                Some(sender) => sender.clone(),
                None => {
                    return ExecutionResult::Failed(
                        report!(OperationError::Internal)
                            .attach_printable("executor is shut down"),
                    )
                }
            }
        };

        let (reply, receiver) = oneshot::channel();
        let submitted_at = Instant::now();
        let observability = Arc::clone(&self.observability);
        let warn_threshold = self.queue_wait_warn_threshold;

        let job: Job = Box::pin(async move {
            let queue_wait = submitted_at.elapsed();
            observability.record_histogram(
                metrics::EXECUTOR_QUEUE_WAIT_MS,
                queue_wait.as_secs_f64() * 1_000.0,
            );
            if queue_wait > warn_threshold {
                tracing::warn!(
                    queue_wait_ms = %queue_wait.as_millis(),
                    "work waited past the capacity-warning threshold before starting"
                );
            }
            let result = work.await;
            // The caller may have stopped waiting; side effects are already
            // persisted by the work itself, so a dropped receiver is fine.
            let _ = reply.send(result);
        });

        // Admission shares the wait budget. Work rejected here never
        // started, so no side effect is lost by failing the submission —
        // `StillInProgress` is reserved for work that is actually running.
        match tokio::time::timeout(wait_budget, sender.send(job)).await {
            Err(_elapsed) => {
                self.observability
                    .increment_counter(metrics::EXECUTOR_REJECTED_WORK, &[]);
                return ExecutionResult::Failed(
                    report!(OperationError::Internal)
                        .attach_printable("worker pool intake stayed full past the wait budget"),
                );
            }
            Ok(Err(_closed)) => {
                return ExecutionResult::Failed(
                    report!(OperationError::Internal)
                        .attach_printable("executor intake closed while submitting work"),
                );
            }
            Ok(Ok(())) => {}
        }

        let remaining = wait_budget.saturating_sub(submitted_at.elapsed());
        match tokio::time::timeout(remaining, receiver).await {
            Ok(Ok(Ok(value))) => ExecutionResult::Completed(value),
            Ok(Ok(Err(error))) => ExecutionResult::Failed(error),
            Ok(Err(_dropped)) => ExecutionResult::Failed(
                report!(OperationError::Internal)
                    .attach_printable("gateway work dropped without reporting a result"),
            ),
            Err(_elapsed) => ExecutionResult::StillInProgress,
        }
    }

    /// Closes the intake and joins the workers once queued work drains.
    pub async fn shutdown(&self) {
        let sender = self
            .intake
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(sender);

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(error) = handle.await {
                tracing::error!(%error, "executor worker failed during drain");
            }
        }
    }
}
