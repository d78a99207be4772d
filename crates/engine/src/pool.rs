//! Fixed-size worker pool draining a bounded operation queue.
//!
//! Callers submit a future with [`WorkerPool::execute`] and wait on a private
//! oneshot channel for its result. Submission blocks while the queue is full.
//! A panic inside an operation is caught and handed back to its caller as
//! [`EngineError::WorkerPanic`]; the worker carries on with the next job.
//!
//! A caller that stops waiting does not cancel its operation. The job runs
//! to completion and its result is discarded.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use deckstore_core::error::CoreError;

use crate::error::{EngineError, EngineResult};

type Job = BoxFuture<'static, ()>;

#[derive(Debug)]
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    workers: usize,
}

impl WorkerPool {
    /// Spawn `workers` tasks sharing a queue of `queue_capacity` slots.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(workers: usize, queue_capacity: usize) -> EngineResult<Self> {
        if workers == 0 {
            return Err(
                CoreError::InvalidParameter("worker count must be at least 1".into()).into(),
            );
        }
        if queue_capacity == 0 {
            return Err(
                CoreError::InvalidParameter("queue capacity must be at least 1".into()).into(),
            );
        }

        let (sender, receiver) = mpsc::channel::<Job>(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        for worker_id in 0..workers {
            tracker.spawn(run_worker(worker_id, Arc::clone(&receiver), cancel.clone()));
        }
        tracker.close();

        tracing::info!(workers, queue_capacity, "Worker pool started");
        Ok(Self {
            sender,
            cancel,
            tracker,
            workers,
        })
    }

    /// Number of worker tasks consuming the queue.
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Queue `op` and wait for its result.
    pub async fn execute<T, Fut>(&self, op: Fut) -> EngineResult<T>
    where
        T: Send + 'static,
        Fut: Future<Output = EngineResult<T>> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(EngineError::PoolClosed);
        }

        let (reply, response) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let result = match AssertUnwindSafe(op).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(error = %message, "Operation panicked");
                    Err(EngineError::WorkerPanic(message))
                }
            };
            // The caller may have stopped waiting.
            let _ = reply.send(result);
        });

        self.sender
            .send(job)
            .await
            .map_err(|_| EngineError::PoolClosed)?;
        response.await.map_err(|_| EngineError::PoolClosed)?
    }

    /// Stop accepting work, finish everything already queued, and wait for
    /// every worker to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.wait().await;
        tracing::info!("Worker pool drained");
    }
}

async fn run_worker(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    cancel: CancellationToken,
) {
    tracing::debug!(worker_id, "Worker started");
    loop {
        let job = {
            let mut rx = receiver.lock().await;
            tokio::select! {
                job = rx.recv() => job,
                _ = cancel.cancelled() => {
                    // Closing keeps buffered jobs receivable.
                    rx.close();
                    rx.recv().await
                }
            }
        };
        match job {
            Some(job) => job.await,
            None => break,
        }
    }
    tracing::debug!(worker_id, "Worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
