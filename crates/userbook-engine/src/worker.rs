//! Ordered background execution
//!
//! A single tokio task drains a queue of jobs and runs each one on the
//! blocking pool, one at a time. Jobs therefore start and finish in the
//! order they were submitted, and SQLite work never runs on the caller's
//! async task.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use userbook_core::errors::{ExError, ExErrorKind};
use userbook_core_types::RequestId;
use userbook_store::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the job queue; clones feed the same worker
#[derive(Clone)]
pub(crate) struct Worker {
    tx: mpsc::UnboundedSender<Job>,
}

impl Worker {
    /// Start the worker on the current tokio runtime
    ///
    /// The worker stops once every handle has been dropped and the queue is
    /// drained.
    pub(crate) fn spawn() -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ExError::new(ExErrorKind::Concurrency)
                .with_op("worker_spawn")
                .with_message(format!("repository needs a tokio runtime: {}", e))
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        runtime.spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = tokio::task::spawn_blocking(job).await {
                    tracing::error!(error = %e, "repository job panicked");
                }
            }
            tracing::debug!("repository worker stopped");
        });

        Ok(Self { tx })
    }

    /// Queue `job`; its position in the queue is fixed by this call
    pub(crate) fn submit<T, F>(&self, request_id: RequestId, job: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let boxed: Job = Box::new(move || {
            // The caller may have dropped its Pending; the work still counts
            let _ = reply_tx.send(job());
        });

        // On failure the job, and with it `reply_tx`, is dropped, which the
        // Pending reports as a Concurrency error.
        if self.tx.send(boxed).is_err() {
            tracing::warn!(request_id = %request_id, "job submitted after worker stopped");
        }

        Pending {
            request_id,
            rx: reply_rx,
        }
    }
}

/// Completion handle for a submitted repository operation
///
/// Awaiting yields the operation's result. Dropping it does not cancel the
/// operation; it runs anyway, in order.
#[must_use = "the operation runs regardless; await the handle to observe its result"]
pub struct Pending<T> {
    request_id: RequestId,
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Pending<T> {
    /// Correlation id that appears on this operation's log events
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll(cx).map(|reply| {
            reply.unwrap_or_else(|_| {
                Err(ExError::new(ExErrorKind::Concurrency)
                    .with_op("await_reply")
                    .with_request_id(this.request_id.clone())
                    .with_message("repository worker dropped the operation"))
            })
        })
    }
}
