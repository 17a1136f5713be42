use crate::cancel::CancelToken;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Error)]
#[error("worker pool is stopped")]
pub struct PoolClosed;

/// Fixed set of workers draining a bounded task queue. `submit` applies
/// backpressure by blocking on a full queue; `wait` returns once every
/// submitted task (including tasks submitted by tasks) has completed.
pub struct WorkerPool {
    tx: parking_lot::Mutex<Option<mpsc::Sender<Task>>>,
    pending: Arc<AtomicUsize>,
    drained: Arc<Notify>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(workers: usize, queue: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Task>(queue.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let pending = Arc::new(AtomicUsize::new(0));
        let drained = Arc::new(Notify::new());

        let handles = (0..workers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                let pending = Arc::clone(&pending);
                let drained = Arc::clone(&drained);
                tokio::spawn(async move {
                    loop {
                        let task = { rx.lock().await.recv().await };
                        let Some(task) = task else { break };
                        if AssertUnwindSafe(task).catch_unwind().await.is_err() {
                            tracing::warn!("worker task panicked");
                        }
                        if pending.fetch_sub(1, Ordering::AcqRel) == 1 {
                            drained.notify_waiters();
                        }
                    }
                })
            })
            .collect();

        Self {
            tx: parking_lot::Mutex::new(Some(tx)),
            pending,
            drained,
            workers: parking_lot::Mutex::new(handles),
        }
    }

    /// Enqueue a task, blocking while the queue is full.
    pub async fn submit(&self, task: Task) -> Result<(), PoolClosed> {
        let Some(tx) = self.tx.lock().clone() else {
            return Err(PoolClosed);
        };
        self.pending.fetch_add(1, Ordering::AcqRel);
        if tx.send(task).await.is_err() {
            self.settle_unsent();
            return Err(PoolClosed);
        }
        Ok(())
    }

    /// Like [`submit`](Self::submit), but gives the task up once `cancel`
    /// fires instead of waiting out the backpressure.
    pub async fn submit_unless_cancelled(
        &self,
        task: Task,
        cancel: &CancelToken,
    ) -> Result<(), PoolClosed> {
        let Some(tx) = self.tx.lock().clone() else {
            return Err(PoolClosed);
        };
        self.pending.fetch_add(1, Ordering::AcqRel);
        let sent = tokio::select! {
            result = tx.send(task) => result.is_ok(),
            _ = cancel.cancelled() => false,
        };
        if !sent {
            self.settle_unsent();
            return Err(PoolClosed);
        }
        Ok(())
    }

    fn settle_unsent(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Returns once all submitted tasks have completed.
    pub async fn wait(&self) {
        loop {
            if self.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Close the queue and join the workers once it drains.
    pub async fn stop(&self) {
        self.tx.lock().take();
        let handles: Vec<_> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }
}
