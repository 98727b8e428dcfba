//! Admission control: a bounded set of workers plus a FIFO overflow queue.
//!
//! All bookkeeping lives in one [`DispatchSlot`] behind one mutex. Admission,
//! release and the hand-off of a queued connection to a fresh worker each
//! happen inside a single critical section, so the pool never exceeds its
//! maximum and a queued connection is started exactly once.
//!
//! The overflow queue has no upper bound. Under sustained overload it grows
//! without limit.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;

/// Work run for each admitted connection.
pub trait ConnectionHandler: Send + Sync + 'static {
    type Conn: Send + 'static;

    fn handle(&self, conn: Self::Conn) -> impl Future<Output = ()> + Send;
}

/// Result of [`Dispatcher::submit`].
#[derive(Debug)]
pub enum Admission<C> {
    /// A worker was started for the connection.
    Started,
    /// All workers are busy; the connection waits at `position` (1-based).
    Queued { position: usize },
    /// The dispatcher is shut down. The connection is handed back.
    Refused(C),
}

struct DispatchSlot<C> {
    active: usize,
    max: usize,
    queue: VecDeque<C>,
    closed: bool,
}

struct Shared<H: ConnectionHandler> {
    handler: H,
    slot: Mutex<DispatchSlot<H::Conn>>,
    /// Mirrors `slot.active` for drain waiters.
    active_tx: watch::Sender<usize>,
    runtime: Handle,
}

pub struct Dispatcher<H: ConnectionHandler> {
    inner: Arc<Shared<H>>,
}

impl<H: ConnectionHandler> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Releases the worker's slot when the worker finishes, panics included.
struct WorkerGuard<H: ConnectionHandler> {
    dispatcher: Dispatcher<H>,
}

impl<H: ConnectionHandler> Drop for WorkerGuard<H> {
    fn drop(&mut self) {
        self.dispatcher.release();
    }
}

impl<H: ConnectionHandler> Dispatcher<H> {
    /// Creates a dispatcher running at most `max_workers` handlers at once.
    ///
    /// Must be called from within a Tokio runtime; workers are spawned onto it.
    pub fn new(handler: H, max_workers: usize) -> Self {
        let (active_tx, _) = watch::channel(0);

        Self {
            inner: Arc::new(Shared {
                handler,
                slot: Mutex::new(DispatchSlot {
                    active: 0,
                    max: max_workers.max(1),
                    queue: VecDeque::new(),
                    closed: false,
                }),
                active_tx,
                runtime: Handle::current(),
            }),
        }
    }

    /// Admits a connection: starts a worker if one is free, queues it
    /// otherwise. Never blocks.
    pub fn submit(&self, conn: H::Conn) -> Admission<H::Conn> {
        let mut slot = self.lock();

        if slot.closed {
            return Admission::Refused(conn);
        }

        if slot.active < slot.max {
            slot.active += 1;
            self.inner.active_tx.send_replace(slot.active);
            tracing::debug!(active = slot.active, max = slot.max, "Worker started");
            drop(slot);

            self.spawn_worker(conn);
            return Admission::Started;
        }

        slot.queue.push_back(conn);
        let position = slot.queue.len();
        tracing::info!(
            active = slot.active,
            queued = position,
            "Worker pool saturated, connection queued"
        );
        Admission::Queued { position }
    }

    /// Frees a worker slot and, in the same critical section, hands it to the
    /// oldest queued connection.
    fn release(&self) {
        let next = {
            let mut slot = self.lock();
            slot.active = slot.active.saturating_sub(1);

            let next = if slot.closed {
                None
            } else {
                slot.queue.pop_front()
            };
            if next.is_some() {
                slot.active += 1;
            }

            self.inner.active_tx.send_replace(slot.active);
            tracing::debug!(
                active = slot.active,
                queued = slot.queue.len(),
                dequeued = next.is_some(),
                "Worker released"
            );
            next
        };

        if let Some(conn) = next {
            self.spawn_worker(conn);
        }
    }

    fn spawn_worker(&self, conn: H::Conn) {
        let guard = WorkerGuard {
            dispatcher: self.clone(),
        };

        self.inner.runtime.spawn(async move {
            let guard = guard;
            guard.dispatcher.inner.handler.handle(conn).await;
        });
    }

    /// Stops admitting, abandons queued connections, then waits up to `grace`
    /// for running workers. Returns `true` if every worker finished in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let abandoned = {
            let mut slot = self.lock();
            slot.closed = true;
            std::mem::take(&mut slot.queue)
        };

        if !abandoned.is_empty() {
            tracing::warn!(abandoned = abandoned.len(), "Dropping queued connections");
        }
        drop(abandoned);

        let mut active = self.inner.active_tx.subscribe();
        let drained = tokio::time::timeout(grace, active.wait_for(|n| *n == 0))
            .await
            .is_ok_and(|r| r.is_ok());

        if drained {
            tracing::info!("All workers drained");
        } else {
            tracing::warn!(active = self.active_count(), "Drain timed out with workers still running");
        }
        drained
    }

    pub fn active_count(&self) -> usize {
        self.lock().active
    }

    pub fn queued_count(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn max_workers(&self) -> usize {
        self.lock().max
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// A poisoned lock still holds consistent counts: every mutation is a
    /// single step.
    fn lock(&self) -> MutexGuard<'_, DispatchSlot<H::Conn>> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
