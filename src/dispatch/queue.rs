//! # SerialQueue: bounded FIFO dispatch target
//!
//! [`SerialQueue`] runs jobs one at a time, in submission order, on a dedicated
//! tokio worker task.
//!
//! ## Rules
//! - **Non-blocking**: `dispatch()` uses `try_send` and returns immediately.
//! - **FIFO**: jobs run in the order they were accepted.
//! - **Overflow**: when the queue is full the job is rejected with
//!   [`DispatchError::Full`] and dropped.
//! - **Isolation**: a panicking job is caught and logged; the worker continues.
//!
//! ## Shutdown
//! [`SerialQueue::shutdown`] closes the queue (further jobs get
//! [`DispatchError::Closed`]) and waits until every accepted job has run.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error};

use super::target::{DispatchTarget, Job};
use crate::config::Config;
use crate::error::DispatchError;
use crate::events::panic_message;

/// Bounded FIFO queue drained by a single worker task.
pub struct SerialQueue {
    name: &'static str,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerialQueue {
    /// Creates a new queue and spawns its worker.
    ///
    /// The minimum capacity is 1 (clamped).
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    error!(
                        queue = name,
                        info = %panic_message(&*panic_err),
                        "dispatched job panicked"
                    );
                }
            }
            debug!(queue = name, "serial queue drained");
        });

        Self {
            name,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Creates a new queue bounded by `cfg.queue_capacity`.
    #[must_use]
    pub fn with_config(name: &'static str, cfg: &Config) -> Self {
        Self::new(name, cfg.queue_capacity_clamped())
    }

    /// Creates the queue and returns it as a shared handle.
    ///
    /// Prefer this when the queue is passed to
    /// [`NotificationController::add_observer`](crate::NotificationController::add_observer).
    #[must_use]
    pub fn arc(name: &'static str, capacity: usize) -> Arc<Self> {
        Arc::new(Self::new(name, capacity))
    }

    /// True once [`shutdown`](Self::shutdown) was called.
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Graceful shutdown: close the queue and await completion of accepted jobs.
    ///
    /// Idempotent; later calls return immediately.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            let _ = handle.await;
        }
    }
}

impl DispatchTarget for SerialQueue {
    fn dispatch(&self, job: Job) -> Result<(), DispatchError> {
        let sender = self.sender.lock();
        let Some(tx) = sender.as_ref() else {
            return Err(DispatchError::Closed { target: self.name });
        };

        tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::Full { target: self.name },
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed { target: self.name },
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialQueue")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
