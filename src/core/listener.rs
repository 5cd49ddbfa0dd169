//! # ListenerRecord: what to run, and where, for a matching notification.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::dispatch::TargetRef;
use crate::events::{Callback, Notification};

/// Callback plus optional dispatch target.
///
/// A record always has a callback; there is no way to build one without.
pub struct ListenerRecord {
    target: Option<TargetRef>,
    callback: Callback,
}

impl ListenerRecord {
    /// Creates a record that runs `callback` on `target`, or synchronously if `None`.
    pub fn new<F>(target: Option<TargetRef>, callback: F) -> Self
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        Self {
            target,
            callback: Arc::new(callback),
        }
    }

    /// Dispatch target of this record, if any.
    pub fn target(&self) -> Option<&TargetRef> {
        self.target.as_ref()
    }

    /// Runs the callback for `note`.
    ///
    /// - With a target: the callback and a clone of `note` are enqueued; never blocks.
    ///   A rejected job is dropped with a warning.
    /// - Without: the callback runs right here, on the posting thread.
    pub fn execute(&self, note: &Notification) {
        let Some(target) = &self.target else {
            (self.callback)(note);
            return;
        };

        let callback = Arc::clone(&self.callback);
        let owned = note.clone();
        if let Err(e) = target.dispatch(Box::new(move || callback(&owned))) {
            warn!(
                target_name = target.name(),
                name = %note.name,
                seq = note.seq,
                label = e.as_label(),
                "dropped notification: {e}"
            );
        }
    }
}

impl fmt::Debug for ListenerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("target", &self.target.as_ref().map(|t| t.name()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchTarget, Job, SerialQueue};
    use crate::error::DispatchError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::{self, ThreadId};

    /// Target that parks jobs until drained by the test.
    #[derive(Default)]
    struct Parked {
        jobs: Mutex<Vec<Job>>,
    }

    impl DispatchTarget for Parked {
        fn dispatch(&self, job: Job) -> Result<(), DispatchError> {
            self.jobs.lock().push(job);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "parked"
        }
    }

    struct Refusing;

    impl DispatchTarget for Refusing {
        fn dispatch(&self, _job: Job) -> Result<(), DispatchError> {
            Err(DispatchError::Closed { target: "refusing" })
        }
    }

    #[test]
    fn test_without_target_runs_on_calling_thread() {
        let seen: Arc<Mutex<Option<ThreadId>>> = Arc::default();
        let s = Arc::clone(&seen);
        let record = ListenerRecord::new(None, move |_| {
            *s.lock() = Some(thread::current().id());
        });

        record.execute(&Notification::new("x"));
        assert_eq!(*seen.lock(), Some(thread::current().id()));
    }

    #[test]
    fn test_with_target_defers_until_target_runs() {
        let count = Arc::new(AtomicUsize::new(0));
        let parked = Arc::new(Parked::default());
        let c = Arc::clone(&count);
        let record = ListenerRecord::new(Some(parked.clone()), move |note| {
            assert_eq!(&*note.name, "x");
            c.fetch_add(1, Ordering::SeqCst);
        });

        record.execute(&Notification::new("x"));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        for job in parked.jobs.lock().drain(..) {
            job();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejected_job_is_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let record = ListenerRecord::new(Some(Arc::new(Refusing)), move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        record.execute(&Notification::new("x"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_serial_queue_target() {
        let queue = SerialQueue::arc("listener", 8);
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let record = ListenerRecord::new(Some(queue.clone()), move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        record.execute(&Notification::new("a"));
        record.execute(&Notification::new("b"));
        queue.shutdown().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(record.target().map(|t| t.name()), Some("listener"));
    }
}
