//! # Notification bus (the "notification center").
//!
//! [`Bus`] delivers every posted [`Notification`] **synchronously, on the posting
//! thread**, to all registered observer callbacks, and additionally mirrors it into a
//! [`tokio::sync::broadcast`] tap for async consumers.
//!
//! ## Architecture
//! ```text
//! Posters (any thread):              Observers:
//!   Window ──┐                        ┌──► callback (name filter: None)  ── broadcast scope
//!   Model  ──┼──► Bus::post(note) ────┼──► callback (name filter: "x")
//!   Timer  ──┘                        └──► callback ...
//!                     │
//!                     └──► broadcast tap ──► Bus::subscribe() receivers (async)
//! ```
//!
//! ## Rules
//! - **Synchronous delivery**: `post()` returns after every matching callback ran.
//! - **No lock held during callbacks**: callbacks may add/remove observers or post.
//! - **Panic isolation**: a panicking callback is logged; the others still run.
//! - **Tap capacity**: slow async receivers get `RecvError::Lagged(n)` and skip
//!   the `n` oldest notifications. Synchronous observers are never lagged.
//! - **No persistence**: notifications posted with no observers are lost.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::error;

use super::notification::{Notification, SenderRef};
use crate::config::Config;

/// Default bus shared by the whole process.
static GLOBAL_BUS: OnceLock<Bus> = OnceLock::new();

/// Callback invoked for every delivered notification.
pub(crate) type Callback = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Token identifying one observer registration on a [`Bus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// One observer callback with its optional name filter.
struct Registration {
    id: ObserverId,
    name: Option<Arc<str>>,
    callback: Callback,
}

impl Registration {
    #[inline]
    fn accepts(&self, name: &str) -> bool {
        self.name.as_deref().is_none_or(|n| n == name)
    }
}

struct BusInner {
    observers: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<Notification>,
}

/// In-process notification bus.
///
/// ### Properties
/// - **Cloneable**: cheap to clone (`Arc`-backed); clones share observers.
/// - **Thread-safe**: post and (de)register from any thread.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Bus {
    /// Creates a new bus whose broadcast tap holds `capacity` notifications.
    ///
    /// The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Notification>(capacity.max(1));
        Self {
            inner: Arc::new(BusInner {
                observers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                tx,
            }),
        }
    }

    /// Creates a new bus from the global configuration.
    pub fn with_config(cfg: &Config) -> Self {
        Self::new(cfg.bus_capacity_clamped())
    }

    /// Returns the process-wide default bus (created on first use).
    pub fn global() -> Bus {
        GLOBAL_BUS
            .get_or_init(|| Bus::with_config(&Config::default()))
            .clone()
    }

    /// Registers `callback` for notifications named `name`, or for every
    /// notification when `name` is `None` (broadcast scope).
    pub fn add_observer<F>(&self, name: Option<&str>, callback: F) -> ObserverId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = ObserverId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.observers.write().push(Registration {
            id,
            name: name.map(Arc::from),
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes the registration identified by `id`.
    ///
    /// Returns `false` if it was already removed.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.write();
        match observers.iter().position(|r| r.id == id) {
            Some(idx) => {
                observers.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Posts a notification to all matching observers, then to the broadcast tap.
    ///
    /// Observers run on the calling thread, in registration order.
    pub fn post(&self, note: Notification) {
        let callbacks: Vec<Callback> = {
            let observers = self.inner.observers.read();
            observers
                .iter()
                .filter(|r| r.accepts(&note.name))
                .map(|r| Arc::clone(&r.callback))
                .collect()
        };

        for callback in callbacks {
            if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(|| callback(&note))) {
                error!(
                    name = %note.name,
                    seq = note.seq,
                    info = %panic_message(&*panic_err),
                    "bus observer panicked"
                );
            }
        }

        let _ = self.inner.tx.send(note);
    }

    /// Shorthand for `post(Notification::new(name).with_sender(..))`.
    pub fn post_named(&self, name: impl Into<Arc<str>>, sender: Option<SenderRef>) {
        let mut note = Notification::new(name);
        note.sender = sender;
        self.post(note);
    }

    /// Creates a receiver that will observe subsequently posted notifications.
    ///
    /// - Each call creates an **independent** receiver.
    /// - Slow receivers get `RecvError::Lagged(n)` and skip over missed items.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.tx.subscribe()
    }

    /// Number of registered observer callbacks.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.read().len()
    }

    /// True if both handles refer to the same bus.
    pub fn ptr_eq(&self, other: &Bus) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::with_config(&Config::default())
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("observers", &self.observer_count())
            .field("taps", &self.inner.tx.receiver_count())
            .finish()
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&Notification) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: &Notification| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_broadcast_scope_receives_everything() {
        let bus = Bus::new(8);
        let (count, cb) = counter();
        bus.add_observer(None, cb);

        bus.post(Notification::new("a"));
        bus.post(Notification::new("b"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_name_filter() {
        let bus = Bus::new(8);
        let (count, cb) = counter();
        bus.add_observer(Some("a"), cb);

        bus.post(Notification::new("a"));
        bus.post(Notification::new("b"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_observer_is_idempotent() {
        let bus = Bus::new(8);
        let (count, cb) = counter();
        let id = bus.add_observer(None, cb);

        assert!(bus.remove_observer(id));
        assert!(!bus.remove_observer(id));
        bus.post(Notification::new("a"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn test_panicking_observer_does_not_stop_others() {
        let bus = Bus::new(8);
        let (count, cb) = counter();
        bus.add_observer(None, |_| panic!("boom"));
        bus.add_observer(None, cb);

        bus.post(Notification::new("a"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_may_reenter_bus() {
        let bus = Bus::new(8);
        let (count, cb) = counter();
        let inner = bus.clone();
        let late = Arc::new(parking_lot::Mutex::new(Some(cb)));
        bus.add_observer(Some("register"), move |_| {
            if let Some(cb) = late.lock().take() {
                inner.add_observer(Some("late"), cb);
            }
        });

        bus.post(Notification::new("register"));
        bus.post(Notification::new("late"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_broadcast_tap_receives_posts() {
        let bus = Bus::new(4);
        let mut rx = bus.subscribe();

        bus.post(Notification::new("tap"));
        let note = rx.recv().await.expect("tap closed");
        assert_eq!(&*note.name, "tap");
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Bus::global().ptr_eq(&Bus::global()));
        assert!(!Bus::global().ptr_eq(&Bus::new(1)));
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*boxed), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*boxed), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(1u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
