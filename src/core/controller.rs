//! # NotificationController: deduplicated, self-cleaning observer registry.
//!
//! A controller belongs to one **observer** (held weakly) and keeps a registry of
//! `MatchKey → ListenerRecord`. It registers itself on the [`Bus`] once, in
//! broadcast scope, and does its own filtering so that `None` name / `None`
//! sender registrations work as wildcards.
//!
//! ## Architecture
//! ```text
//! add_observer(name?, sender?, target?, cb)
//!     ├─► MatchKey::new(name, sender)
//!     ├─► duplicate? ──► false (registry unchanged)
//!     ├─► insert ListenerRecord
//!     └─► Idle? ──► Bus::add_observer(None, handle) ──► Active(id)
//!
//! Bus::post(note) ──► handle(note)
//!     ├─► observer released? ──► teardown()
//!     └─► for (key, record) where key.matches_for_delivery(note) ──► record.execute(note)
//!
//! teardown() ── Drop / observer found released on post or add / explicit
//!     ├─► Bus::remove_observer(id)   (Active → Idle)
//!     └─► registry cleared
//! ```
//!
//! ## Rules
//! - At most one listener per distinct key; duplicates are **rejected**, not replaced.
//! - Removal uses exact key equality: `None` only removes a `None` registration.
//! - Removing the last listener keeps the bus subscription; only teardown drops it.
//! - No lock is held while callbacks run; callbacks may add/remove listeners.
//! - The bus only ever holds a `Weak` to the controller, and the controller only a
//!   `Weak` to its observer.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use notivisor::{Bus, Notification, NotificationController};
//!
//! struct Counter {
//!     count: AtomicUsize,
//! }
//!
//! let bus = Bus::new(16);
//! let counter = Arc::new(Counter { count: AtomicUsize::new(0) });
//! let controller = NotificationController::with_bus(&counter, bus.clone());
//!
//! assert!(controller.add_observer_method(Some("tick"), None, |c: &Counter, _note| {
//!     c.count.fetch_add(1, Ordering::Relaxed);
//! }));
//! assert!(!controller.add_observer(Some("tick"), None, None, |_| {}));
//!
//! bus.post(Notification::new("tick"));
//! assert_eq!(counter.count.load(Ordering::Relaxed), 1);
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, trace};

use super::key::MatchKey;
use super::listener::ListenerRecord;
use crate::dispatch::TargetRef;
use crate::error::ObserverError;
use crate::events::{Bus, Notification, ObserverId, SenderRef, panic_message};

/// Bus subscription state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Not registered on the bus.
    Idle,
    /// Registered on the bus in broadcast scope.
    Active(ObserverId),
}

struct Inner<O: ?Sized + Send + Sync + 'static> {
    bus: Bus,
    observer: Weak<O>,
    listeners: RwLock<HashMap<MatchKey, Arc<ListenerRecord>>>,
    state: Mutex<State>,
}

impl<O: ?Sized + Send + Sync + 'static> Inner<O> {
    #[inline]
    fn observer_alive(&self) -> bool {
        self.observer.strong_count() > 0
    }

    fn insert(self: &Arc<Self>, key: MatchKey, record: ListenerRecord) -> Result<(), ObserverError> {
        if !self.observer_alive() {
            self.teardown();
            return Err(ObserverError::ObserverReleased);
        }

        let (outcome, purged) = {
            let mut listeners = self.listeners.write();
            let stale: Vec<MatchKey> = listeners.keys().filter(|k| k.is_stale()).cloned().collect();
            let purged: Vec<_> = stale.iter().filter_map(|k| listeners.remove(k)).collect();

            let outcome = match listeners.entry(key) {
                Entry::Occupied(e) => Err((e.key().name().map(str::to_owned), record)),
                Entry::Vacant(e) => {
                    e.insert(Arc::new(record));
                    Ok(())
                }
            };
            (outcome, purged)
        };

        // Purged and rejected records are dropped outside the lock.
        drop(purged);
        if let Err((name, rejected)) = outcome {
            drop(rejected);
            debug!(?name, "observer already registered");
            return Err(ObserverError::AlreadyRegistered { name });
        }

        self.activate();
        Ok(())
    }

    fn remove(&self, name: Option<&str>, sender: Option<&SenderRef>) -> Result<(), ObserverError> {
        let removed = {
            let mut listeners = self.listeners.write();
            let found = listeners
                .keys()
                .find(|k| k.matches_for_removal(name, sender))
                .cloned();
            found.and_then(|k| listeners.remove(&k))
        };

        match removed {
            Some(_) => Ok(()),
            None => Err(ObserverError::NotRegistered {
                name: name.map(str::to_owned),
            }),
        }
    }

    /// Idle → Active: registers once on the bus (idempotent).
    fn activate(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if *state != State::Idle {
            return;
        }

        let me: Weak<Self> = Arc::downgrade(self);
        let id = self.bus.add_observer(None, move |note| {
            if let Some(inner) = me.upgrade() {
                inner.handle(note);
            }
        });
        *state = State::Active(id);
        debug!(?id, "controller subscribed to bus");
    }

    /// Delivers one bus notification to every matching listener.
    fn handle(&self, note: &Notification) {
        if !self.observer_alive() {
            debug!(name = %note.name, "observer released; tearing down controller");
            self.teardown();
            return;
        }

        let matched: Vec<Arc<ListenerRecord>> = {
            let listeners = self.listeners.read();
            listeners
                .iter()
                .filter(|(k, _)| k.matches_for_delivery(&note.name, note.sender.as_ref()))
                .map(|(_, r)| Arc::clone(r))
                .collect()
        };

        for record in matched {
            trace!(name = %note.name, seq = note.seq, "delivering notification");
            if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(|| record.execute(note))) {
                error!(
                    name = %note.name,
                    seq = note.seq,
                    info = %panic_message(&*panic_err),
                    "listener panicked"
                );
            }
        }
    }

    /// Unsubscribes from the bus and releases every listener.
    fn teardown(&self) {
        let prev = mem::replace(&mut *self.state.lock(), State::Idle);
        if let State::Active(id) = prev {
            self.bus.remove_observer(id);
            debug!(?id, "controller unsubscribed from bus");
        }

        let released = mem::take(&mut *self.listeners.write());
        drop(released);
    }
}

/// Observer registry bound to one observer and one bus.
///
/// Not `Clone`: the controller is meant to live next to (or inside) its observer.
/// Dropping it unsubscribes from the bus.
///
/// Teardown is immediate only when the observer owns the controller as a field
/// (built with [`from_weak`](Self::from_weak) inside [`Arc::new_cyclic`]): dropping
/// the observer drops the controller. A controller held elsewhere (standalone or in
/// [`Attachments`](crate::Attachments)) notices a released observer lazily, on the
/// next post or registration. Until then it stays subscribed and its listeners,
/// with everything their callbacks capture, stay reachable from the bus. Call
/// [`teardown`](Self::teardown) or [`Attachments::prune`](crate::Attachments::prune)
/// to release them eagerly.
pub struct NotificationController<O: ?Sized + Send + Sync + 'static> {
    inner: Arc<Inner<O>>,
}

impl<O: ?Sized + Send + Sync + 'static> NotificationController<O> {
    /// Creates a controller for `observer` on the process-wide [`Bus::global`].
    pub fn new(observer: &Arc<O>) -> Self {
        Self::with_bus(observer, Bus::global())
    }

    /// Creates a controller for `observer` on an explicit bus.
    pub fn with_bus(observer: &Arc<O>, bus: Bus) -> Self {
        Self::from_weak(Arc::downgrade(observer), bus)
    }

    /// Creates a controller from a weak observer handle.
    ///
    /// Lets an observer own its controller as a field via [`Arc::new_cyclic`].
    pub fn from_weak(observer: Weak<O>, bus: Bus) -> Self {
        Self {
            inner: Arc::new(Inner {
                bus,
                observer,
                listeners: RwLock::new(HashMap::new()),
                state: Mutex::new(State::Idle),
            }),
        }
    }

    /// Bus this controller listens on.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// The observer, if it is still alive.
    pub fn observer(&self) -> Option<Arc<O>> {
        self.inner.observer.upgrade()
    }

    /// Registers `callback` for notifications matching (`name`, `sender`).
    ///
    /// - `name: None` accepts any name, `sender: None` accepts any sender.
    /// - `target: None` runs the callback synchronously on the posting thread.
    ///
    /// Returns `false` if this exact (name, sender) pair is already registered or
    /// the observer is gone.
    pub fn add_observer<F>(
        &self,
        name: Option<&str>,
        sender: Option<&SenderRef>,
        target: Option<TargetRef>,
        callback: F,
    ) -> bool
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.try_add_observer(name, sender, target, callback).is_ok()
    }

    /// Like [`add_observer`](Self::add_observer), reporting why a registration failed.
    pub fn try_add_observer<F>(
        &self,
        name: Option<&str>,
        sender: Option<&SenderRef>,
        target: Option<TargetRef>,
        callback: F,
    ) -> Result<(), ObserverError>
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.inner.insert(
            MatchKey::new(name, sender),
            ListenerRecord::new(target, callback),
        )
    }

    /// Registers a method-style handler invoked as `handler(&observer, &note)`.
    ///
    /// The observer is captured weakly; the handler runs synchronously and only
    /// while the observer is alive.
    pub fn add_observer_method<F>(
        &self,
        name: Option<&str>,
        sender: Option<&SenderRef>,
        handler: F,
    ) -> bool
    where
        F: Fn(&O, &Notification) + Send + Sync + 'static,
    {
        let observer = self.inner.observer.clone();
        self.add_observer(name, sender, None, move |note| {
            if let Some(obs) = observer.upgrade() {
                handler(&*obs, note);
            }
        })
    }

    /// Removes the listener registered for exactly (`name`, `sender`).
    ///
    /// Returns `false` if there is none. `None` only matches a `None` registration.
    pub fn remove_observer(&self, name: Option<&str>, sender: Option<&SenderRef>) -> bool {
        self.try_remove_observer(name, sender).is_ok()
    }

    /// Shorthand for `remove_observer(name, None)`.
    pub fn remove_observer_named(&self, name: Option<&str>) -> bool {
        self.remove_observer(name, None)
    }

    /// Like [`remove_observer`](Self::remove_observer), reporting a miss as an error.
    pub fn try_remove_observer(
        &self,
        name: Option<&str>,
        sender: Option<&SenderRef>,
    ) -> Result<(), ObserverError> {
        self.inner.remove(name, sender)
    }

    /// True if a listener is registered for exactly (`name`, `sender`).
    pub fn contains(&self, name: Option<&str>, sender: Option<&SenderRef>) -> bool {
        self.inner
            .listeners
            .read()
            .keys()
            .any(|k| k.matches_for_removal(name, sender))
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// True if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.listeners.read().is_empty()
    }

    /// True while the controller holds a bus subscription.
    pub fn is_active(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Active(_))
    }

    /// Unsubscribes from the bus and drops every listener.
    ///
    /// Runs automatically on drop and when the observer is found released. The
    /// controller stays usable: a later registration subscribes again.
    pub fn teardown(&self) {
        self.inner.teardown();
    }
}

impl<O: ?Sized + Send + Sync + 'static> Drop for NotificationController<O> {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl<O: ?Sized + Send + Sync + 'static> fmt::Debug for NotificationController<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationController")
            .field("state", &*self.inner.state.lock())
            .field("listeners", &self.len())
            .field("observer_alive", &self.inner.observer_alive())
            .finish()
    }
}
