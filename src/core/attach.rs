//! # Attachments: lazily attach a controller to any `Arc`-managed object.
//!
//! [`Attachments`] maps object identity (the `Arc` data address) to a
//! [`NotificationController`] for that object. The first access creates and caches
//! the controller; later accesses return the same instance.
//!
//! ## Rules
//! - The table holds the owner **weakly**; attaching never extends its lifetime.
//! - Entries of released owners are pruned on every access (and by [`Attachments::prune`]);
//!   dropping the cached controller tears it down.
//! - Even before pruning, a released owner receives nothing: its controller tears
//!   itself down on the next notification. Until that post (or a prune) the
//!   controller stays subscribed and keeps its listeners alive; call
//!   [`Attachments::prune`] to release them eagerly.
//! - A held `Weak` pins the owner's allocation, so a new object can never inherit
//!   a stale entry.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use notivisor::{Attachments, Bus};
//!
//! struct Model;
//!
//! let attachments = Attachments::new(Bus::new(16));
//! let model = Arc::new(Model);
//!
//! let a = attachments.controller_for(&model);
//! let b = attachments.controller_for(&model);
//! assert!(Arc::ptr_eq(&a, &b));
//!
//! drop((a, b, model));
//! assert_eq!(attachments.prune(), 1);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::controller::NotificationController;
use crate::events::Bus;

/// Default attachment table shared by the whole process.
static GLOBAL_ATTACHMENTS: OnceLock<Attachments> = OnceLock::new();

/// One cached controller and the object it belongs to.
struct Attached {
    owner: Weak<dyn Any + Send + Sync>,
    controller: Arc<dyn Any + Send + Sync>,
}

impl Attached {
    #[inline]
    fn is_released(&self) -> bool {
        self.owner.strong_count() == 0
    }
}

/// Identity-keyed table of lazily created controllers.
pub struct Attachments {
    bus: Bus,
    entries: Mutex<HashMap<usize, Attached>>,
}

impl Attachments {
    /// Creates an empty table whose controllers listen on `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            bus,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the process-wide table (bound to [`Bus::global`]).
    pub fn global() -> &'static Attachments {
        GLOBAL_ATTACHMENTS.get_or_init(|| Attachments::new(Bus::global()))
    }

    /// Bus used for controllers created by this table.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the controller attached to `owner`, creating it on first use.
    pub fn controller_for<O>(&self, owner: &Arc<O>) -> Arc<NotificationController<O>>
    where
        O: Any + Send + Sync,
    {
        let id = identity_of(owner);
        let (controller, released) = {
            let mut entries = self.entries.lock();
            let released = take_released(&mut entries);

            let existing = entries
                .get(&id)
                .and_then(|e| Arc::clone(&e.controller).downcast::<NotificationController<O>>().ok());
            let controller = match existing {
                Some(controller) => controller,
                None => {
                    let controller = Arc::new(NotificationController::with_bus(owner, self.bus.clone()));
                    entries.insert(id, attached(owner, &controller));
                    debug!(owner = %format_args!("{id:#x}"), "attached notification controller");
                    controller
                }
            };
            (controller, released)
        };

        drop(released);
        controller
    }

    /// Returns the controller attached to `owner` without creating one.
    pub fn get<O>(&self, owner: &Arc<O>) -> Option<Arc<NotificationController<O>>>
    where
        O: Any + Send + Sync,
    {
        let entries = self.entries.lock();
        entries
            .get(&identity_of(owner))
            .filter(|e| !e.is_released())
            .and_then(|e| Arc::clone(&e.controller).downcast::<NotificationController<O>>().ok())
    }

    /// Attaches `controller` to `owner`, replacing (and releasing) any previous one.
    ///
    /// The controller should have been created for `owner`.
    pub fn set_controller<O>(
        &self,
        owner: &Arc<O>,
        controller: NotificationController<O>,
    ) -> Arc<NotificationController<O>>
    where
        O: Any + Send + Sync,
    {
        let controller = Arc::new(controller);
        let previous = {
            let mut entries = self.entries.lock();
            entries.insert(identity_of(owner), attached(owner, &controller))
        };

        drop(previous);
        controller
    }

    /// Detaches and releases the controller of `owner`.
    ///
    /// Returns `false` if none was attached.
    pub fn detach<O>(&self, owner: &Arc<O>) -> bool
    where
        O: Any + Send + Sync,
    {
        let removed = self.entries.lock().remove(&identity_of(owner));
        removed.is_some()
    }

    /// Releases every controller whose owner is gone; returns how many were dropped.
    pub fn prune(&self) -> usize {
        let released = take_released(&mut self.entries.lock());
        let n = released.len();
        if n > 0 {
            debug!(released = n, "pruned notification controllers");
        }
        n
    }

    /// Number of attached controllers (including not yet pruned ones).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if no controller is attached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachments")
            .field("bus", &self.bus)
            .field("entries", &self.len())
            .finish()
    }
}

#[inline]
fn identity_of<O>(owner: &Arc<O>) -> usize {
    Arc::as_ptr(owner) as *const () as usize
}

fn attached<O>(owner: &Arc<O>, controller: &Arc<NotificationController<O>>) -> Attached
where
    O: Any + Send + Sync,
{
    let owner: Weak<O> = Arc::downgrade(owner);
    let owner: Weak<dyn Any + Send + Sync> = owner;
    let controller: Arc<NotificationController<O>> = Arc::clone(controller);
    let controller: Arc<dyn Any + Send + Sync> = controller;
    Attached { owner, controller }
}

/// Removes released entries; the caller drops them after unlocking.
fn take_released(entries: &mut HashMap<usize, Attached>) -> Vec<Attached> {
    let dead: Vec<usize> = entries
        .iter()
        .filter(|(_, e)| e.is_released())
        .map(|(id, _)| *id)
        .collect();
    dead.into_iter().filter_map(|id| entries.remove(&id)).collect()
}

/// Extension giving every `Arc<T>` a lazily attached controller on the global table.
///
/// ```rust
/// use std::sync::Arc;
/// use notivisor::AttachController;
///
/// struct Player;
///
/// let player = Arc::new(Player);
/// let controller = player.notification_controller();
/// assert!(controller.add_observer(Some("player.did-load"), None, None, |_| {}));
/// assert!(Arc::ptr_eq(&controller, &player.notification_controller()));
/// ```
pub trait AttachController {
    /// The observing object type.
    type Observer: Any + Send + Sync;

    /// Returns the controller attached to this object, creating it on first use.
    fn notification_controller(&self) -> Arc<NotificationController<Self::Observer>>;
}

impl<T: Any + Send + Sync> AttachController for Arc<T> {
    type Observer = T;

    fn notification_controller(&self) -> Arc<NotificationController<T>> {
        Attachments::global().controller_for(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Notification;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        count: AtomicUsize,
    }

    fn table() -> (Bus, Attachments) {
        let bus = Bus::new(16);
        let attachments = Attachments::new(bus.clone());
        (bus, attachments)
    }

    #[test]
    fn test_lazy_controller_is_cached_per_identity() {
        let (_bus, attachments) = table();
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());

        let ca = attachments.controller_for(&a);
        assert!(Arc::ptr_eq(&ca, &attachments.controller_for(&a)));
        assert!(!Arc::ptr_eq(&ca, &attachments.controller_for(&b)));
        assert_eq!(attachments.len(), 2);
        assert!(attachments.bus().ptr_eq(ca.bus()));
    }

    #[test]
    fn test_entry_tracks_owner_liveness() {
        let owner = Arc::new(Counter::default());
        let controller = Arc::new(NotificationController::with_bus(&owner, Bus::new(4)));
        let entry = attached(&owner, &controller);
        assert!(!entry.is_released());

        drop(owner);
        assert!(entry.is_released());
    }

    #[test]
    fn test_attaching_does_not_retain_owner() {
        let (_bus, attachments) = table();
        let owner = Arc::new(Counter::default());
        let _ = attachments.controller_for(&owner);

        assert_eq!(Arc::strong_count(&owner), 1);
    }

    #[test]
    fn test_released_owner_gets_no_delivery_and_is_pruned() {
        let (bus, attachments) = table();
        let owner = Arc::new(Counter::default());
        let delivered = Arc::new(AtomicUsize::new(0));

        let d = Arc::clone(&delivered);
        let controller = attachments.controller_for(&owner);
        assert!(controller.add_observer(Some("x"), None, None, move |_| {
            d.fetch_add(1, Ordering::SeqCst);
        }));
        drop(controller);

        bus.post(Notification::new("x"));
        assert_eq!(delivered.load(Ordering::SeqCst), 1);

        drop(owner);
        bus.post(Notification::new("x"));
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert_eq!(bus.observer_count(), 0);

        assert_eq!(attachments.prune(), 1);
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_prune_releases_controller_subscription() {
        let (bus, attachments) = table();
        let owner = Arc::new(Counter::default());
        assert!(attachments
            .controller_for(&owner)
            .add_observer(None, None, None, |_| {}));
        assert_eq!(bus.observer_count(), 1);

        drop(owner);
        assert_eq!(attachments.prune(), 1);
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn test_access_prunes_released_entries() {
        let (_bus, attachments) = table();
        let gone = Arc::new(Counter::default());
        let _ = attachments.controller_for(&gone);
        drop(gone);

        let alive = Arc::new(Counter::default());
        let _ = attachments.controller_for(&alive);
        assert_eq!(attachments.len(), 1);
    }

    #[test]
    fn test_get_does_not_create() {
        let (_bus, attachments) = table();
        let owner = Arc::new(Counter::default());
        assert!(attachments.get(&owner).is_none());

        let created = attachments.controller_for(&owner);
        let fetched = attachments.get(&owner).expect("attached");
        assert!(Arc::ptr_eq(&created, &fetched));
    }

    #[test]
    fn test_set_controller_replaces_previous() {
        let (bus, attachments) = table();
        let owner = Arc::new(Counter::default());
        let old = attachments.controller_for(&owner);
        assert!(old.add_observer(Some("old"), None, None, |_| {}));
        drop(old);
        assert_eq!(bus.observer_count(), 1);

        let replacement = NotificationController::with_bus(&owner, bus.clone());
        let new = attachments.set_controller(&owner, replacement);
        assert_eq!(bus.observer_count(), 0);
        assert!(Arc::ptr_eq(&new, &attachments.controller_for(&owner)));
    }

    #[test]
    fn test_detach() {
        let (bus, attachments) = table();
        let owner = Arc::new(Counter::default());
        assert!(attachments
            .controller_for(&owner)
            .add_observer(None, None, None, |_| {}));

        assert!(attachments.detach(&owner));
        assert!(!attachments.detach(&owner));
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn test_extension_trait_uses_global_table() {
        let owner = Arc::new(Counter::default());
        let controller = owner.notification_controller();
        assert!(controller.add_observer_method(
            Some("attach.test.global"),
            None,
            |c: &Counter, _| {
                c.count.fetch_add(1, Ordering::SeqCst);
            }
        ));

        Bus::global().post(Notification::new("attach.test.global"));
        assert_eq!(owner.count.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&controller, &owner.notification_controller()));
        assert!(Attachments::global().detach(&owner));
    }
}
