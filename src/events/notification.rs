//! # Notifications posted through the bus.
//!
//! A [`Notification`] carries a name, an optional sender and an optional payload
//! (`user_info`). Senders are arbitrary `Arc`-managed objects compared by
//! **identity** (data pointer), never by value.
//!
//! ## Ordering guarantees
//! Each notification has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the posting order when notifications are
//! delivered through different dispatch queues.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use notivisor::{Notification, SenderRef};
//!
//! let window: SenderRef = Arc::new("main-window");
//! let note = Notification::new("did-resize")
//!     .with_sender(window.clone())
//!     .with_user_info((800u32, 600u32));
//!
//! assert_eq!(&*note.name, "did-resize");
//! assert!(note.is_from(&window));
//! assert_eq!(note.user_info::<(u32, u32)>(), Some(&(800, 600)));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for notification ordering.
static NOTIFICATION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Shared handle to any object that can post notifications.
pub type SenderRef = Arc<dyn Any + Send + Sync>;

/// Identity of a sender: the address of its shared allocation.
#[inline]
pub(crate) fn identity(sender: &SenderRef) -> usize {
    Arc::as_ptr(sender) as *const () as usize
}

/// Named notification with optional sender and payload.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `sender` / `user_info` are set by the poster when relevant
#[derive(Clone)]
pub struct Notification {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notification name.
    pub name: Arc<str>,
    /// Object that posted the notification, if any.
    pub sender: Option<SenderRef>,
    /// Arbitrary payload attached by the poster.
    pub user_info: Option<Arc<dyn Any + Send + Sync>>,
}

impl Notification {
    /// Creates a new notification with current timestamp and next sequence number.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            seq: NOTIFICATION_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            name: name.into(),
            sender: None,
            user_info: None,
        }
    }

    /// Attaches the posting object.
    #[inline]
    pub fn with_sender(mut self, sender: SenderRef) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Attaches a payload.
    #[inline]
    pub fn with_user_info<T: Any + Send + Sync>(mut self, info: T) -> Self {
        self.user_info = Some(Arc::new(info));
        self
    }

    /// Returns the payload if it was attached with type `T`.
    #[inline]
    pub fn user_info<T: Any>(&self) -> Option<&T> {
        self.user_info.as_deref()?.downcast_ref::<T>()
    }

    /// True if `sender` is the very object that posted this notification.
    #[inline]
    pub fn is_from(&self, sender: &SenderRef) -> bool {
        self.sender_id() == Some(identity(sender))
    }

    /// Identity of the sender, if any.
    #[inline]
    pub fn sender_id(&self) -> Option<usize> {
        self.sender.as_ref().map(identity)
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("seq", &self.seq)
            .field("name", &self.name)
            .field("sender", &self.sender_id().map(|id| format!("{id:#x}")))
            .field("user_info", &self.user_info.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Notification::new("a");
        let b = Notification::new("b");
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_sender_identity_not_value() {
        let a: SenderRef = Arc::new(7u8);
        let b: SenderRef = Arc::new(7u8);
        let note = Notification::new("x").with_sender(a.clone());

        assert!(note.is_from(&a));
        assert!(!note.is_from(&b));
    }

    #[test]
    fn test_typed_sender_coerces_to_same_identity() {
        let typed = Arc::new(String::from("owner"));
        let erased: SenderRef = typed.clone();
        let note = Notification::new("x").with_sender(typed);

        assert!(note.is_from(&erased));
    }

    #[test]
    fn test_user_info_wrong_type_is_none() {
        let note = Notification::new("x").with_user_info(42u64);
        assert_eq!(note.user_info::<u64>(), Some(&42));
        assert!(note.user_info::<u32>().is_none());
    }
}
