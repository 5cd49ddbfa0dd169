//! # MatchKey: (name?, sender?) filter with wildcard semantics.
//!
//! A key is used in two different ways, and the two must not be confused:
//!
//! | purpose            | `None` name            | `None` sender            |
//! |--------------------|------------------------|--------------------------|
//! | delivery matching  | matches **any** name   | matches **any** sender   |
//! | storage / removal  | matches only `None`    | matches only `None`      |
//!
//! Senders are held weakly and compared by identity. A key whose sender has been
//! released is **stale**: it never matches a delivery again and cannot be named
//! for removal any more, so the controller purges it on the next registration.
//! The weak handle pins the allocation, so no live object can share a stale key's
//! identity.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::events::{SenderRef, identity};

/// Weakly held sender plus its identity captured at registration.
#[derive(Clone)]
struct WeakSender {
    weak: Weak<dyn Any + Send + Sync>,
    id: usize,
}

impl WeakSender {
    fn new(sender: &SenderRef) -> Self {
        Self {
            weak: Arc::downgrade(sender),
            id: identity(sender),
        }
    }

    #[inline]
    fn is_alive(&self) -> bool {
        self.weak.strong_count() > 0
    }

    /// True if `sender` is the very object this key was built from.
    #[inline]
    fn is(&self, sender: &SenderRef) -> bool {
        self.id == identity(sender) && self.is_alive()
    }
}

/// Registration key: optional notification name and optional weak sender.
#[derive(Clone)]
pub struct MatchKey {
    name: Option<Arc<str>>,
    sender: Option<WeakSender>,
}

impl MatchKey {
    /// Builds a key. The sender is downgraded and does not outlive its owners.
    pub fn new(name: Option<&str>, sender: Option<&SenderRef>) -> Self {
        Self {
            name: name.map(Arc::from),
            sender: sender.map(WeakSender::new),
        }
    }

    /// Notification name of this key (`None` = any name).
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True if the key is restricted to one sender.
    pub fn has_sender(&self) -> bool {
        self.sender.is_some()
    }

    /// True if the key's sender was released; such a key never matches again.
    pub fn is_stale(&self) -> bool {
        self.sender.as_ref().is_some_and(|s| !s.is_alive())
    }

    /// Delivery-time matching against a concrete notification.
    ///
    /// `None` components of the key act as wildcards.
    pub fn matches_for_delivery(&self, name: &str, sender: Option<&SenderRef>) -> bool {
        let name_ok = self.name.as_deref().is_none_or(|n| n == name);
        let sender_ok = match &self.sender {
            None => true,
            Some(own) => sender.is_some_and(|s| own.is(s)),
        };
        name_ok && sender_ok
    }

    /// Removal-time matching: exact equality, `None` only matches `None`.
    pub fn matches_for_removal(&self, name: Option<&str>, sender: Option<&SenderRef>) -> bool {
        self.name.as_deref() == name && self.sender_id() == sender.map(identity)
    }

    #[inline]
    fn sender_id(&self) -> Option<usize> {
        self.sender.as_ref().map(|s| s.id)
    }
}

impl PartialEq for MatchKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.sender_id() == other.sender_id()
    }
}

impl Eq for MatchKey {}

impl Hash for MatchKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.sender_id().hash(state);
    }
}

impl fmt::Debug for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchKey")
            .field("name", &self.name)
            .field("sender", &self.sender_id().map(|id| format!("{id:#x}")))
            .field("stale", &self.is_stale())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn obj() -> SenderRef {
        Arc::new(0u64)
    }

    #[test]
    fn test_nil_name_matches_any_name_for_delivery() {
        let key = MatchKey::new(None, None);
        assert!(key.matches_for_delivery("a", None));
        assert!(key.matches_for_delivery("b", Some(&obj())));
    }

    #[test]
    fn test_name_must_match_for_delivery() {
        let key = MatchKey::new(Some("X"), None);
        let s = obj();
        assert!(key.matches_for_delivery("X", Some(&s)));
        assert!(!key.matches_for_delivery("Y", Some(&s)));
    }

    #[test]
    fn test_sender_is_compared_by_identity() {
        let s1 = obj();
        let s2 = obj();
        let key = MatchKey::new(None, Some(&s1));

        assert!(key.matches_for_delivery("Z", Some(&s1)));
        assert!(!key.matches_for_delivery("Z", Some(&s2)));
        assert!(!key.matches_for_delivery("Z", None));
    }

    #[test]
    fn test_removal_nil_is_not_a_wildcard() {
        let s = obj();
        let key = MatchKey::new(Some("X"), None);

        assert!(key.matches_for_removal(Some("X"), None));
        assert!(!key.matches_for_removal(Some("X"), Some(&s)));
        assert!(!key.matches_for_removal(None, None));

        let wildcard = MatchKey::new(None, None);
        assert!(wildcard.matches_for_removal(None, None));
        assert!(!wildcard.matches_for_removal(Some("X"), None));
    }

    #[test]
    fn test_equality_and_hash_follow_removal_semantics() {
        let s = obj();
        let mut set = HashSet::new();
        assert!(set.insert(MatchKey::new(Some("X"), Some(&s))));
        assert!(!set.insert(MatchKey::new(Some("X"), Some(&s))));
        assert!(set.insert(MatchKey::new(Some("X"), None)));
        assert!(set.insert(MatchKey::new(None, None)));
        assert!(!set.insert(MatchKey::new(None, None)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_key_does_not_keep_sender_alive() {
        let s = obj();
        let key = MatchKey::new(Some("X"), Some(&s));
        assert!(!key.is_stale());
        assert_eq!(Arc::strong_count(&s), 1);

        drop(s);
        assert!(key.is_stale());
        assert!(key.has_sender());
    }

    #[test]
    fn test_stale_key_never_delivers() {
        let s = obj();
        let key = MatchKey::new(None, Some(&s));
        drop(s);

        let other = obj();
        assert!(key.is_stale());
        assert!(!key.matches_for_delivery("any", Some(&other)));
    }
}
