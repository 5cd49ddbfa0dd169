//! Error types used by the notification controller and dispatch targets.
//!
//! This module defines two error enums:
//!
//! - [`ObserverError`]: outcomes of registering/removing observers on a
//!   [`NotificationController`](crate::NotificationController).
//! - [`DispatchError`]: a [`DispatchTarget`](crate::DispatchTarget) refused a job.
//!
//! The public registration API reports failures as plain `bool`s; the `try_*`
//! variants return these errors for callers that want the reason. Both types
//! provide `as_label` for logs/metrics.

use thiserror::Error;

/// # Errors produced by observer registration.
///
/// None of these are fatal: every failing operation leaves the controller's
/// registry unchanged.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObserverError {
    /// An observer is already registered for this (name, sender) pair.
    #[error("already registered for name={name:?} (sender pair taken)")]
    AlreadyRegistered {
        /// Notification name of the rejected key (`None` = any name).
        name: Option<String>,
    },

    /// No observer is registered for this exact (name, sender) pair.
    #[error("not registered for name={name:?}")]
    NotRegistered {
        /// Notification name of the requested key (`None` = any name).
        name: Option<String>,
    },

    /// The observing object was released; the controller has been torn down.
    #[error("observer released")]
    ObserverReleased,
}

impl ObserverError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use notivisor::ObserverError;
    ///
    /// let err = ObserverError::AlreadyRegistered { name: Some("ping".into()) };
    /// assert_eq!(err.as_label(), "observer_already_registered");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ObserverError::AlreadyRegistered { .. } => "observer_already_registered",
            ObserverError::NotRegistered { .. } => "observer_not_registered",
            ObserverError::ObserverReleased => "observer_released",
        }
    }
}

/// # Errors produced by dispatch targets.
///
/// Returned when a job cannot be handed off; the job is dropped.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The target's queue is full.
    #[error("dispatch target '{target}' is full")]
    Full {
        /// Name of the target.
        target: &'static str,
    },

    /// The target was shut down (its worker is gone).
    #[error("dispatch target '{target}' is closed")]
    Closed {
        /// Name of the target.
        target: &'static str,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use notivisor::DispatchError;
    ///
    /// let err = DispatchError::Closed { target: "ui" };
    /// assert_eq!(err.as_label(), "dispatch_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Full { .. } => "dispatch_full",
            DispatchError::Closed { .. } => "dispatch_closed",
        }
    }

    /// Indicates whether the same job may succeed if dispatched again later.
    ///
    /// Returns `true` only for [`DispatchError::Full`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Full { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_error_labels() {
        assert_eq!(
            ObserverError::NotRegistered { name: None }.as_label(),
            "observer_not_registered"
        );
        assert_eq!(ObserverError::ObserverReleased.as_label(), "observer_released");
    }

    #[test]
    fn test_dispatch_error_retryable() {
        assert!(DispatchError::Full { target: "q" }.is_retryable());
        assert!(!DispatchError::Closed { target: "q" }.is_retryable());
    }

    #[test]
    fn test_display_mentions_target() {
        let err = DispatchError::Full { target: "main" };
        assert_eq!(err.to_string(), "dispatch target 'main' is full");
    }
}
