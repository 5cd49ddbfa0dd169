//! # notivisor
//!
//! **Notivisor** makes observing an in-process notification bus safer.
//!
//! It wraps a [`Bus`] (a notification center) with a per-observer
//! [`NotificationController`] that:
//! - deduplicates registrations by (notification name, sender) pair,
//! - supports wildcard registrations (`None` name / `None` sender),
//! - runs callbacks synchronously or on a [`DispatchTarget`] such as [`SerialQueue`],
//! - unregisters itself when its observer is released or the controller is dropped.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   poster #1  │   │   poster #2  │   │   poster #3  │
//!     │ (any thread) │   │ (any thread) │   │ (any thread) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Bus (notification center)                                        │
//! │  - observer callbacks (broadcast scope or name filter), sync      │
//! │  - broadcast tap for async consumers (LogWriter, ...)             │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//!  │ Controller A  │  │ Controller B  │  │ Controller C  │   one bus registration each
//!  │ (Weak obs. A) │  │ (Weak obs. B) │  │ (Weak obs. C) │
//!  └──────┬────────┘  └──────┬────────┘  └──────┬────────┘
//!         │ MatchKey::matches_for_delivery(name, sender)
//!         ▼
//!   ListenerRecord::execute(note)
//!         ├─ target: None    ─► callback(note) on the posting thread
//!         └─ target: Some(q) ─► q.dispatch(job) ─► worker ─► callback(note)
//! ```
//!
//! ### Lifecycle
//! ```text
//! NotificationController::with_bus(&observer, bus)      state: Idle
//!   └─► add_observer(..) == true (first)               state: Active (bus registration)
//!         ├─► add_observer(same pair)  ─► false
//!         ├─► remove_observer(pair)    ─► true / false (exact match only)
//!         └─► teardown on:
//!               - controller dropped
//!               - observer released (detected on next notification or add)
//!               - explicit teardown()                   state: Idle
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                              |
//! |-------------------|-----------------------------------------------------------------|-------------------------------------------------|
//! | **Bus**           | Post notifications, register raw observers, async tap.          | [`Bus`], [`Notification`], [`ObserverId`]      |
//! | **Registry**      | Deduplicated, wildcard-aware, self-cleaning observer registry.  | [`NotificationController`], [`MatchKey`]       |
//! | **Dispatch**      | Run callbacks off the posting thread, FIFO per queue.           | [`DispatchTarget`], [`SerialQueue`]             |
//! | **Attachment**    | Lazily attach a controller to any `Arc`-managed object.         | [`Attachments`], [`AttachController`]           |
//! | **Errors**        | Typed reasons behind `false` returns and dropped jobs.          | [`ObserverError`], [`DispatchError`]            |
//! | **Configuration** | Centralize capacities.                                          | [`Config`]                                      |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a bus tap that logs via `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use notivisor::{Bus, Notification, NotificationController, SenderRef};
//!
//! struct Inspector;
//!
//! let bus = Bus::new(64);
//! let inspector = Arc::new(Inspector);
//! let controller = NotificationController::with_bus(&inspector, bus.clone());
//!
//! let document: SenderRef = Arc::new("doc-1");
//!
//! // Any notification from `document`, delivered on the posting thread.
//! assert!(controller.add_observer(None, Some(&document), None, |note| {
//!     println!("document posted {}", note.name);
//! }));
//! // Same pair again: rejected.
//! assert!(!controller.add_observer(None, Some(&document), None, |_| {}));
//!
//! bus.post(Notification::new("did-save").with_sender(document.clone()));
//!
//! // `None` name removes only the `None`-name registration.
//! assert!(!controller.remove_observer(Some("did-save"), Some(&document)));
//! assert!(controller.remove_observer(None, Some(&document)));
//! ```
mod config;
mod core;
mod dispatch;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{AttachController, Attachments, ListenerRecord, MatchKey, NotificationController};
pub use dispatch::{DispatchTarget, Job, SerialQueue, TargetRef};
pub use error::{DispatchError, ObserverError};
pub use events::{Bus, Notification, ObserverId, SenderRef};

// Optional: expose a simple built-in logger (tap consumer).
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
