//! # Async consumers of the bus broadcast tap.
//!
//! Synchronous observers register directly on the [`Bus`](crate::Bus) (usually via a
//! [`NotificationController`](crate::NotificationController)). Consumers in this
//! module instead drain [`Bus::subscribe`](crate::Bus::subscribe) on a tokio task,
//! so they never slow down the posting thread.
//!
//! ```text
//! Bus::post(note) ──► sync observers (posting thread)
//!        └──────────► broadcast tap ──► LogWriter task ──► tracing
//! ```

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
