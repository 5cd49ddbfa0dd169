//! # Dispatch targets for listener callbacks.
//!
//! A listener registered with a dispatch target does not run on the posting
//! thread; its callback is wrapped into a [`Job`] and handed to the target.
//!
//! ## Architecture
//! ```text
//! Bus::post(note) ──► controller ──► ListenerRecord::execute(note)
//!                                        │
//!                     target: None ──────┼──► callback(note)          (posting thread)
//!                     target: Some(q) ───┴──► q.dispatch(job) ──► [queue] ──► worker ──► callback(note)
//! ```
//!
//! ## Built-in targets
//! - [`SerialQueue`]: bounded FIFO queue drained by one tokio worker task.

mod queue;
mod target;

pub use queue::SerialQueue;
pub use target::{DispatchTarget, Job, TargetRef};
