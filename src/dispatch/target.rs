//! # Dispatch target trait
//!
//! `DispatchTarget` is the extension point for running listener callbacks
//! somewhere other than the posting thread. A target accepts zero-argument jobs
//! and runs them asynchronously, in FIFO order per target instance.
//!
//! ## Contract
//! - `dispatch` must **not** block: hand the job off and return.
//! - Jobs handed to the same target run in submission order.
//! - A target that cannot accept a job returns a [`DispatchError`]; the job is dropped.
//!
//! ## Example (skeleton)
//! ```rust
//! use notivisor::{DispatchError, DispatchTarget, Job};
//!
//! struct Inline;
//!
//! impl DispatchTarget for Inline {
//!     fn dispatch(&self, job: Job) -> Result<(), DispatchError> {
//!         job();
//!         Ok(())
//!     }
//!     fn name(&self) -> &'static str { "inline" }
//! }
//! ```

use std::sync::Arc;

use crate::error::DispatchError;

/// Unit of work handed to a dispatch target.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to a dispatch target.
pub type TargetRef = Arc<dyn DispatchTarget>;

/// Contract for task-queue-like dispatch targets.
pub trait DispatchTarget: Send + Sync + 'static {
    /// Enqueues `job` for asynchronous execution.
    fn dispatch(&self, job: Job) -> Result<(), DispatchError>;

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
