//! Registry core: keys, listener records, the controller and its attachment glue.
//!
//! The public API from this module is [`NotificationController`], [`Attachments`]
//! and the [`AttachController`] extension trait; [`MatchKey`] and
//! [`ListenerRecord`] are exported for callers that build their own registries.
//!
//! Internal modules:
//! - [`key`]: (name?, sender?) keys with delivery vs. removal matching;
//! - [`listener`]: callback + optional dispatch target;
//! - [`controller`]: per-observer registry subscribed once to the bus;
//! - [`attach`]: identity-keyed lazy controllers for arbitrary objects.

mod attach;
mod controller;
mod key;
mod listener;

pub use attach::{AttachController, Attachments};
pub use controller::NotificationController;
pub use key::MatchKey;
pub use listener::ListenerRecord;
