//! Notifications: data model and the bus they travel through.
//!
//! ## Contents
//! - [`Notification`], [`SenderRef`]: notification payload and sender identity
//! - [`Bus`], [`ObserverId`]: synchronous notification center with a broadcast tap
//!
//! ## Quick reference
//! - **Posters**: any code holding a [`Bus`] handle, on any thread.
//! - **Consumers**: [`NotificationController`](crate::NotificationController)
//!   (one broadcast-scope registration per controller) and async tap receivers
//!   such as `LogWriter`.

mod bus;
mod notification;

pub use bus::{Bus, ObserverId};
pub use notification::{Notification, SenderRef};

pub(crate) use bus::{Callback, panic_message};
pub(crate) use notification::identity;
