//! # Basic Observer Example
//!
//! Registers block- and method-style listeners on a bus and shows:
//! - wildcard matching (`None` name / `None` sender)
//! - duplicate rejection
//! - exact-match removal
//! - automatic teardown once the observer is dropped
//!
//! ## Run
//! ```bash
//! cargo run --example basic_observer
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use notivisor::{Bus, Notification, NotificationController, SenderRef};

struct Inspector {
    saves: AtomicU32,
}

impl Inspector {
    fn on_save(&self, note: &Notification) {
        let n = self.saves.fetch_add(1, Ordering::Relaxed) + 1;
        println!("[inspector] save #{n} (seq={})", note.seq);
    }
}

fn main() {
    let bus = Bus::new(64);
    let inspector = Arc::new(Inspector {
        saves: AtomicU32::new(0),
    });
    let controller = NotificationController::with_bus(&inspector, bus.clone());

    let doc_a: SenderRef = Arc::new("doc-a");
    let doc_b: SenderRef = Arc::new("doc-b");

    // "did-save" from any document, dispatched to a method on the observer.
    assert!(controller.add_observer_method(Some("did-save"), None, Inspector::on_save));
    // Any notification from doc-a.
    assert!(controller.add_observer(None, Some(&doc_a), None, |note| {
        println!("[doc-a] {}", note.name);
    }));
    // Same pair twice: rejected.
    let dup = controller.add_observer(Some("did-save"), None, None, |_| {});
    println!("duplicate registration accepted: {dup}");

    bus.post(Notification::new("did-save").with_sender(doc_a.clone()));
    bus.post(Notification::new("did-save").with_sender(doc_b.clone()));
    bus.post(Notification::new("did-close").with_sender(doc_a.clone()));

    // `None` only removes a `None` registration.
    println!(
        "remove (did-save, doc-a): {}",
        controller.remove_observer(Some("did-save"), Some(&doc_a))
    );
    println!(
        "remove (did-save, None):  {}",
        controller.remove_observer(Some("did-save"), None)
    );

    drop(inspector);
    bus.post(Notification::new("did-close").with_sender(doc_a));
    println!(
        "after observer dropped: active={} listeners={} bus observers={}",
        controller.is_active(),
        controller.len(),
        bus.observer_count()
    );
}
