//! # Attached Controller Example
//!
//! Uses [`AttachController`] to give an object a lazily created controller without
//! storing it anywhere, and shows that releasing the object stops delivery.
//!
//! ## Run
//! ```bash
//! cargo run --example attached_controller
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use notivisor::{AttachController, Attachments, Bus, Notification};

struct Player {
    loads: AtomicU32,
}

fn main() {
    let bus = Bus::global();
    let player = Arc::new(Player {
        loads: AtomicU32::new(0),
    });

    player
        .notification_controller()
        .add_observer_method(Some("media.did-load"), None, |p: &Player, note| {
            let n = p.loads.fetch_add(1, Ordering::Relaxed) + 1;
            println!("[player] load #{n} seq={}", note.seq);
        });

    bus.post(Notification::new("media.did-load"));
    bus.post(Notification::new("media.did-load"));

    drop(player);
    bus.post(Notification::new("media.did-load"));

    println!(
        "pruned {} controller(s); bus observers left: {}",
        Attachments::global().prune(),
        bus.observer_count()
    );
}
