//! # Queued Delivery Example
//!
//! Delivers notifications on a [`SerialQueue`] instead of the posting thread,
//! while a [`LogWriter`] logs everything posted on the bus.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example queued_delivery
//! ```

use std::sync::Arc;
use std::thread;

use notivisor::{Bus, Config, LogWriter, Notification, NotificationController, SerialQueue};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct Renderer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config::default();
    let bus = Bus::with_config(&cfg);
    let token = CancellationToken::new();
    let logger = LogWriter::new(bus.clone()).spawn(token.clone());

    let renderer = Arc::new(Renderer);
    let controller = NotificationController::with_bus(&renderer, bus.clone());
    let ui = Arc::new(SerialQueue::with_config("ui", &cfg));

    controller.add_observer(Some("frame"), None, Some(ui.clone()), |note| {
        let size = note.user_info::<(u32, u32)>().copied().unwrap_or_default();
        println!(
            "[ui {:?}] frame seq={} size={size:?}",
            thread::current().id(),
            note.seq
        );
    });

    // Post from plain OS threads; callbacks still run in order on the queue.
    let posters: Vec<_> = (0..3u32)
        .map(|i| {
            let bus = bus.clone();
            thread::spawn(move || {
                bus.post(Notification::new("frame").with_user_info((640 + i, 480 + i)));
            })
        })
        .collect();
    for p in posters {
        let _ = p.join();
    }

    ui.shutdown().await;
    token.cancel();
    let logged = logger.await.unwrap_or_default();
    println!("logged {logged} notifications");
}
