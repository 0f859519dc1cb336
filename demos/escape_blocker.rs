//! Block the Escape key and log every other key through a channel.
//!
//! Run with: cargo run --example escape_blocker
//!
//! IMPORTANT: Escape stops working system-wide while this runs. Press Ctrl+C
//! to exit.

use interceptor::{Config, Input, Key, KeyEvent, KeyboardFilter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

static BLOCKED_COUNT: AtomicU32 = AtomicU32::new(0);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("interceptor escape blocker example");
    println!("==================================\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
        println!("\nStopping...");
    })
    .expect("Error setting Ctrl-C handler");

    let config = Config {
        keyboard_filter: KeyboardFilter::ALL,
        ..Config::default()
    };
    let input = Input::with_config(config);

    input.on_key(|event: &mut KeyEvent| {
        if event.key == Key::Escape {
            event.handled = true;
            if event.is_down() {
                BLOCKED_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }
    });
    let (_subscription, rx) = input.key_channel(256);

    if !input.load() {
        eprintln!("Interception driver is not available.");
        return;
    }

    println!("Escape is blocked. Type anything; press Ctrl+C to exit.\n");
    while running.load(Ordering::SeqCst) {
        if let Ok(event) = rx.recv_timeout(Duration::from_millis(100)) {
            let action = if event.handled { "BLOCKED" } else { "passed" };
            println!(
                "{:>7} {:?} {} (device {})",
                action,
                event.key,
                if event.is_down() { "down" } else { "up" },
                event.device()
            );
        }
    }

    input.unload();
    println!(
        "Blocked {} Escape presses.",
        BLOCKED_COUNT.load(Ordering::SeqCst)
    );
}
