//! Swap the left and right mouse buttons system-wide.
//!
//! Run with: cargo run --example interswap
//!
//! Requires the Interception driver. While this runs, a physical left click
//! arrives as a right click and vice versa. Press Escape (or Ctrl+C) to stop;
//! the Escape press itself is swallowed.

use interceptor::{Config, Input, Key, KeyEvent, MouseEvent, MouseState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::Duration;

fn swap(state: MouseState) -> MouseState {
    if state == MouseState::LEFT_DOWN {
        MouseState::RIGHT_DOWN
    } else if state == MouseState::LEFT_UP {
        MouseState::RIGHT_UP
    } else if state == MouseState::RIGHT_DOWN {
        MouseState::LEFT_DOWN
    } else if state == MouseState::RIGHT_UP {
        MouseState::LEFT_UP
    } else {
        state
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("interceptor button swap example");
    println!("===============================\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let input = Input::with_config(Config::capture_all());
    input.on_mouse(|event: &mut MouseEvent| {
        event.state = swap(event.state);
    });
    let stop = running.clone();
    input.on_key(move |event: &mut KeyEvent| {
        if event.key == Key::Escape {
            event.handled = true;
            stop.store(false, Ordering::SeqCst);
        }
    });

    if let Err(e) = input.try_load() {
        eprintln!("Cannot start: {}", e);
        eprintln!("Is the Interception driver installed?");
        return;
    }

    println!("Mouse buttons swapped. Press Escape or Ctrl+C to exit.\n");
    while running.load(Ordering::SeqCst) && input.is_loaded() {
        sleep(Duration::from_millis(50));
    }

    if let Some(e) = input.last_error() {
        eprintln!("Interception stopped: {}", e);
    }
    input.unload();
    println!("Buttons restored.");
}
