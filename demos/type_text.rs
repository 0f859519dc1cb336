//! Synthetic input example.
//!
//! Run with: cargo run --example type_text
//!
//! WARNING: This will actually type text, click and move your mouse!

use interceptor::{Input, Key, KeyState, ScrollDirection};
use std::thread::sleep;
use std::time::Duration;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("interceptor synthetic input example");
    println!("===================================\n");

    let input = Input::new();
    if let Err(e) = input.try_load() {
        eprintln!("Cannot start: {}", e);
        return;
    }

    match input.devices() {
        Ok(devices) => {
            for device in devices {
                println!("{:>2} {:?}: {}", device.id, device.class, device.hardware_id);
            }
        }
        Err(e) => eprintln!("Cannot list devices: {}", e),
    }

    // Make typing visible.
    input.set_key_press_delay(Duration::from_millis(30));

    println!("\nFocus a text field. Starting in 3 seconds... (Press Ctrl+C to cancel)\n");
    sleep(Duration::from_secs(3));

    println!("1. Typing text...");
    if let Err(e) = input.send_text("Hello from interceptor!\n") {
        eprintln!("   Error: {}", e);
    }

    println!("2. Selecting the line with Shift+Home...");
    let result = input
        .send_key_state(Key::ShiftLeft, KeyState::DOWN)
        .and_then(|()| input.send_key(Key::Home))
        .and_then(|()| input.send_key_state(Key::ShiftLeft, KeyState::UP));
    if let Err(e) = result {
        eprintln!("   Error: {}", e);
    }

    println!("3. Moving the mouse...");
    for _ in 0..20 {
        if let Err(e) = input.move_mouse_by(5, 0) {
            eprintln!("   Error: {}", e);
            break;
        }
        sleep(Duration::from_millis(10));
    }

    println!("4. Scrolling down three notches...");
    for _ in 0..3 {
        if let Err(e) = input.scroll_mouse(ScrollDirection::Down) {
            eprintln!("   Error: {}", e);
        }
    }

    println!("5. Left clicking...");
    if let Err(e) = input.send_left_click() {
        eprintln!("   Error: {}", e);
    }

    input.unload();
    println!("\nDone!");
}
