//! # interceptor
//!
//! System-wide keyboard and mouse interception, rewriting and injection on
//! top of the [Interception](https://github.com/oblitum/Interception) driver.
//!
//! ## Features
//!
//! - Observe every keyboard and mouse stroke before applications see it
//! - Rewrite strokes in place or suppress them entirely
//! - Inject synthetic keys, text, clicks, scrolls and cursor moves
//! - Per-device targeting: synthetic input goes to the last active device
//! - Cooperative shutdown that never loses physical input
//! - Channel adapters (std and, with the `tokio` feature, async)
//!
//! The native library is loaded at runtime, so binaries build and start on
//! machines without the driver; [`Input::load`] simply returns `false` there.
//!
//! ## Quick Start
//!
//! ### Rewriting Input
//!
//! ```no_run
//! use interceptor::{Config, Input, MouseEvent, MouseState};
//!
//! let input = Input::with_config(Config::capture_all());
//! // Swap the left and right mouse buttons
//! input.on_mouse(|event: &mut MouseEvent| {
//!     if event.state == MouseState::LEFT_DOWN {
//!         event.state = MouseState::RIGHT_DOWN;
//!     } else if event.state == MouseState::RIGHT_DOWN {
//!         event.state = MouseState::LEFT_DOWN;
//!     } else if event.state == MouseState::LEFT_UP {
//!         event.state = MouseState::RIGHT_UP;
//!     } else if event.state == MouseState::RIGHT_UP {
//!         event.state = MouseState::LEFT_UP;
//!     }
//! });
//! assert!(input.load(), "Interception driver not installed");
//! ```
//!
//! ### Blocking Keys
//!
//! ```no_run
//! use interceptor::{Config, Input, Key, KeyEvent};
//!
//! let input = Input::with_config(Config::capture_all());
//! input.on_key(|event: &mut KeyEvent| {
//!     if event.key == Key::Escape {
//!         event.handled = true; // never reaches applications
//!     }
//! });
//! input.load();
//! ```
//!
//! ### Sending Input
//!
//! ```no_run
//! use interceptor::{Input, Key};
//!
//! let input = Input::new();
//! input.try_load()?;
//! input.send_key(Key::CapsLock)?;
//! input.send_text("Hello!")?;
//! input.send_left_click()?;
//! # Ok::<(), interceptor::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Each loaded [`Input`] owns one driver context and one thread running the
//! interception loop. The loop waits for a stroke, hands it to the
//! subscribers, then forwards or drops it. Unload is cooperative: the loop
//! waits in bounded slices ([`Config::poll_interval`]) and checks a stop flag
//! between them. The driver itself sits behind the [`Driver`] trait, with
//! [`MockDriver`] available for tests.

pub mod channel;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod event;
pub mod hook;
pub mod keycode;
pub mod stroke;

mod intercept;
mod platform;
mod session;
mod simulate;
mod state;

// Re-exports
pub use config::Config;
pub use device::{DeviceClass, DeviceId, DeviceInfo};
pub use driver::mock::MockDriver;
pub use driver::{ContextHandle, Driver, InterceptionDriver};
pub use error::{Error, Result};
pub use event::{Button, KeyEvent, MouseAction, MouseEvent, ScrollDirection};
pub use hook::{FatalHandler, KeyHandler, MouseHandler, SubscriptionId};
pub use keycode::{Key, char_to_key};
pub use session::Input;
pub use stroke::{
    KeyState, KeyStroke, KeyboardFilter, MouseFilter, MouseFlags, MouseState, MouseStroke,
    RawStroke, Stroke,
};
