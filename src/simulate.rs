//! Synthetic input: keys, text, clicks, scrolls and moves.
//!
//! Synthetic strokes go straight to the driver on behalf of the most recently
//! active keyboard or mouse (see [`Input::current_keyboard`]); they never pass
//! through the interception loop. Every sender needs a loaded session.

use crate::device::DeviceId;
use crate::driver::{Context, Driver};
use crate::error::{Error, Result};
use crate::event::{Button, MouseAction, ScrollDirection};
use crate::keycode::{Key, char_to_key};
use crate::session::Input;
use crate::stroke::{KeyState, KeyStroke, MouseFlags, MouseStroke, RawStroke, Stroke};
use std::thread;
use std::time::Duration;

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

fn send_raw<D: Driver>(context: &Context<D>, device: DeviceId, stroke: &Stroke) -> Result<()> {
    if context.send(device, &[RawStroke::encode(stroke)]) <= 0 {
        return Err(Error::SendFailed(device));
    }
    log::trace!("sent {:?} to device {}", stroke, device);
    Ok(())
}

impl<D: Driver> Input<D> {
    /// Send one stroke to `device` exactly as given.
    pub fn send_stroke(&self, device: DeviceId, stroke: impl Into<Stroke>) -> Result<()> {
        if !device.is_valid() {
            return Err(Error::InvalidDevice(device));
        }
        let context = self.live_context()?;
        send_raw(&context, device, &stroke.into())
    }

    /// Send a single key stroke with an explicit state.
    ///
    /// [`KeyState::E0`] is added for extended keys. Sleeps for the key press
    /// delay afterwards.
    pub fn send_key_state(&self, key: Key, state: KeyState) -> Result<()> {
        let context = self.live_context()?;
        let mut state = state;
        if key.is_extended() {
            state |= KeyState::E0;
        }
        let stroke = Stroke::Key(KeyStroke {
            code: key.scan_code(),
            state: state.bits(),
            information: 0,
        });
        send_raw(&context, self.current_keyboard(), &stroke)?;
        pause(self.read_config().key_press_delay);
        Ok(())
    }

    /// Press and release `key`.
    pub fn send_key(&self, key: Key) -> Result<()> {
        self.send_key_state(key, KeyState::DOWN)?;
        self.send_key_state(key, KeyState::UP)
    }

    /// Press and release each key in order.
    pub fn send_keys(&self, keys: &[Key]) -> Result<()> {
        for key in keys {
            self.send_key(*key)?;
        }
        Ok(())
    }

    /// Type `text` on a US layout.
    ///
    /// Uppercase letters and shifted symbols are wrapped in a left Shift
    /// press. Fails with [`Error::UnsupportedCharacter`] before sending
    /// anything if some character has no key.
    ///
    /// ```no_run
    /// # let input = interceptor::Input::new();
    /// input.send_text("Hello, world!\n")?;
    /// # Ok::<(), interceptor::Error>(())
    /// ```
    pub fn send_text(&self, text: &str) -> Result<()> {
        let keys = text
            .chars()
            .map(|c| char_to_key(c).ok_or(Error::UnsupportedCharacter(c)))
            .collect::<Result<Vec<_>>>()?;
        self.live_context()?;

        for (key, shift) in keys {
            if shift {
                self.send_key_state(Key::ShiftLeft, KeyState::DOWN)?;
                let pressed = self.send_key(key);
                let released = self.send_key_state(Key::ShiftLeft, KeyState::UP);
                pressed.and(released)?;
            } else {
                self.send_key(key)?;
            }
        }
        Ok(())
    }

    /// Send a button press, release or wheel notch to the current mouse.
    pub fn send_mouse_event(&self, action: MouseAction) -> Result<()> {
        let context = self.live_context()?;
        send_raw(&context, self.current_mouse(), &Stroke::Mouse(action.to_stroke()))
    }

    /// Press and release `button`, pausing for the click delay in between.
    pub fn send_click(&self, button: Button) -> Result<()> {
        self.send_mouse_event(MouseAction::Press(button))?;
        pause(self.read_config().click_delay);
        self.send_mouse_event(MouseAction::Release(button))
    }

    pub fn send_left_click(&self) -> Result<()> {
        self.send_click(Button::Left)
    }

    pub fn send_right_click(&self) -> Result<()> {
        self.send_click(Button::Right)
    }

    pub fn send_middle_click(&self) -> Result<()> {
        self.send_click(Button::Middle)
    }

    /// Scroll one notch, then sleep for the scroll delay.
    pub fn scroll_mouse(&self, direction: ScrollDirection) -> Result<()> {
        self.send_mouse_event(MouseAction::Scroll(direction))?;
        pause(self.read_config().scroll_delay);
        Ok(())
    }

    /// Move the cursor by a relative offset in mickeys.
    pub fn move_mouse_by(&self, dx: i32, dy: i32) -> Result<()> {
        self.send_move(MouseFlags::MOVE_RELATIVE, dx, dy)
    }

    /// Move the cursor to an absolute position.
    ///
    /// Coordinates are normalized: `0..=65535` spans the primary screen on
    /// each axis. They are not pixels.
    pub fn move_mouse_to(&self, x: i32, y: i32) -> Result<()> {
        self.send_move(MouseFlags::MOVE_ABSOLUTE, x, y)
    }

    fn send_move(&self, flags: MouseFlags, x: i32, y: i32) -> Result<()> {
        let context = self.live_context()?;
        let stroke = Stroke::Mouse(MouseStroke {
            flags: flags.bits(),
            x,
            y,
            ..Default::default()
        });
        send_raw(&context, self.current_mouse(), &stroke)
    }
}
