//! Structured, mutable views of intercepted strokes.

use crate::device::DeviceId;
use crate::keycode::Key;
use crate::stroke::{KeyState, KeyStroke, MouseFlags, MouseState, MouseStroke, WHEEL_DELTA};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Left mouse button (Button 1).
    Left,
    /// Right mouse button (Button 2).
    Right,
    /// Middle mouse button (Button 3).
    Middle,
    /// Extra button 1 (typically back).
    Button4,
    /// Extra button 2 (typically forward).
    Button5,
}

impl Button {
    /// State bit for pressing this button.
    pub fn down_state(self) -> MouseState {
        match self {
            Button::Left => MouseState::LEFT_DOWN,
            Button::Right => MouseState::RIGHT_DOWN,
            Button::Middle => MouseState::MIDDLE_DOWN,
            Button::Button4 => MouseState::BUTTON_4_DOWN,
            Button::Button5 => MouseState::BUTTON_5_DOWN,
        }
    }

    /// State bit for releasing this button.
    pub fn up_state(self) -> MouseState {
        match self {
            Button::Left => MouseState::LEFT_UP,
            Button::Right => MouseState::RIGHT_UP,
            Button::Middle => MouseState::MIDDLE_UP,
            Button::Button4 => MouseState::BUTTON_4_UP,
            Button::Button5 => MouseState::BUTTON_5_UP,
        }
    }
}

/// Scroll direction for mouse wheel strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Scrolling up (away from user).
    Up,
    /// Scrolling down (toward user).
    Down,
    /// Scrolling left.
    Left,
    /// Scrolling right.
    Right,
}

/// A discrete mouse action the encoder can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Press(Button),
    Release(Button),
    Scroll(ScrollDirection),
}

impl MouseAction {
    /// Build the stroke for this action.
    ///
    /// Scrolls carry one standard wheel notch: `+120` up/right, `-120`
    /// down/left.
    pub fn to_stroke(self) -> MouseStroke {
        let (state, rolling) = match self {
            MouseAction::Press(button) => (button.down_state(), 0),
            MouseAction::Release(button) => (button.up_state(), 0),
            MouseAction::Scroll(ScrollDirection::Up) => (MouseState::WHEEL, WHEEL_DELTA),
            MouseAction::Scroll(ScrollDirection::Down) => (MouseState::WHEEL, -WHEEL_DELTA),
            MouseAction::Scroll(ScrollDirection::Right) => (MouseState::HWHEEL, WHEEL_DELTA),
            MouseAction::Scroll(ScrollDirection::Left) => (MouseState::HWHEEL, -WHEEL_DELTA),
        };
        MouseStroke {
            state: state.bits(),
            rolling,
            ..Default::default()
        }
    }
}

/// An intercepted keyboard stroke.
///
/// Subscribers may rewrite `key` and `state`, or set `handled` to drop the
/// stroke. Everything else is forwarded as it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key.
    pub key: Key,
    /// Press/release and prefix bits.
    pub state: KeyState,
    /// Set to `true` to suppress the stroke.
    pub handled: bool,
    decoded: Key,
    device: DeviceId,
    information: u32,
}

impl KeyEvent {
    /// Build the event for a stroke received from `device`.
    pub fn from_stroke(device: DeviceId, stroke: &KeyStroke) -> Self {
        let state = KeyState::from_bits_retain(stroke.state);
        let key = Key::from_stroke(stroke.code, state);
        Self {
            key,
            state,
            handled: false,
            decoded: key,
            device,
            information: stroke.information,
        }
    }

    /// Write the (possibly rewritten) fields back into `stroke`.
    ///
    /// A key changed to a known key gets the prefix of that key: E0 for
    /// extended keys, none otherwise. An unchanged or [`Key::Unknown`] key
    /// keeps the prefix bits of `state`.
    pub fn apply_to(&self, stroke: &mut KeyStroke) {
        let mut state = self.state;
        if self.key != self.decoded && !matches!(self.key, Key::Unknown(_)) {
            state.remove(KeyState::E1);
            state.set(KeyState::E0, self.key.is_extended());
        } else if self.key.is_extended() {
            state |= KeyState::E0;
        }
        stroke.code = self.key.scan_code();
        stroke.state = state.bits();
    }

    /// Device that produced the stroke.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Driver-specific extra information.
    pub fn information(&self) -> u32 {
        self.information
    }

    /// Whether this is a press.
    pub fn is_down(&self) -> bool {
        self.state.is_down()
    }

    /// Whether this is a release.
    pub fn is_up(&self) -> bool {
        self.state.is_up()
    }
}

/// An intercepted mouse stroke.
///
/// Subscribers may rewrite `x`, `y`, `state` and `rolling`, or set `handled`
/// to drop the stroke. Flags and information are forwarded untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseEvent {
    /// Delta or normalized absolute X, depending on [`MouseEvent::flags`].
    pub x: i32,
    /// Delta or normalized absolute Y, depending on [`MouseEvent::flags`].
    pub y: i32,
    /// Button and wheel bits.
    pub state: MouseState,
    /// Wheel delta.
    pub rolling: i16,
    /// Set to `true` to suppress the stroke.
    pub handled: bool,
    flags: MouseFlags,
    device: DeviceId,
    information: u32,
}

impl MouseEvent {
    /// Build the event for a stroke received from `device`.
    pub fn from_stroke(device: DeviceId, stroke: &MouseStroke) -> Self {
        Self {
            x: stroke.x,
            y: stroke.y,
            state: MouseState::from_bits_retain(stroke.state),
            rolling: stroke.rolling,
            handled: false,
            flags: MouseFlags::from_bits_retain(stroke.flags),
            device,
            information: stroke.information,
        }
    }

    /// Write the (possibly rewritten) fields back into `stroke`.
    pub fn apply_to(&self, stroke: &mut MouseStroke) {
        stroke.x = self.x;
        stroke.y = self.y;
        stroke.state = self.state.bits();
        stroke.rolling = self.rolling;
    }

    /// Device that produced the stroke.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Positioning flags of the stroke.
    pub fn flags(&self) -> MouseFlags {
        self.flags
    }

    /// Driver-specific extra information.
    pub fn information(&self) -> u32 {
        self.information
    }

    /// Whether `x`/`y` are absolute coordinates.
    pub fn is_absolute(&self) -> bool {
        self.flags.contains(MouseFlags::MOVE_ABSOLUTE)
    }

    /// Whether the stroke carries motion.
    pub fn is_move(&self) -> bool {
        self.x != 0 || self.y != 0
    }

    /// Direction of a wheel stroke, if any.
    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        if self.state.contains(MouseState::WHEEL) {
            Some(if self.rolling >= 0 {
                ScrollDirection::Up
            } else {
                ScrollDirection::Down
            })
        } else if self.state.contains(MouseState::HWHEEL) {
            Some(if self.rolling >= 0 {
                ScrollDirection::Right
            } else {
                ScrollDirection::Left
            })
        } else {
            None
        }
    }
}
