//! Wire format of one driver stroke.
//!
//! The driver exchanges strokes as an untagged 20-byte buffer. Whether those
//! bytes hold a [`KeyStroke`] or a [`MouseStroke`] is decided by the class of
//! the device that produced them, never by anything stored in the buffer, so
//! [`RawStroke::decode`] takes a [`DeviceClass`] and there is no way to read a
//! half without naming one.

use crate::device::DeviceClass;
use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size of the stroke buffer (the size of the mouse half, the larger one).
pub const STROKE_SIZE: usize = 20;

/// Standard wheel delta for one notch.
pub const WHEEL_DELTA: i16 = 120;

bitflags! {
    /// State bits of a keyboard stroke.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct KeyState: u16 {
        /// Key pressed. Zero, so it is present in every state.
        const DOWN = 0x00;
        /// Key released.
        const UP = 0x01;
        /// Extended key prefix.
        const E0 = 0x02;
        /// Pause/Break prefix.
        const E1 = 0x04;
        const TERMSRV_SET_LED = 0x08;
        const TERMSRV_SHADOW = 0x10;
        const TERMSRV_VKPACKET = 0x20;
    }
}

impl KeyState {
    /// Whether this state describes a release.
    pub fn is_up(self) -> bool {
        self.contains(KeyState::UP)
    }

    /// Whether this state describes a press.
    pub fn is_down(self) -> bool {
        !self.is_up()
    }
}

bitflags! {
    /// Which keyboard strokes the driver stops for inspection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct KeyboardFilter: u16 {
        const NONE = 0x0000;
        const ALL = 0xFFFF;
        const KEY_DOWN = 0x01;
        const KEY_UP = 0x02;
        const KEY_E0 = 0x04;
        const KEY_E1 = 0x08;
        const KEY_TERMSRV_SET_LED = 0x10;
        const KEY_TERMSRV_SHADOW = 0x20;
        const KEY_TERMSRV_VKPACKET = 0x40;
    }
}

impl KeyboardFilter {
    /// Whether a stroke with `state` is trapped by this filter.
    pub fn matches(self, state: KeyState) -> bool {
        let direction = if state.is_up() {
            KeyboardFilter::KEY_UP
        } else {
            KeyboardFilter::KEY_DOWN
        };
        let prefixes = KeyboardFilter::from_bits_retain((state.bits() & !KeyState::UP.bits()) << 1);
        self.intersects(direction | prefixes)
    }
}

bitflags! {
    /// Button and wheel bits of a mouse stroke.
    ///
    /// Vertical scrolling in either direction is [`MouseState::WHEEL`]; the
    /// sign of the stroke's `rolling` tells up (positive) from down.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct MouseState: u16 {
        const LEFT_DOWN = 0x001;
        const LEFT_UP = 0x002;
        const RIGHT_DOWN = 0x004;
        const RIGHT_UP = 0x008;
        const MIDDLE_DOWN = 0x010;
        const MIDDLE_UP = 0x020;
        const BUTTON_4_DOWN = 0x040;
        const BUTTON_4_UP = 0x080;
        const BUTTON_5_DOWN = 0x100;
        const BUTTON_5_UP = 0x200;
        const WHEEL = 0x400;
        const HWHEEL = 0x800;
    }
}

bitflags! {
    /// Which mouse strokes the driver stops for inspection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct MouseFilter: u16 {
        const NONE = 0x0000;
        const ALL = 0xFFFF;
        const LEFT_DOWN = 0x001;
        const LEFT_UP = 0x002;
        const RIGHT_DOWN = 0x004;
        const RIGHT_UP = 0x008;
        const MIDDLE_DOWN = 0x010;
        const MIDDLE_UP = 0x020;
        const BUTTON_4_DOWN = 0x040;
        const BUTTON_4_UP = 0x080;
        const BUTTON_5_DOWN = 0x100;
        const BUTTON_5_UP = 0x200;
        const WHEEL = 0x400;
        const HWHEEL = 0x800;
        const MOVE = 0x1000;
    }
}

impl MouseFilter {
    /// Whether `stroke` is trapped by this filter.
    ///
    /// Button and wheel bits share values with [`MouseState`]; a stroke that
    /// carries no button bits, or carries motion, needs [`MouseFilter::MOVE`].
    pub fn matches(self, stroke: &MouseStroke) -> bool {
        let mut needed = MouseFilter::from_bits_retain(stroke.state);
        if stroke.state == 0 || stroke.x != 0 || stroke.y != 0 {
            needed |= MouseFilter::MOVE;
        }
        self.intersects(needed)
    }
}

bitflags! {
    /// Positioning flags of a mouse stroke.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct MouseFlags: u16 {
        /// `x`/`y` are deltas. Zero, so present in every value.
        const MOVE_RELATIVE = 0x000;
        /// `x`/`y` are normalized absolute coordinates (0..=65535).
        const MOVE_ABSOLUTE = 0x001;
        const VIRTUAL_DESKTOP = 0x002;
        const ATTRIBUTES_CHANGED = 0x004;
        const MOVE_NOCOALESCE = 0x008;
        const TERMSRV_SRC_SHADOW = 0x100;
    }
}

/// Keyboard half of a stroke.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyStroke {
    /// Set-1 scan code.
    pub code: u16,
    /// Raw [`KeyState`] bits.
    pub state: u16,
    pub information: u32,
}

/// Mouse half of a stroke.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseStroke {
    /// Raw [`MouseState`] bits.
    pub state: u16,
    /// Raw [`MouseFlags`] bits.
    pub flags: u16,
    /// Wheel delta.
    pub rolling: i16,
    pub x: i32,
    pub y: i32,
    pub information: u32,
}

/// A stroke whose class is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Key(KeyStroke),
    Mouse(MouseStroke),
}

impl Stroke {
    /// Class this stroke belongs to.
    pub fn class(&self) -> DeviceClass {
        match self {
            Stroke::Key(_) => DeviceClass::Keyboard,
            Stroke::Mouse(_) => DeviceClass::Mouse,
        }
    }
}

impl From<KeyStroke> for Stroke {
    fn from(stroke: KeyStroke) -> Self {
        Stroke::Key(stroke)
    }
}

impl From<MouseStroke> for Stroke {
    fn from(stroke: MouseStroke) -> Self {
        Stroke::Mouse(stroke)
    }
}

// Byte offsets inside the buffer, matching the C layout of both halves.
const KEY_CODE: usize = 0;
const KEY_STATE: usize = 2;
const KEY_INFORMATION: usize = 4;
const MOUSE_STATE: usize = 0;
const MOUSE_FLAGS: usize = 2;
const MOUSE_ROLLING: usize = 4;
const MOUSE_X: usize = 8;
const MOUSE_Y: usize = 12;
const MOUSE_INFORMATION: usize = 16;

/// Untagged stroke buffer exactly as the driver reads and writes it.
#[repr(C, align(4))]
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RawStroke([u8; STROKE_SIZE]);

impl RawStroke {
    /// Wrap bytes received from the driver.
    pub const fn from_bytes(bytes: [u8; STROKE_SIZE]) -> Self {
        RawStroke(bytes)
    }

    /// Raw bytes.
    pub const fn as_bytes(&self) -> &[u8; STROKE_SIZE] {
        &self.0
    }

    /// Interpret the buffer as the half belonging to `class`.
    pub fn decode(&self, class: DeviceClass) -> Stroke {
        match class {
            DeviceClass::Keyboard => Stroke::Key(KeyStroke {
                code: self.u16_at(KEY_CODE),
                state: self.u16_at(KEY_STATE),
                information: self.u32_at(KEY_INFORMATION),
            }),
            DeviceClass::Mouse => Stroke::Mouse(MouseStroke {
                state: self.u16_at(MOUSE_STATE),
                flags: self.u16_at(MOUSE_FLAGS),
                rolling: self.u16_at(MOUSE_ROLLING) as i16,
                x: self.u32_at(MOUSE_X) as i32,
                y: self.u32_at(MOUSE_Y) as i32,
                information: self.u32_at(MOUSE_INFORMATION),
            }),
        }
    }

    /// Encode a stroke into a zeroed buffer.
    pub fn encode(stroke: &Stroke) -> Self {
        let mut raw = RawStroke::default();
        match stroke {
            Stroke::Key(key) => {
                raw.put(KEY_CODE, &key.code.to_ne_bytes());
                raw.put(KEY_STATE, &key.state.to_ne_bytes());
                raw.put(KEY_INFORMATION, &key.information.to_ne_bytes());
            }
            Stroke::Mouse(mouse) => {
                raw.put(MOUSE_STATE, &mouse.state.to_ne_bytes());
                raw.put(MOUSE_FLAGS, &mouse.flags.to_ne_bytes());
                raw.put(MOUSE_ROLLING, &mouse.rolling.to_ne_bytes());
                raw.put(MOUSE_X, &mouse.x.to_ne_bytes());
                raw.put(MOUSE_Y, &mouse.y.to_ne_bytes());
                raw.put(MOUSE_INFORMATION, &mouse.information.to_ne_bytes());
            }
        }
        raw
    }

    fn u16_at(&self, offset: usize) -> u16 {
        u16::from_ne_bytes([self.0[offset], self.0[offset + 1]])
    }

    fn u32_at(&self, offset: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.0[offset..offset + 4]);
        u32::from_ne_bytes(bytes)
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        self.0[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

impl From<Stroke> for RawStroke {
    fn from(stroke: Stroke) -> Self {
        RawStroke::encode(&stroke)
    }
}

impl std::fmt::Debug for RawStroke {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawStroke({:02x?})", self.0)
    }
}
