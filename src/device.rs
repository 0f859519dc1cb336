//! Device identifiers as assigned by the driver.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of keyboard slots the driver exposes.
pub const MAX_KEYBOARD: i32 = 10;
/// Number of mouse slots the driver exposes.
pub const MAX_MOUSE: i32 = 10;
/// Highest valid device id.
pub const MAX_DEVICE: i32 = MAX_KEYBOARD + MAX_MOUSE;

/// Driver-assigned id of a physical input device.
///
/// Keyboards occupy `1..=10`, mice `11..=20`. Id `0` is what the wait call
/// returns on timeout and never names a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceId(pub i32);

impl DeviceId {
    /// The "no device" id returned by a timed-out wait.
    pub const NONE: DeviceId = DeviceId(0);

    /// Id of the keyboard in slot `index` (0-based).
    pub const fn keyboard(index: i32) -> Self {
        DeviceId(index + 1)
    }

    /// Id of the mouse in slot `index` (0-based).
    pub const fn mouse(index: i32) -> Self {
        DeviceId(MAX_KEYBOARD + index + 1)
    }

    /// Raw integer passed across the FFI boundary.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Whether the id is inside the driver's device range.
    pub const fn is_valid(self) -> bool {
        self.0 >= 1 && self.0 <= MAX_DEVICE
    }

    /// Every id the driver may assign, keyboards first.
    pub fn all() -> impl Iterator<Item = DeviceId> {
        (1..=MAX_DEVICE).map(DeviceId)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device class used to pick the half of a stroke and the filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceClass {
    /// A keyboard.
    Keyboard,
    /// A mouse.
    Mouse,
}

/// Description of an attached device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceInfo {
    /// Driver id.
    pub id: DeviceId,
    /// Keyboard or mouse.
    pub class: DeviceClass,
    /// Hardware id string reported by the driver.
    pub hardware_id: String,
}
