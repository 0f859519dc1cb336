//! Session configuration.

use crate::device::DeviceId;
use crate::stroke::{KeyboardFilter, MouseFilter};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings for an [`Input`](crate::Input) instance.
///
/// Filters and device defaults are read when a session loads, and
/// [`Input::set_config`](crate::Input::set_config) is rejected while one runs.
/// Delays can change at any time through the per-delay setters on
/// [`Input`](crate::Input).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Keyboard strokes the driver stops for inspection.
    pub keyboard_filter: KeyboardFilter,
    /// Mouse strokes the driver stops for inspection.
    pub mouse_filter: MouseFilter,
    /// Sleep after every synthetic key stroke. 20-40 ms makes typing visible;
    /// zero may make presses vanish.
    pub key_press_delay: Duration,
    /// Sleep between the down and up of a synthetic click.
    pub click_delay: Duration,
    /// Sleep after every synthetic scroll notch.
    pub scroll_delay: Duration,
    /// Keyboard targeted before any keyboard stroke was seen.
    pub default_keyboard: DeviceId,
    /// Mouse targeted before any mouse stroke was seen.
    pub default_mouse: DeviceId,
    /// Retarget synthetic strokes at the device that produced the last
    /// physical stroke of each class.
    pub track_devices: bool,
    /// Upper bound on how long the loop blocks in the driver before checking
    /// for unload.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keyboard_filter: KeyboardFilter::NONE,
            mouse_filter: MouseFilter::NONE,
            key_press_delay: Duration::from_millis(1),
            click_delay: Duration::from_millis(1),
            scroll_delay: Duration::from_millis(15),
            default_keyboard: DeviceId::keyboard(1),
            default_mouse: DeviceId::mouse(0),
            track_devices: true,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl Config {
    /// Trap every keyboard and mouse stroke.
    pub fn capture_all() -> Self {
        Self {
            keyboard_filter: KeyboardFilter::ALL,
            mouse_filter: MouseFilter::ALL,
            ..Self::default()
        }
    }

    /// Zero all synthetic delays.
    pub fn without_delays(mut self) -> Self {
        self.key_press_delay = Duration::ZERO;
        self.click_delay = Duration::ZERO;
        self.scroll_delay = Duration::ZERO;
        self
    }

    /// Poll interval in whole milliseconds, at least 1.
    pub(crate) fn poll_millis(&self) -> u32 {
        self.poll_interval.as_millis().clamp(1, u32::MAX as u128) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.keyboard_filter, KeyboardFilter::NONE);
        assert_eq!(config.mouse_filter, MouseFilter::NONE);
        assert_eq!(config.default_keyboard, DeviceId(2));
        assert_eq!(config.default_mouse, DeviceId(11));
        assert_eq!(config.scroll_delay, Duration::from_millis(15));
        assert!(config.track_devices);
    }

    #[test]
    fn test_poll_millis_is_never_zero() {
        let config = Config {
            poll_interval: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(config.poll_millis(), 1);
        assert_eq!(Config::default().poll_millis(), 50);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_partial_config() {
        let config: Config =
            serde_json::from_str(r#"{ "track_devices": false }"#).expect("valid config");
        assert!(!config.track_devices);
        assert_eq!(config.default_mouse, DeviceId(11));
    }
}
