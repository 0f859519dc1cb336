//! Most-recent device tracking.
//!
//! Synthetic strokes need a target device. The loop thread records the last
//! keyboard and mouse that produced a stroke; the encoder reads them from the
//! controlling thread. The loop is the only writer.

use crate::device::{DeviceClass, DeviceId};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Target devices for synthetic strokes.
#[derive(Debug)]
pub struct DeviceRegistry {
    keyboard: AtomicI32,
    mouse: AtomicI32,
    tracking: AtomicBool,
}

impl DeviceRegistry {
    /// Start from explicit defaults.
    pub fn new(keyboard: DeviceId, mouse: DeviceId, tracking: bool) -> Self {
        Self {
            keyboard: AtomicI32::new(keyboard.raw()),
            mouse: AtomicI32::new(mouse.raw()),
            tracking: AtomicBool::new(tracking),
        }
    }

    /// Record that `device` just produced a stroke. No-op when tracking is off.
    #[inline]
    pub fn observe(&self, class: DeviceClass, device: DeviceId) {
        if !self.tracking.load(Ordering::Relaxed) {
            return;
        }
        self.slot(class).store(device.raw(), Ordering::Release);
    }

    /// Current target for `class`.
    #[inline]
    pub fn current(&self, class: DeviceClass) -> DeviceId {
        DeviceId(self.slot(class).load(Ordering::Acquire))
    }

    /// Reset both targets, e.g. after the configuration changed.
    pub fn reset(&self, keyboard: DeviceId, mouse: DeviceId, tracking: bool) {
        self.keyboard.store(keyboard.raw(), Ordering::Release);
        self.mouse.store(mouse.raw(), Ordering::Release);
        self.tracking.store(tracking, Ordering::Relaxed);
    }

    fn slot(&self, class: DeviceClass) -> &AtomicI32 {
        match class {
            DeviceClass::Keyboard => &self.keyboard,
            DeviceClass::Mouse => &self.mouse,
        }
    }
}
