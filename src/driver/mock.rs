//! Mock driver for unit and integration testing.
//!
//! Simulates the driver's behavior in process: strokes injected with
//! [`MockDriver::inject`] are either queued for the interception loop (when
//! the current filter traps them) or delivered straight through, the way the
//! real driver lets unfiltered input pass. Everything the engine sends is
//! recorded.

use super::{ContextHandle, Driver};
use crate::device::{DeviceClass, DeviceId, MAX_DEVICE, MAX_KEYBOARD};
use crate::error::{Error, Result};
use crate::stroke::{KeyStroke, KeyState, KeyboardFilter, MouseFilter, MouseStroke, RawStroke, Stroke};
use std::collections::{HashMap, VecDeque};
use std::ffi::c_void;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
enum Pending {
    Stroke(DeviceId, RawStroke),
    Failure(DeviceId),
}

impl Pending {
    fn device(&self) -> DeviceId {
        match self {
            Pending::Stroke(device, _) | Pending::Failure(device) => *device,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    available: bool,
    next_handle: usize,
    created: usize,
    destroyed: usize,
    keyboard_filter: KeyboardFilter,
    mouse_filter: MouseFilter,
    pending: VecDeque<Pending>,
    sent: Vec<(DeviceId, Stroke)>,
    passed_through: Vec<(DeviceId, Stroke)>,
    hardware_ids: HashMap<DeviceId, String>,
}

/// A scripted, in-process [`Driver`].
#[derive(Debug)]
pub struct MockDriver {
    state: Mutex<MockState>,
    signal: Condvar,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// A driver that is installed and running.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                available: true,
                next_handle: 1,
                ..Default::default()
            }),
            signal: Condvar::new(),
        }
    }

    /// A driver whose contexts cannot be created.
    pub fn unavailable() -> Self {
        let driver = Self::new();
        driver.set_available(false);
        driver
    }

    /// Toggle whether `create_context` succeeds.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Inject a physical stroke from `device`.
    ///
    /// Returns `true` if the active filter trapped it for the loop, `false`
    /// if it went straight through.
    pub fn inject(&self, device: DeviceId, stroke: Stroke) -> bool {
        let mut state = self.lock();
        let trapped = match &stroke {
            Stroke::Key(key) => state
                .keyboard_filter
                .matches(KeyState::from_bits_retain(key.state)),
            Stroke::Mouse(mouse) => state.mouse_filter.matches(mouse),
        };
        if trapped {
            state
                .pending
                .push_back(Pending::Stroke(device, RawStroke::encode(&stroke)));
            self.signal.notify_all();
        } else {
            state.passed_through.push((device, stroke));
        }
        trapped
    }

    /// Inject a keyboard stroke.
    pub fn inject_key(&self, device: DeviceId, stroke: KeyStroke) -> bool {
        self.inject(device, Stroke::Key(stroke))
    }

    /// Inject a mouse stroke.
    pub fn inject_mouse(&self, device: DeviceId, stroke: MouseStroke) -> bool {
        self.inject(device, Stroke::Mouse(stroke))
    }

    /// Make the next receive for `device` fail.
    pub fn inject_receive_failure(&self, device: DeviceId) {
        let mut state = self.lock();
        state.pending.push_back(Pending::Failure(device));
        self.signal.notify_all();
    }

    /// Register the hardware id reported for `device`.
    pub fn set_hardware_id(&self, device: DeviceId, hardware_id: &str) {
        self.lock().hardware_ids.insert(device, hardware_id.to_string());
    }

    /// Every stroke sent through the driver so far.
    pub fn sent(&self) -> Vec<(DeviceId, Stroke)> {
        self.lock().sent.clone()
    }

    /// Forget recorded sent strokes.
    pub fn clear_sent(&self) {
        self.lock().sent.clear();
    }

    /// Wait until at least `count` strokes were sent, or `timeout` passes.
    pub fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<(DeviceId, Stroke)> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.sent.len() < count {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            state = self
                .signal
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        state.sent.clone()
    }

    /// Strokes that bypassed the loop because no filter trapped them.
    pub fn passed_through(&self) -> Vec<(DeviceId, Stroke)> {
        self.lock().passed_through.clone()
    }

    /// Strokes still queued for the loop.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Filters currently installed.
    pub fn filters(&self) -> (KeyboardFilter, MouseFilter) {
        let state = self.lock();
        (state.keyboard_filter, state.mouse_filter)
    }

    /// Number of contexts created.
    pub fn contexts_created(&self) -> usize {
        self.lock().created
    }

    /// Number of contexts destroyed.
    pub fn contexts_destroyed(&self) -> usize {
        self.lock().destroyed
    }

    /// Contexts currently open.
    pub fn live_contexts(&self) -> usize {
        let state = self.lock();
        state.created - state.destroyed
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn class_of(device: DeviceId) -> Option<DeviceClass> {
        match device.raw() {
            1..=MAX_KEYBOARD => Some(DeviceClass::Keyboard),
            d if d > MAX_KEYBOARD && d <= MAX_DEVICE => Some(DeviceClass::Mouse),
            _ => None,
        }
    }
}

impl Driver for MockDriver {
    fn create_context(&self) -> Result<ContextHandle> {
        let mut state = self.lock();
        if !state.available {
            return Err(Error::DriverUnavailable("mock driver is not installed".into()));
        }
        let raw = state.next_handle;
        state.next_handle += 1;
        state.created += 1;
        ContextHandle::from_raw(raw as *mut c_void)
            .ok_or_else(|| Error::DriverUnavailable("null mock handle".into()))
    }

    fn destroy_context(&self, _context: ContextHandle) {
        let mut state = self.lock();
        state.destroyed += 1;
        self.signal.notify_all();
    }

    fn set_filter(&self, _context: ContextHandle, class: DeviceClass, filter: u16) {
        let mut state = self.lock();
        match class {
            DeviceClass::Keyboard => state.keyboard_filter = KeyboardFilter::from_bits_retain(filter),
            DeviceClass::Mouse => state.mouse_filter = MouseFilter::from_bits_retain(filter),
        }
    }

    fn wait(&self, _context: ContextHandle) -> DeviceId {
        let mut state = self.lock();
        loop {
            if let Some(front) = state.pending.front() {
                return front.device();
            }
            state = self
                .signal
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn wait_with_timeout(&self, _context: ContextHandle, millis: u32) -> DeviceId {
        let deadline = Instant::now() + Duration::from_millis(u64::from(millis));
        let mut state = self.lock();
        loop {
            if let Some(front) = state.pending.front() {
                return front.device();
            }
            let now = Instant::now();
            if now >= deadline {
                return DeviceId::NONE;
            }
            state = self
                .signal
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn receive(&self, _context: ContextHandle, device: DeviceId, strokes: &mut [RawStroke]) -> i32 {
        let mut state = self.lock();
        let matches = state
            .pending
            .front()
            .is_some_and(|pending| pending.device() == device);
        if !matches || strokes.is_empty() {
            return 0;
        }
        let received = match state.pending.pop_front() {
            Some(Pending::Stroke(_, raw)) => {
                strokes[0] = raw;
                1
            }
            _ => 0,
        };
        self.signal.notify_all();
        received
    }

    fn send(&self, _context: ContextHandle, device: DeviceId, strokes: &[RawStroke]) -> i32 {
        let Some(class) = Self::class_of(device) else {
            return 0;
        };
        let mut state = self.lock();
        for raw in strokes {
            state.sent.push((device, raw.decode(class)));
        }
        self.signal.notify_all();
        strokes.len() as i32
    }

    fn is_keyboard(&self, device: DeviceId) -> bool {
        Self::class_of(device) == Some(DeviceClass::Keyboard)
    }

    fn is_mouse(&self, device: DeviceId) -> bool {
        Self::class_of(device) == Some(DeviceClass::Mouse)
    }

    fn hardware_id(&self, _context: ContextHandle, device: DeviceId, buffer: &mut [u8]) -> usize {
        let state = self.lock();
        let Some(id) = state.hardware_ids.get(&device) else {
            return 0;
        };
        let mut written = 0;
        for unit in id.encode_utf16() {
            let bytes = unit.to_le_bytes();
            if written + bytes.len() > buffer.len() {
                break;
            }
            buffer[written..written + 2].copy_from_slice(&bytes);
            written += 2;
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: u16) -> Stroke {
        Stroke::Key(KeyStroke {
            code,
            state: 0,
            information: 0,
        })
    }

    #[test]
    fn test_unfiltered_strokes_pass_through() {
        let driver = MockDriver::new();
        assert!(!driver.inject(DeviceId(1), key(0x1E)));
        assert_eq!(driver.pending(), 0);
        assert_eq!(driver.passed_through(), vec![(DeviceId(1), key(0x1E))]);
    }

    #[test]
    fn test_wait_receive_send() {
        let driver = MockDriver::new();
        let context = driver.create_context().expect("available");
        driver.set_filter(context, DeviceClass::Keyboard, KeyboardFilter::ALL.bits());

        assert!(driver.inject(DeviceId(3), key(0x1E)));
        let device = driver.wait(context);
        assert_eq!(device, DeviceId(3));

        let mut buffer = [RawStroke::default()];
        assert_eq!(driver.receive(context, device, &mut buffer), 1);
        assert_eq!(driver.send(context, device, &buffer), 1);
        assert_eq!(driver.sent(), vec![(DeviceId(3), key(0x1E))]);
        assert_eq!(driver.wait_with_timeout(context, 1), DeviceId::NONE);
    }

    #[test]
    fn test_receive_failure() {
        let driver = MockDriver::new();
        let context = driver.create_context().expect("available");
        driver.inject_receive_failure(DeviceId(12));

        let device = driver.wait_with_timeout(context, 10);
        assert_eq!(device, DeviceId(12));
        let mut buffer = [RawStroke::default()];
        assert_eq!(driver.receive(context, device, &mut buffer), 0);
        assert_eq!(driver.pending(), 0);
    }

    #[test]
    fn test_unavailable() {
        let driver = MockDriver::unavailable();
        assert!(matches!(driver.create_context(), Err(Error::DriverUnavailable(_))));
        driver.set_available(true);
        assert!(driver.create_context().is_ok());
        assert_eq!(driver.contexts_created(), 1);
    }

    #[test]
    fn test_hardware_id_is_utf16() {
        let driver = MockDriver::new();
        let context = driver.create_context().expect("available");
        driver.set_hardware_id(DeviceId(1), "HID\\VID_1");

        let mut buffer = [0u8; 64];
        let written = driver.hardware_id(context, DeviceId(1), &mut buffer);
        assert_eq!(written, 18);
        assert_eq!(&buffer[..4], &[b'H', 0, b'I', 0]);
        assert_eq!(driver.hardware_id(context, DeviceId(2), &mut buffer), 0);
    }
}
