//! The driver boundary.
//!
//! [`Driver`] is the narrow surface the engine consumes: create/destroy a
//! context, set a per-class filter, wait, receive, send, classify a device and
//! read its hardware id. [`InterceptionDriver`] binds it to the native
//! library; [`mock::MockDriver`] is an in-process stand-in for tests.

use crate::device::{DeviceClass, DeviceId};
use crate::error::Result;
use crate::stroke::RawStroke;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

mod ffi;
pub mod mock;

pub use ffi::InterceptionDriver;

/// Opaque handle to a driver context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(NonNull<c_void>);

// SAFETY: the handle is an opaque token owned by the driver. The driver
// serializes access internally; the engine never dereferences it.
unsafe impl Send for ContextHandle {}
unsafe impl Sync for ContextHandle {}

impl ContextHandle {
    /// Wrap a raw handle; `None` for null.
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(ContextHandle)
    }

    /// Raw pointer for the FFI call.
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Primitive operations of an input-filtering driver.
///
/// Every method taking a [`ContextHandle`] requires a handle returned by
/// [`Driver::create_context`] on the same driver and not yet destroyed. The
/// engine upholds this by reference counting handles internally.
pub trait Driver: Send + Sync + 'static {
    /// Open a context. Fails with [`Error::DriverUnavailable`](crate::Error).
    fn create_context(&self) -> Result<ContextHandle>;

    /// Close a context.
    fn destroy_context(&self, context: ContextHandle);

    /// Set the filter mask for every device of `class`.
    fn set_filter(&self, context: ContextHandle, class: DeviceClass, filter: u16);

    /// Block until some device has a pending stroke.
    fn wait(&self, context: ContextHandle) -> DeviceId;

    /// Like [`Driver::wait`], returning [`DeviceId::NONE`] after `millis`.
    fn wait_with_timeout(&self, context: ContextHandle, millis: u32) -> DeviceId;

    /// Receive up to `strokes.len()` strokes. Non-positive means failure.
    fn receive(&self, context: ContextHandle, device: DeviceId, strokes: &mut [RawStroke]) -> i32;

    /// Send strokes on behalf of `device`. Returns how many were accepted.
    fn send(&self, context: ContextHandle, device: DeviceId, strokes: &[RawStroke]) -> i32;

    /// Whether `device` is a keyboard.
    fn is_keyboard(&self, device: DeviceId) -> bool;

    /// Whether `device` is a mouse.
    fn is_mouse(&self, device: DeviceId) -> bool;

    /// Copy the hardware id of `device` into `buffer`; returns bytes written.
    fn hardware_id(&self, context: ContextHandle, device: DeviceId, buffer: &mut [u8]) -> usize;

    /// Classify `device`, `None` when it is neither a keyboard nor a mouse.
    fn classify(&self, device: DeviceId) -> Option<DeviceClass> {
        if self.is_keyboard(device) {
            Some(DeviceClass::Keyboard)
        } else if self.is_mouse(device) {
            Some(DeviceClass::Mouse)
        } else {
            None
        }
    }
}

/// A live context. Destroyed when the last reference goes away, which is
/// after the last driver call made through it has returned.
pub(crate) struct Context<D: Driver> {
    driver: Arc<D>,
    handle: ContextHandle,
}

impl<D: Driver> Context<D> {
    pub(crate) fn open(driver: Arc<D>) -> Result<Self> {
        let handle = driver.create_context()?;
        log::debug!("driver context {:?} created", handle);
        Ok(Self { driver, handle })
    }

    pub(crate) fn driver(&self) -> &D {
        &self.driver
    }

    pub(crate) fn set_filter(&self, class: DeviceClass, filter: u16) {
        self.driver.set_filter(self.handle, class, filter);
    }

    pub(crate) fn wait_with_timeout(&self, millis: u32) -> DeviceId {
        self.driver.wait_with_timeout(self.handle, millis)
    }

    pub(crate) fn receive(&self, device: DeviceId, strokes: &mut [RawStroke]) -> i32 {
        self.driver.receive(self.handle, device, strokes)
    }

    pub(crate) fn send(&self, device: DeviceId, strokes: &[RawStroke]) -> i32 {
        self.driver.send(self.handle, device, strokes)
    }

    pub(crate) fn hardware_id(&self, device: DeviceId, buffer: &mut [u8]) -> usize {
        self.driver.hardware_id(self.handle, device, buffer)
    }
}

impl<D: Driver> Drop for Context<D> {
    fn drop(&mut self) {
        self.driver.destroy_context(self.handle);
        log::debug!("driver context {:?} destroyed", self.handle);
    }
}
