//! Binding to the native Interception library, resolved at runtime.
//!
//! The library is opened on the first `create_context`, so a machine without
//! the driver installed only sees `Error::DriverUnavailable` from `load`.

use super::{ContextHandle, Driver};
use crate::device::{DeviceClass, DeviceId, MAX_DEVICE, MAX_KEYBOARD};
use crate::error::{Error, Result};
use crate::stroke::RawStroke;
use libloading::Library;
use std::ffi::{OsStr, OsString, c_int, c_uint, c_ulong, c_void};
use std::sync::OnceLock;

/// Default library file name.
pub const LIBRARY_NAME: &str = "interception.dll";

type Predicate = unsafe extern "C" fn(device: c_int) -> c_int;
type CreateContextFn = unsafe extern "C" fn() -> *mut c_void;
type DestroyContextFn = unsafe extern "C" fn(context: *mut c_void);
type SetFilterFn = unsafe extern "C" fn(context: *mut c_void, predicate: Predicate, filter: u16);
type WaitFn = unsafe extern "C" fn(context: *mut c_void) -> c_int;
type WaitWithTimeoutFn = unsafe extern "C" fn(context: *mut c_void, milliseconds: c_ulong) -> c_int;
type ReceiveFn =
    unsafe extern "C" fn(context: *mut c_void, device: c_int, stroke: *mut RawStroke, n: c_uint) -> c_int;
type SendFn = unsafe extern "C" fn(
    context: *mut c_void,
    device: c_int,
    stroke: *const RawStroke,
    n: c_uint,
) -> c_int;
type HardwareIdFn = unsafe extern "C" fn(
    context: *mut c_void,
    device: c_int,
    buffer: *mut c_void,
    size: c_uint,
) -> c_uint;

/// Entry points copied out of the loaded library.
struct Api {
    create_context: CreateContextFn,
    destroy_context: DestroyContextFn,
    set_filter: SetFilterFn,
    wait: WaitFn,
    wait_with_timeout: WaitWithTimeoutFn,
    receive: ReceiveFn,
    send: SendFn,
    is_keyboard: Predicate,
    is_mouse: Predicate,
    get_hardware_id: HardwareIdFn,
    // Keeps every pointer above valid.
    _library: Library,
}

impl Api {
    /// # Safety
    ///
    /// `path` must name an Interception library exporting the C API with the
    /// signatures declared above.
    unsafe fn open(path: &OsStr) -> std::result::Result<Self, libloading::Error> {
        let library = unsafe { Library::new(path)? };
        let create_context = unsafe { symbol::<CreateContextFn>(&library, b"interception_create_context\0")? };
        let destroy_context =
            unsafe { symbol::<DestroyContextFn>(&library, b"interception_destroy_context\0")? };
        let set_filter = unsafe { symbol::<SetFilterFn>(&library, b"interception_set_filter\0")? };
        let wait = unsafe { symbol::<WaitFn>(&library, b"interception_wait\0")? };
        let wait_with_timeout =
            unsafe { symbol::<WaitWithTimeoutFn>(&library, b"interception_wait_with_timeout\0")? };
        let receive = unsafe { symbol::<ReceiveFn>(&library, b"interception_receive\0")? };
        let send = unsafe { symbol::<SendFn>(&library, b"interception_send\0")? };
        let is_keyboard = unsafe { symbol::<Predicate>(&library, b"interception_is_keyboard\0")? };
        let is_mouse = unsafe { symbol::<Predicate>(&library, b"interception_is_mouse\0")? };
        let get_hardware_id =
            unsafe { symbol::<HardwareIdFn>(&library, b"interception_get_hardware_id\0")? };

        Ok(Self {
            create_context,
            destroy_context,
            set_filter,
            wait,
            wait_with_timeout,
            receive,
            send,
            is_keyboard,
            is_mouse,
            get_hardware_id,
            _library: library,
        })
    }
}

/// Copy a function pointer out of `library`.
///
/// # Safety
///
/// `T` must be the exact type of the exported symbol.
unsafe fn symbol<T: Copy>(library: &Library, name: &[u8]) -> std::result::Result<T, libloading::Error> {
    let symbol = unsafe { library.get::<T>(name)? };
    Ok(*symbol)
}

/// [`Driver`] backed by `interception.dll`.
pub struct InterceptionDriver {
    path: OsString,
    api: OnceLock<Api>,
}

impl Default for InterceptionDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptionDriver {
    /// Use the library found by the platform's normal search order.
    pub fn new() -> Self {
        Self::with_library(LIBRARY_NAME)
    }

    /// Use the library at `path`.
    pub fn with_library(path: impl Into<OsString>) -> Self {
        Self {
            path: path.into(),
            api: OnceLock::new(),
        }
    }

    /// Whether the library has been loaded.
    pub fn is_library_loaded(&self) -> bool {
        self.api.get().is_some()
    }

    fn api(&self) -> Result<&Api> {
        if let Some(api) = self.api.get() {
            return Ok(api);
        }
        // SAFETY: the path is expected to be the Interception library; a
        // wrong library fails symbol lookup rather than being called.
        let api = unsafe { Api::open(&self.path) }.map_err(|e| {
            log::warn!("cannot load {}: {}", self.path.to_string_lossy(), e);
            Error::DriverUnavailable(format!("{}: {}", self.path.to_string_lossy(), e))
        })?;
        Ok(self.api.get_or_init(|| api))
    }

    /// Only reachable with a handle, which implies the library is loaded.
    fn loaded(&self) -> Option<&Api> {
        self.api.get()
    }
}

impl Driver for InterceptionDriver {
    fn create_context(&self) -> Result<ContextHandle> {
        let api = self.api()?;
        // SAFETY: no preconditions.
        let raw = unsafe { (api.create_context)() };
        ContextHandle::from_raw(raw).ok_or_else(|| {
            Error::DriverUnavailable("interception_create_context returned null".into())
        })
    }

    fn destroy_context(&self, context: ContextHandle) {
        if let Some(api) = self.loaded() {
            // SAFETY: the handle came from create_context and is destroyed once.
            unsafe { (api.destroy_context)(context.as_ptr()) }
        }
    }

    fn set_filter(&self, context: ContextHandle, class: DeviceClass, filter: u16) {
        if let Some(api) = self.loaded() {
            let predicate = match class {
                DeviceClass::Keyboard => api.is_keyboard,
                DeviceClass::Mouse => api.is_mouse,
            };
            // SAFETY: live handle; the predicate is the library's own export.
            unsafe { (api.set_filter)(context.as_ptr(), predicate, filter) }
        }
    }

    fn wait(&self, context: ContextHandle) -> DeviceId {
        match self.loaded() {
            // SAFETY: live handle.
            Some(api) => DeviceId(unsafe { (api.wait)(context.as_ptr()) }),
            None => DeviceId::NONE,
        }
    }

    fn wait_with_timeout(&self, context: ContextHandle, millis: u32) -> DeviceId {
        match self.loaded() {
            // SAFETY: live handle.
            Some(api) => DeviceId(unsafe {
                (api.wait_with_timeout)(context.as_ptr(), millis as c_ulong)
            }),
            None => DeviceId::NONE,
        }
    }

    fn receive(&self, context: ContextHandle, device: DeviceId, strokes: &mut [RawStroke]) -> i32 {
        match self.loaded() {
            // SAFETY: live handle; the buffer holds `strokes.len()` strokes.
            Some(api) => unsafe {
                (api.receive)(
                    context.as_ptr(),
                    device.raw(),
                    strokes.as_mut_ptr(),
                    strokes.len() as c_uint,
                )
            },
            None => 0,
        }
    }

    fn send(&self, context: ContextHandle, device: DeviceId, strokes: &[RawStroke]) -> i32 {
        match self.loaded() {
            // SAFETY: live handle; the buffer holds `strokes.len()` strokes.
            Some(api) => unsafe {
                (api.send)(
                    context.as_ptr(),
                    device.raw(),
                    strokes.as_ptr(),
                    strokes.len() as c_uint,
                )
            },
            None => 0,
        }
    }

    fn is_keyboard(&self, device: DeviceId) -> bool {
        match self.loaded() {
            // SAFETY: pure function of the id.
            Some(api) => unsafe { (api.is_keyboard)(device.raw()) != 0 },
            None => device.raw() >= 1 && device.raw() <= MAX_KEYBOARD,
        }
    }

    fn is_mouse(&self, device: DeviceId) -> bool {
        match self.loaded() {
            // SAFETY: pure function of the id.
            Some(api) => unsafe { (api.is_mouse)(device.raw()) != 0 },
            None => device.raw() > MAX_KEYBOARD && device.raw() <= MAX_DEVICE,
        }
    }

    fn hardware_id(&self, context: ContextHandle, device: DeviceId, buffer: &mut [u8]) -> usize {
        match self.loaded() {
            // SAFETY: live handle; the driver writes at most `buffer.len()` bytes.
            Some(api) => unsafe {
                (api.get_hardware_id)(
                    context.as_ptr(),
                    device.raw(),
                    buffer.as_mut_ptr().cast(),
                    buffer.len() as c_uint,
                ) as usize
            },
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_is_unavailable() {
        let driver = InterceptionDriver::with_library("definitely-not-interception-0xdead.dll");
        match driver.create_context() {
            Err(Error::DriverUnavailable(message)) => {
                assert!(message.contains("definitely-not-interception"))
            }
            other => panic!("expected DriverUnavailable, got {:?}", other),
        }
        assert!(!driver.is_library_loaded());
    }

    #[test]
    fn test_classification_without_library() {
        let driver = InterceptionDriver::with_library("definitely-not-interception-0xdead.dll");
        assert!(driver.is_keyboard(DeviceId(1)));
        assert!(driver.is_mouse(DeviceId(11)));
        assert_eq!(driver.classify(DeviceId(0)), None);
        assert_eq!(driver.classify(DeviceId(21)), None);
    }
}
