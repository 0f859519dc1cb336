//! Driver sessions: the [`Input`] type, loading and unloading.

use crate::config::Config;
use crate::device::{DeviceClass, DeviceId, DeviceInfo};
use crate::driver::{Context, Driver, InterceptionDriver};
use crate::error::{Error, Result};
use crate::hook::{FatalHandler, KeyHandler, MouseHandler, Subscribers, SubscriptionId};
use crate::intercept::{self, LoopControl, RunningGuard};
use crate::platform;
use crate::state::DeviceRegistry;
use crate::stroke::{KeyboardFilter, MouseFilter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

/// Name of the interception thread.
const THREAD_NAME: &str = "interceptor-loop";

/// Size of the buffer handed to the driver for hardware ids.
const HARDWARE_ID_BUFFER: usize = 1024;

/// One loaded session: a driver context plus the thread running the loop.
struct Session<D: Driver> {
    /// The loop thread and in-flight sends own the context; this only
    /// reaches it while one of them is alive.
    context: Weak<Context<D>>,
    control: Arc<LoopControl>,
    thread_id: ThreadId,
    thread: Option<JoinHandle<Result<()>>>,
}

/// Wait for a loop thread and return what the loop returned.
fn join(handle: Option<JoinHandle<Result<()>>>) -> Result<()> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| Error::ThreadError("interception thread panicked".into()))?,
        None => Ok(()),
    }
}

/// Keyboard and mouse interception through the Interception driver.
///
/// An `Input` owns at most one session at a time. While loaded, strokes
/// matching the configured filters are handed to the subscribers on a
/// dedicated thread and then forwarded, rewritten or dropped. Synthetic
/// input can be sent from any thread while loaded.
///
/// Subscriptions and configuration belong to the `Input` and survive
/// unload/load cycles. Dropping the `Input` unloads it.
///
/// # Example
///
/// ```no_run
/// use interceptor::{Config, Input, Key, KeyEvent};
///
/// let input = Input::with_config(Config::capture_all());
/// input.on_key(|event: &mut KeyEvent| {
///     if event.key == Key::CapsLock {
///         event.key = Key::Escape;
///     }
/// });
/// if !input.load() {
///     eprintln!("Interception driver is not installed");
/// }
/// ```
pub struct Input<D: Driver = InterceptionDriver> {
    driver: Arc<D>,
    config: RwLock<Config>,
    subscribers: Arc<Subscribers>,
    devices: Arc<DeviceRegistry>,
    /// Serializes load and unload against each other.
    lifecycle: Mutex<()>,
    session: Mutex<Option<Session<D>>>,
}

impl Default for Input<InterceptionDriver> {
    fn default() -> Self {
        Self::new()
    }
}

impl Input<InterceptionDriver> {
    /// Create an instance with the default configuration, which intercepts
    /// nothing until filters are set.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an instance with `config`.
    pub fn with_config(config: Config) -> Self {
        Self::with_driver(Arc::new(InterceptionDriver::new()), config)
    }
}

impl<D: Driver> Input<D> {
    /// Create an instance on top of any [`Driver`].
    pub fn with_driver(driver: Arc<D>, config: Config) -> Self {
        let devices = DeviceRegistry::new(
            config.default_keyboard,
            config.default_mouse,
            config.track_devices,
        );
        Self {
            driver,
            config: RwLock::new(config),
            subscribers: Arc::new(Subscribers::new()),
            devices: Arc::new(devices),
            lifecycle: Mutex::new(()),
            session: Mutex::new(None),
        }
    }

    /// The driver this instance talks to.
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a session. Returns `false` if already loaded or the driver is
    /// unavailable; see [`Input::try_load`] for the reason.
    pub fn load(&self) -> bool {
        match self.try_load() {
            Ok(()) => true,
            Err(e) => {
                log::debug!("load failed: {}", e);
                false
            }
        }
    }

    /// Start a session.
    ///
    /// Opens a driver context, installs the configured filters and starts
    /// the interception thread. A session that ended on its own (fatal
    /// driver error, or unloaded from a subscriber) is cleaned up first.
    ///
    /// Cannot be called from a subscriber of this instance.
    pub fn try_load(&self) -> Result<()> {
        if let Some(session) = self.lock_session().as_ref() {
            if session.control.is_live() {
                return Err(Error::AlreadyLoaded);
            }
            if session.thread_id == thread::current().id() {
                return Err(Error::ThreadError(
                    "cannot load from the interception thread".into(),
                ));
            }
        }

        let _lifecycle = self.lock_lifecycle();
        self.reap()?;

        let config = self.config();
        let context = Arc::new(Context::open(self.driver.clone())?);
        context.set_filter(DeviceClass::Keyboard, config.keyboard_filter.bits());
        context.set_filter(DeviceClass::Mouse, config.mouse_filter.bits());
        self.devices.reset(
            config.default_keyboard,
            config.default_mouse,
            config.track_devices,
        );
        self.subscribers.clear_last_error();

        let control = Arc::new(LoopControl::new());
        let spawned = {
            let context = context.clone();
            let control = control.clone();
            let subscribers = self.subscribers.clone();
            let devices = self.devices.clone();
            let poll_millis = config.poll_millis();
            thread::Builder::new()
                .name(THREAD_NAME.into())
                .spawn(move || {
                    let _running = RunningGuard(&control);
                    platform::raise_current_thread_priority();
                    intercept::run(&context, &control, &subscribers, &devices, poll_millis)
                })
        };
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                context.set_filter(DeviceClass::Keyboard, KeyboardFilter::NONE.bits());
                context.set_filter(DeviceClass::Mouse, MouseFilter::NONE.bits());
                return Err(Error::ThreadError(e.to_string()));
            }
        };

        log::debug!(
            "driver session loaded (keyboard filter {:?}, mouse filter {:?})",
            config.keyboard_filter,
            config.mouse_filter
        );
        *self.lock_session() = Some(Session {
            context: Arc::downgrade(&context),
            control,
            thread_id: handle.thread().id(),
            thread: Some(handle),
        });
        Ok(())
    }

    /// Stop the session. No-op if nothing is loaded.
    pub fn unload(&self) {
        if let Err(e) = self.try_unload() {
            log::debug!("unload: {}", e);
        }
    }

    /// Stop the session and wait for the interception thread to finish.
    ///
    /// Returns [`Error::NotLoaded`] if nothing was running. If the session
    /// had already died, it is cleaned up and the error that ended it is
    /// returned.
    ///
    /// From a subscriber of this instance the stop is only requested; the
    /// thread finishes once the subscriber returns.
    pub fn try_unload(&self) -> Result<()> {
        {
            let slot = self.lock_session();
            match slot.as_ref() {
                None => return Err(Error::NotLoaded),
                Some(session) if session.thread_id == thread::current().id() => {
                    let was_live = session.control.is_live();
                    session.control.request_stop();
                    log::debug!("unload requested from the interception thread");
                    return if was_live { Ok(()) } else { Err(Error::NotLoaded) };
                }
                Some(_) => {}
            }
        }

        let _lifecycle = self.lock_lifecycle();
        let (was_live, handle) = {
            let mut slot = self.lock_session();
            let Some(session) = slot.as_mut() else {
                return Err(Error::NotLoaded);
            };
            let was_live = session.control.is_live();
            session.control.request_stop();
            (was_live, session.thread.take())
        };

        // The session stays in its slot while joining, so a subscriber that
        // unloads during the join still finds it.
        let outcome = join(handle);
        self.lock_session().take();
        log::debug!("driver session unloaded");

        match outcome {
            Err(e) => Err(e),
            Ok(()) if was_live => Ok(()),
            Ok(()) => Err(Error::NotLoaded),
        }
    }

    /// Whether a session is loaded and its loop is running.
    pub fn is_loaded(&self) -> bool {
        self.lock_session()
            .as_ref()
            .is_some_and(|session| session.control.is_live())
    }

    /// Whether the driver can be used: loads and immediately unloads.
    /// Always `true` while this instance is loaded.
    pub fn driver_exists(&self) -> bool {
        if self.is_loaded() {
            return true;
        }
        let loaded = self.load();
        if loaded {
            self.unload();
        }
        loaded
    }

    /// Remove a dead session from the slot and join its thread.
    fn reap(&self) -> Result<()> {
        let stale = {
            let mut slot = self.lock_session();
            let live = match slot.as_ref() {
                None => return Ok(()),
                Some(session) => session.control.is_live(),
            };
            if live {
                return Err(Error::AlreadyLoaded);
            }
            slot.take()
        };
        if let Some(mut session) = stale {
            session.control.request_stop();
            if let Err(e) = join(session.thread.take()) {
                log::debug!("previous session ended with: {}", e);
            }
        }
        Ok(())
    }

    /// The context of the running session.
    pub(crate) fn live_context(&self) -> Result<Arc<Context<D>>> {
        self.lock_session()
            .as_ref()
            .filter(|session| session.control.is_live())
            .and_then(|session| session.context.upgrade())
            .ok_or(Error::NotLoaded)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Config {
        self.read_config().clone()
    }

    /// Replace the whole configuration. Rejected while loaded.
    pub fn set_config(&self, config: Config) -> Result<()> {
        let _lifecycle = self.lock_unloaded()?;
        self.devices.reset(
            config.default_keyboard,
            config.default_mouse,
            config.track_devices,
        );
        *self.write_config() = config;
        Ok(())
    }

    /// Set which keyboard strokes are intercepted. Rejected while loaded.
    pub fn set_keyboard_filter(&self, filter: KeyboardFilter) -> Result<()> {
        let _lifecycle = self.lock_unloaded()?;
        self.write_config().keyboard_filter = filter;
        Ok(())
    }

    /// Set which mouse strokes are intercepted. Rejected while loaded.
    pub fn set_mouse_filter(&self, filter: MouseFilter) -> Result<()> {
        let _lifecycle = self.lock_unloaded()?;
        self.write_config().mouse_filter = filter;
        Ok(())
    }

    pub fn keyboard_filter(&self) -> KeyboardFilter {
        self.read_config().keyboard_filter
    }

    pub fn mouse_filter(&self) -> MouseFilter {
        self.read_config().mouse_filter
    }

    /// Set the pause after each synthetic key stroke.
    pub fn set_key_press_delay(&self, delay: Duration) {
        self.write_config().key_press_delay = delay;
    }

    /// Set the pause between the halves of a synthetic click.
    pub fn set_click_delay(&self, delay: Duration) {
        self.write_config().click_delay = delay;
    }

    /// Set the pause after each synthetic scroll.
    pub fn set_scroll_delay(&self, delay: Duration) {
        self.write_config().scroll_delay = delay;
    }

    /// Hold the lifecycle lock while no session is loaded, so a concurrent
    /// load sees the change or the change is rejected.
    ///
    /// The interception thread always belongs to a session and must not wait
    /// on a lock held by an unload that is joining it.
    fn lock_unloaded(&self) -> Result<MutexGuard<'_, ()>> {
        let on_loop_thread = self
            .lock_session()
            .as_ref()
            .is_some_and(|session| session.thread_id == thread::current().id());
        if on_loop_thread {
            return Err(Error::AlreadyLoaded);
        }
        let lifecycle = self.lock_lifecycle();
        if self.is_loaded() {
            return Err(Error::AlreadyLoaded);
        }
        Ok(lifecycle)
    }

    pub(crate) fn read_config(&self) -> RwLockReadGuard<'_, Config> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_config(&self) -> RwLockWriteGuard<'_, Config> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Subscribe to intercepted keyboard strokes.
    pub fn on_key<H: KeyHandler + 'static>(&self, handler: H) -> SubscriptionId {
        self.subscribers.add_key(Arc::new(handler))
    }

    /// Subscribe to intercepted mouse strokes.
    pub fn on_mouse<H: MouseHandler + 'static>(&self, handler: H) -> SubscriptionId {
        self.subscribers.add_mouse(Arc::new(handler))
    }

    /// Subscribe to fatal loop failures.
    pub fn on_fatal<H: FatalHandler + 'static>(&self, handler: H) -> SubscriptionId {
        self.subscribers.add_fatal(Arc::new(handler))
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// The error that ended the most recent session, if it died.
    pub fn last_error(&self) -> Option<Error> {
        self.subscribers.last_error()
    }

    // ------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------

    /// Keyboard that synthetic key strokes go to.
    pub fn current_keyboard(&self) -> DeviceId {
        self.devices.current(DeviceClass::Keyboard)
    }

    /// Mouse that synthetic mouse strokes go to.
    pub fn current_mouse(&self) -> DeviceId {
        self.devices.current(DeviceClass::Mouse)
    }

    /// Hardware id of `device`, empty when nothing is attached there.
    ///
    /// Works without a loaded session by opening a short-lived context.
    pub fn hardware_id(&self, device: DeviceId) -> Result<String> {
        if !device.is_valid() {
            return Err(Error::InvalidDevice(device));
        }
        let context = self.query_context()?;
        Ok(read_hardware_id(&context, device))
    }

    /// Every attached device, keyboards first.
    pub fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let context = self.query_context()?;
        let devices = DeviceId::all()
            .filter_map(|id| {
                let hardware_id = read_hardware_id(&context, id);
                if hardware_id.is_empty() {
                    return None;
                }
                let class = context.driver().classify(id)?;
                Some(DeviceInfo {
                    id,
                    class,
                    hardware_id,
                })
            })
            .collect();
        Ok(devices)
    }

    fn query_context(&self) -> Result<Arc<Context<D>>> {
        match self.live_context() {
            Ok(context) => Ok(context),
            Err(_) => Ok(Arc::new(Context::open(self.driver.clone())?)),
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session<D>>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: Driver> Drop for Input<D> {
    fn drop(&mut self) {
        if self.lock_session().is_some() {
            self.unload();
        }
    }
}

/// Read a UTF-16LE hardware id, dropping trailing NULs.
fn read_hardware_id<D: Driver>(context: &Context<D>, device: DeviceId) -> String {
    let mut buffer = [0u8; HARDWARE_ID_BUFFER];
    let written = context.hardware_id(device, &mut buffer).min(buffer.len());
    let units: Vec<u16> = buffer[..written]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::MockDriver;

    fn mock_input() -> (Arc<MockDriver>, Input<MockDriver>) {
        let driver = Arc::new(MockDriver::new());
        let config = Config {
            poll_interval: Duration::from_millis(5),
            ..Config::capture_all().without_delays()
        };
        (driver.clone(), Input::with_driver(driver, config))
    }

    #[test]
    fn test_load_twice_is_noop() {
        let (driver, input) = mock_input();
        assert!(input.load());
        assert!(!input.load());
        assert_eq!(input.try_load(), Err(Error::AlreadyLoaded));
        assert_eq!(driver.contexts_created(), 1);
        assert!(input.is_loaded());
        input.unload();
    }

    #[test]
    fn test_unload_releases_context_and_filters() {
        let (driver, input) = mock_input();
        assert!(input.load());
        assert_eq!(driver.filters(), (KeyboardFilter::ALL, MouseFilter::ALL));

        assert_eq!(input.try_unload(), Ok(()));
        assert!(!input.is_loaded());
        assert_eq!(driver.live_contexts(), 0);
        assert_eq!(driver.filters(), (KeyboardFilter::NONE, MouseFilter::NONE));

        assert_eq!(input.try_unload(), Err(Error::NotLoaded));
        input.unload();
    }

    #[test]
    fn test_load_fails_without_driver() {
        let driver = Arc::new(MockDriver::unavailable());
        let input = Input::with_driver(driver, Config::default());
        assert!(!input.load());
        assert!(!input.is_loaded());
        assert!(!input.driver_exists());
    }

    #[test]
    fn test_driver_exists_leaves_state_unchanged() {
        let (driver, input) = mock_input();
        assert!(input.driver_exists());
        assert!(!input.is_loaded());
        assert_eq!(driver.live_contexts(), 0);

        assert!(input.load());
        assert!(input.driver_exists());
        assert!(input.is_loaded());
        assert_eq!(driver.contexts_created(), 2);
    }

    #[test]
    fn test_filter_change_rejected_while_loaded() {
        let (_driver, input) = mock_input();
        assert!(input.load());
        assert_eq!(
            input.set_keyboard_filter(KeyboardFilter::KEY_DOWN),
            Err(Error::AlreadyLoaded)
        );
        input.set_key_press_delay(Duration::from_millis(3));
        assert_eq!(input.config().key_press_delay, Duration::from_millis(3));

        input.unload();
        assert_eq!(input.set_keyboard_filter(KeyboardFilter::KEY_DOWN), Ok(()));
        assert_eq!(input.keyboard_filter(), KeyboardFilter::KEY_DOWN);
    }

    #[test]
    fn test_filter_change_races_load() {
        for _ in 0..20 {
            let (driver, input) = mock_input();
            assert_eq!(input.set_keyboard_filter(KeyboardFilter::NONE), Ok(()));
            let input = Arc::new(input);

            let setter = {
                let input = input.clone();
                thread::spawn(move || {
                    let filters = [KeyboardFilter::KEY_DOWN, KeyboardFilter::KEY_UP];
                    for filter in filters.into_iter().cycle().take(10_000) {
                        if input.set_keyboard_filter(filter).is_err() {
                            break;
                        }
                    }
                })
            };
            assert!(input.load());
            setter.join().expect("setter thread");

            // Every accepted change happened before the load read the config.
            assert_eq!(driver.filters().0, input.keyboard_filter());
            input.unload();
        }
    }

    #[test]
    fn test_filter_change_from_subscriber_is_rejected() {
        let (driver, input) = mock_input();
        let input = Arc::new(input);
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);
        let weak = Arc::downgrade(&input);
        input.on_key(move |_: &mut crate::event::KeyEvent| {
            if let Some(input) = weak.upgrade() {
                let result = input.set_mouse_filter(MouseFilter::NONE);
                let _ = tx.lock().unwrap().send(result);
            }
        });
        assert!(input.load());

        driver.inject_key(
            DeviceId(1),
            crate::stroke::KeyStroke {
                code: 0x1E,
                state: 0,
                information: 0,
            },
        );
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(Err(Error::AlreadyLoaded))
        );
        input.unload();
        assert_eq!(input.mouse_filter(), MouseFilter::ALL);
    }

    #[test]
    fn test_drop_unloads() {
        let (driver, input) = mock_input();
        assert!(input.load());
        drop(input);
        assert_eq!(driver.live_contexts(), 0);
    }

    #[test]
    fn test_hardware_ids() {
        let (driver, input) = mock_input();
        driver.set_hardware_id(DeviceId(1), "HID\\VID_046D&PID_C31C\0\0");
        driver.set_hardware_id(DeviceId(12), "HID\\VID_046D&PID_C077");

        assert_eq!(
            input.hardware_id(DeviceId(1)),
            Ok("HID\\VID_046D&PID_C31C".to_string())
        );
        assert_eq!(input.hardware_id(DeviceId(2)), Ok(String::new()));
        assert_eq!(
            input.hardware_id(DeviceId(0)),
            Err(Error::InvalidDevice(DeviceId(0)))
        );

        let devices = input.devices().expect("mock driver available");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].class, DeviceClass::Keyboard);
        assert_eq!(devices[1].id, DeviceId(12));
        assert_eq!(devices[1].class, DeviceClass::Mouse);
        assert_eq!(driver.live_contexts(), 0);
    }
}
