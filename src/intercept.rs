//! The interception loop: wait, receive, classify, dispatch, forward.
//!
//! Runs on the session's own thread. Strokes are handled strictly one at a
//! time in driver order, and whether a stroke is forwarded or dropped is
//! decided before the next one is fetched.

use crate::device::{DeviceClass, DeviceId};
use crate::driver::{Context, Driver};
use crate::error::{Error, Result};
use crate::event::{KeyEvent, MouseEvent};
use crate::hook::Subscribers;
use crate::state::DeviceRegistry;
use crate::stroke::{KeyboardFilter, MouseFilter, RawStroke, Stroke};
use std::sync::atomic::{AtomicBool, Ordering};

/// Upper bound on strokes forwarded while shutting down.
const DRAIN_LIMIT: usize = 256;

/// Stop and liveness flags shared between a session and its loop thread.
#[derive(Debug)]
pub(crate) struct LoopControl {
    stop: AtomicBool,
    running: AtomicBool,
}

impl LoopControl {
    pub(crate) fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            running: AtomicBool::new(true),
        }
    }

    /// Ask the loop to exit after its current wait.
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Loop thread still running and no stop requested.
    pub(crate) fn is_live(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.stop_requested()
    }

    pub(crate) fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Clears the running flag when the loop thread ends, panics included.
pub(crate) struct RunningGuard<'a>(pub(crate) &'a LoopControl);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_stopped();
    }
}

/// What to do with a dispatched stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Forward,
    Suppress,
}

/// Run the loop until a stop is requested or the driver fails.
///
/// Filters are expected to be installed already. On exit they are reset to
/// `NONE` and strokes the driver had already captured are forwarded.
pub(crate) fn run<D: Driver>(
    context: &Context<D>,
    control: &LoopControl,
    subscribers: &Subscribers,
    devices: &DeviceRegistry,
    poll_millis: u32,
) -> Result<()> {
    log::debug!("interception loop started");
    let mut buffer = [RawStroke::default()];

    while !control.stop_requested() {
        let device = context.wait_with_timeout(poll_millis);
        if !device.is_valid() {
            continue;
        }

        let received = context.receive(device, &mut buffer);
        if received <= 0 {
            if control.stop_requested() {
                break;
            }
            return Err(fail(context, control, subscribers, device, received));
        }

        let Some(class) = context.driver().classify(device) else {
            log::trace!("forwarding stroke from unclassified device {}", device);
            forward(context, device, &buffer);
            continue;
        };
        devices.observe(class, device);

        if control.stop_requested() {
            forward(context, device, &buffer);
            break;
        }

        match process(class, device, &mut buffer[0], subscribers) {
            Verdict::Suppress => log::trace!("suppressed stroke from device {}", device),
            Verdict::Forward => forward(context, device, &buffer),
        }
    }

    shutdown(context);
    log::debug!("interception loop stopped");
    Ok(())
}

/// Decode `raw`, run the subscribers on it and write their changes back.
pub(crate) fn process(
    class: DeviceClass,
    device: DeviceId,
    raw: &mut RawStroke,
    subscribers: &Subscribers,
) -> Verdict {
    let stroke = match raw.decode(class) {
        Stroke::Key(mut stroke) => {
            let mut event = KeyEvent::from_stroke(device, &stroke);
            subscribers.dispatch_key(&mut event);
            if event.handled {
                return Verdict::Suppress;
            }
            event.apply_to(&mut stroke);
            Stroke::Key(stroke)
        }
        Stroke::Mouse(mut stroke) => {
            let mut event = MouseEvent::from_stroke(device, &stroke);
            subscribers.dispatch_mouse(&mut event);
            if event.handled {
                return Verdict::Suppress;
            }
            event.apply_to(&mut stroke);
            Stroke::Mouse(stroke)
        }
    };
    *raw = RawStroke::encode(&stroke);
    Verdict::Forward
}

fn forward<D: Driver>(context: &Context<D>, device: DeviceId, strokes: &[RawStroke]) {
    if context.send(device, strokes) <= 0 {
        log::warn!("driver refused to forward stroke for device {}", device);
    }
}

fn reset_filters<D: Driver>(context: &Context<D>) {
    context.set_filter(DeviceClass::Keyboard, KeyboardFilter::NONE.bits());
    context.set_filter(DeviceClass::Mouse, MouseFilter::NONE.bits());
}

/// Stop trapping input, then pass on whatever was trapped in the meantime.
fn shutdown<D: Driver>(context: &Context<D>) {
    reset_filters(context);

    let mut buffer = [RawStroke::default()];
    let mut drained = 0;
    while drained < DRAIN_LIMIT {
        let device = context.wait_with_timeout(0);
        if !device.is_valid() || context.receive(device, &mut buffer) <= 0 {
            break;
        }
        forward(context, device, &buffer);
        drained += 1;
    }
    if drained > 0 {
        log::debug!("forwarded {} strokes captured during shutdown", drained);
    }
}

fn fail<D: Driver>(
    context: &Context<D>,
    control: &LoopControl,
    subscribers: &Subscribers,
    device: DeviceId,
    code: i32,
) -> Error {
    control.mark_stopped();
    let error = Error::LoopFatal { device, code };
    log::error!("interception loop failed: {}", error);
    subscribers.notify_fatal(&error);
    reset_filters(context);
    error
}
