//! Subscriber traits and the ordered subscriber registry.

use crate::error::Error;
use crate::event::{KeyEvent, MouseEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Trait for handling intercepted keyboard strokes.
///
/// Handlers run synchronously on the interception thread, in subscription
/// order, and all see the same event. A handler may rewrite `key`/`state`
/// or set `handled` to drop the stroke; later handlers see those changes.
/// Keep them short: physical input stalls while a handler runs.
pub trait KeyHandler: Send + Sync {
    /// Called for every intercepted keyboard stroke.
    fn handle_key(&self, event: &mut KeyEvent);
}

/// Implement KeyHandler for closures.
impl<F> KeyHandler for F
where
    F: Fn(&mut KeyEvent) + Send + Sync,
{
    fn handle_key(&self, event: &mut KeyEvent) {
        self(event);
    }
}

/// Trait for handling intercepted mouse strokes.
///
/// Same contract as [`KeyHandler`].
pub trait MouseHandler: Send + Sync {
    /// Called for every intercepted mouse stroke.
    fn handle_mouse(&self, event: &mut MouseEvent);
}

/// Implement MouseHandler for closures.
impl<F> MouseHandler for F
where
    F: Fn(&mut MouseEvent) + Send + Sync,
{
    fn handle_mouse(&self, event: &mut MouseEvent) {
        self(event);
    }
}

/// Trait for learning that the interception loop died.
///
/// Called on the interception thread after the session was marked unloaded.
pub trait FatalHandler: Send + Sync {
    /// Called once with the error that ended the loop.
    fn handle_fatal(&self, error: &Error);
}

/// Implement FatalHandler for closures.
impl<F> FatalHandler for F
where
    F: Fn(&Error) + Send + Sync,
{
    fn handle_fatal(&self, error: &Error) {
        self(error);
    }
}

/// Token returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// One ordered list of handlers.
///
/// Copy-on-write: subscribing and unsubscribing swap in a new slice, so a
/// dispatch only clones the `Arc` of the current one.
struct HandlerList<H: ?Sized> {
    entries: RwLock<Arc<[Entry<H>]>>,
}

type Entry<H> = (SubscriptionId, Arc<H>);

impl<H: ?Sized> HandlerList<H> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::from(Vec::new())),
        }
    }

    fn push(&self, id: SubscriptionId, handler: Arc<H>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: Vec<Entry<H>> = entries.iter().cloned().collect();
        next.push((id, handler));
        *entries = Arc::from(next);
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.iter().any(|(entry, _)| *entry == id) {
            return false;
        }
        let next: Vec<Entry<H>> = entries
            .iter()
            .filter(|(entry, _)| *entry != id)
            .cloned()
            .collect();
        *entries = Arc::from(next);
        true
    }

    /// The current handlers. Callbacks run without the lock held and may
    /// (un)subscribe freely; changes show up from the next dispatch.
    fn snapshot(&self) -> Arc<[Entry<H>]> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// All subscribers of one `Input`, plus the last fatal error.
///
/// Outlives individual sessions: subscriptions survive unload and reload.
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    keys: HandlerList<dyn KeyHandler>,
    mice: HandlerList<dyn MouseHandler>,
    fatal: HandlerList<dyn FatalHandler>,
    last_error: Mutex<Option<Error>>,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            keys: HandlerList::new(),
            mice: HandlerList::new(),
            fatal: HandlerList::new(),
            last_error: Mutex::new(None),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn add_key(&self, handler: Arc<dyn KeyHandler>) -> SubscriptionId {
        let id = self.next_id();
        self.keys.push(id, handler);
        id
    }

    pub(crate) fn add_mouse(&self, handler: Arc<dyn MouseHandler>) -> SubscriptionId {
        let id = self.next_id();
        self.mice.push(id, handler);
        id
    }

    pub(crate) fn add_fatal(&self, handler: Arc<dyn FatalHandler>) -> SubscriptionId {
        let id = self.next_id();
        self.fatal.push(id, handler);
        id
    }

    /// Remove a subscription from whichever list holds it.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        self.keys.remove(id) || self.mice.remove(id) || self.fatal.remove(id)
    }

    pub(crate) fn dispatch_key(&self, event: &mut KeyEvent) {
        for (_, handler) in self.keys.snapshot().iter() {
            handler.handle_key(event);
        }
    }

    pub(crate) fn dispatch_mouse(&self, event: &mut MouseEvent) {
        for (_, handler) in self.mice.snapshot().iter() {
            handler.handle_mouse(event);
        }
    }

    /// Record `error` as the last error and tell every fatal handler.
    pub(crate) fn notify_fatal(&self, error: &Error) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error.clone());
        for (_, handler) in self.fatal.snapshot().iter() {
            handler.handle_fatal(error);
        }
    }

    pub(crate) fn last_error(&self) -> Option<Error> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn clear_last_error(&self) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[cfg(test)]
    pub(crate) fn counts(&self) -> (usize, usize) {
        (self.keys.len(), self.mice.len())
    }
}
