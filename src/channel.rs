//! Channel-based event receiving for processing off the interception thread.
//!
//! These register an observe-only subscriber that copies each event into a
//! channel. The copy reflects rewrites made by subscribers registered
//! earlier. Channel subscribers never suppress or rewrite anything, and never
//! block the interception thread: when a bounded channel is full, the copy is
//! dropped.
//!
//! # Example (Sync)
//!
//! ```no_run
//! use interceptor::{Config, Input};
//! use std::time::Duration;
//!
//! let input = Input::with_config(Config::capture_all());
//! let (_subscription, rx) = input.key_channel(100);
//! input.load();
//!
//! loop {
//!     match rx.recv_timeout(Duration::from_millis(100)) {
//!         Ok(event) => println!("{:?} {:?}", event.key, event.state),
//!         Err(_) => {
//!             // Timeout - do other work or check exit condition
//!         }
//!     }
//! }
//! ```
//!
//! # Example (Async with Tokio)
//!
//! ```ignore
//! use interceptor::{Config, Input};
//!
//! #[tokio::main]
//! async fn main() {
//!     let input = Input::with_config(Config::capture_all());
//!     let (_subscription, mut rx) = input.mouse_async_channel(100);
//!     input.load();
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{:?}", event.state);
//!     }
//! }
//! ```

use crate::driver::Driver;
use crate::event::{KeyEvent, MouseEvent};
use crate::hook::{KeyHandler, MouseHandler, SubscriptionId};
use crate::session::Input;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};

/// Copies events into a bounded std channel.
struct ChannelHandler<T> {
    sender: SyncSender<T>,
}

impl KeyHandler for ChannelHandler<KeyEvent> {
    fn handle_key(&self, event: &mut KeyEvent) {
        // Never block the loop on a slow consumer.
        let _ = self.sender.try_send(event.clone());
    }
}

impl MouseHandler for ChannelHandler<MouseEvent> {
    fn handle_mouse(&self, event: &mut MouseEvent) {
        let _ = self.sender.try_send(event.clone());
    }
}

/// Copies events into an unbounded std channel.
struct UnboundedChannelHandler<T> {
    sender: Sender<T>,
}

impl KeyHandler for UnboundedChannelHandler<KeyEvent> {
    fn handle_key(&self, event: &mut KeyEvent) {
        let _ = self.sender.send(event.clone());
    }
}

impl MouseHandler for UnboundedChannelHandler<MouseEvent> {
    fn handle_mouse(&self, event: &mut MouseEvent) {
        let _ = self.sender.send(event.clone());
    }
}

impl<D: Driver> Input<D> {
    /// Receive copies of keyboard events through a bounded channel.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer. If the buffer is
    ///   full, new events are dropped rather than stalling input.
    pub fn key_channel(&self, capacity: usize) -> (SubscriptionId, Receiver<KeyEvent>) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        (self.on_key(ChannelHandler { sender }), receiver)
    }

    /// Receive copies of mouse events through a bounded channel.
    pub fn mouse_channel(&self, capacity: usize) -> (SubscriptionId, Receiver<MouseEvent>) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        (self.on_mouse(ChannelHandler { sender }), receiver)
    }

    /// Like [`Input::key_channel`], but never drops events. Memory grows if
    /// the consumer falls behind.
    pub fn key_unbounded_channel(&self) -> (SubscriptionId, Receiver<KeyEvent>) {
        let (sender, receiver) = mpsc::channel();
        (self.on_key(UnboundedChannelHandler { sender }), receiver)
    }

    /// Like [`Input::mouse_channel`], but never drops events.
    pub fn mouse_unbounded_channel(&self) -> (SubscriptionId, Receiver<MouseEvent>) {
        let (sender, receiver) = mpsc::channel();
        (self.on_mouse(UnboundedChannelHandler { sender }), receiver)
    }
}

// ============================================================================
// Tokio async support (behind feature flag)
// ============================================================================

#[cfg(feature = "tokio")]
mod tokio_channel {
    use super::*;
    use tokio::sync::mpsc as tokio_mpsc;

    /// Copies events into a tokio channel.
    struct TokioChannelHandler<T> {
        sender: tokio_mpsc::Sender<T>,
    }

    impl KeyHandler for TokioChannelHandler<KeyEvent> {
        fn handle_key(&self, event: &mut KeyEvent) {
            // Use try_send to avoid blocking the interception thread
            let _ = self.sender.try_send(event.clone());
        }
    }

    impl MouseHandler for TokioChannelHandler<MouseEvent> {
        fn handle_mouse(&self, event: &mut MouseEvent) {
            let _ = self.sender.try_send(event.clone());
        }
    }

    impl<D: Driver> Input<D> {
        /// Receive copies of keyboard events through a tokio channel.
        ///
        /// # Example
        ///
        /// ```ignore
        /// let (_subscription, mut rx) = input.key_async_channel(100);
        /// while let Some(event) = rx.recv().await {
        ///     println!("{:?}", event.key);
        /// }
        /// ```
        pub fn key_async_channel(
            &self,
            capacity: usize,
        ) -> (SubscriptionId, tokio_mpsc::Receiver<KeyEvent>) {
            let (sender, receiver) = tokio_mpsc::channel(capacity);
            (self.on_key(TokioChannelHandler { sender }), receiver)
        }

        /// Receive copies of mouse events through a tokio channel.
        pub fn mouse_async_channel(
            &self,
            capacity: usize,
        ) -> (SubscriptionId, tokio_mpsc::Receiver<MouseEvent>) {
            let (sender, receiver) = tokio_mpsc::channel(capacity);
            (self.on_mouse(TokioChannelHandler { sender }), receiver)
        }
    }
}
