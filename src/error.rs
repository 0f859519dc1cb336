//! Error types for the interception engine.

use crate::device::DeviceId;
use thiserror::Error;

/// Result type alias for interceptor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A session is already loaded on this instance.
    #[error("driver session is already loaded")]
    AlreadyLoaded,

    /// No session is loaded on this instance.
    #[error("driver session is not loaded")]
    NotLoaded,

    /// The driver library could not be resolved or refused to create a context.
    #[error("interception driver unavailable: {0}")]
    DriverUnavailable(String),

    /// `receive` failed while the session was not being unloaded.
    ///
    /// The loop tears the session down before reporting this.
    #[error("receive on device {device} returned {code}; driver session torn down")]
    LoopFatal {
        /// Device the loop was receiving from.
        device: DeviceId,
        /// Raw value returned by the driver.
        code: i32,
    },

    /// The driver accepted no strokes for this device.
    #[error("driver rejected stroke for device {0}")]
    SendFailed(DeviceId),

    /// The character has no entry in the text layout table.
    #[error("no key mapping for character {0:?}")]
    UnsupportedCharacter(char),

    /// The id is outside the range the driver assigns.
    #[error("invalid device id {0}")]
    InvalidDevice(DeviceId),

    /// Thread-related error.
    #[error("thread error: {0}")]
    ThreadError(String),
}
