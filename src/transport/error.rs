//! Transport-specific error types.
//!
//! Defines error types for BLE transport operations, separate from
//! harness-level errors to maintain clean separation of concerns.

use thiserror::Error;

/// Errors that can occur while talking to the device under test.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No advertising device matched the requested service UUIDs.
    #[error("No test device found advertising the requested services")]
    DeviceNotFound,

    /// The gateway reported a failed connection attempt.
    #[error("Failed to connect to the device under test")]
    ConnectFailed,

    /// The gateway reported a failed disconnect.
    #[error("Failed to disconnect from the device under test")]
    DisconnectFailed,

    /// Operation requires an established connection.
    #[error("Not connected to the device under test")]
    NotConnected,

    /// No notification arrived before the deadline.
    #[error("No notification received within {0:?}")]
    Timeout(std::time::Duration),

    /// The gateway sent a malformed or unexpected frame.
    #[error("Gateway protocol error: {0}")]
    Frame(String),

    /// A service UUID in the configuration could not be parsed.
    #[error("Invalid service UUID '{0}'")]
    InvalidUuid(String),

    /// An I/O error occurred on the gateway link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serial-port error occurred on the gateway link.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl TransportError {
    /// Create a Frame error from a message.
    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Whether this error is a response deadline expiry, which the test
    /// sequencer records as a failed step rather than aborting the run.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
