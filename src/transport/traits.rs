//! Core trait for the BLE transport abstraction.
//!
//! Defines the `BleTransport` trait that allows both a real serial-attached
//! BLE gateway and a mock implementation to be used interchangeably by the
//! test harness.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::error::TransportError;

/// Async interface to one BLE peripheral under test.
///
/// Implementations are accessed exclusively by the running test session, so
/// the trait requires `Send` but not `Sync`.
#[async_trait]
pub trait BleTransport: Send + std::fmt::Debug {
    /// Scan for a device advertising any of the given service UUIDs.
    ///
    /// Returns `Ok(true)` if a matching device was found and selected as the
    /// peripheral under test, `Ok(false)` if the scan completed without a
    /// match.
    async fn find_device(&mut self, service_uuids: &[Uuid]) -> Result<bool, TransportError>;

    /// Connect to the previously discovered peripheral.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Disconnect from the peripheral.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Subscribe to control-point notifications.
    async fn enable_notifications(&mut self) -> Result<(), TransportError>;

    /// Write a raw command payload to the control point.
    async fn write_control_point(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Wait for the next control-point notification.
    ///
    /// Returns `TransportError::Timeout` if nothing arrives within
    /// `timeout`.
    async fn next_notification(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// Identifier for this transport, for log output.
    fn name(&self) -> &str;
}
