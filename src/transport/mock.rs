//! Mock BLE transport for testing.
//!
//! Provides a `MockTransport` that simulates a peripheral under test without
//! requiring radio hardware. Supports scripted notification queues, write
//! logging, expectation verification, and fault injection for the discovery,
//! connect and disconnect phases.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::error::TransportError;
use super::traits::BleTransport;

/// Inner state of the mock, protected by a mutex for interior mutability.
#[derive(Debug)]
struct MockState {
    /// Whether a scan finds the device.
    device_present: bool,
    /// Whether connection attempts succeed.
    connect_ok: bool,
    /// Whether disconnect attempts succeed.
    disconnect_ok: bool,
    /// Current connection state.
    connected: bool,
    /// Whether control-point notifications are enabled.
    notifications_enabled: bool,
    /// Scripted notifications, delivered oldest first.
    notifications: VecDeque<Vec<u8>>,
    /// Log of all control-point writes.
    write_log: Vec<Vec<u8>>,
    /// Expected control-point writes (for verification).
    expected_writes: VecDeque<Vec<u8>>,
    /// Number of successful connections made so far.
    connect_count: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            device_present: true,
            connect_ok: true,
            disconnect_ok: true,
            connected: false,
            notifications_enabled: false,
            notifications: VecDeque::new(),
            write_log: Vec::new(),
            expected_writes: VecDeque::new(),
            connect_count: 0,
        }
    }
}

/// Mock transport implementation for testing.
///
/// This implementation allows you to:
/// - Script notifications to be delivered after each command
/// - Inspect what was written to the control point
/// - Set expectations for control-point writes
/// - Simulate a missing device, connect failures and disconnect failures
///
/// The mock is `Clone`; clones share state, so a test can keep a handle for
/// inspection while the session owns another.
#[derive(Clone)]
pub struct MockTransport {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Script a notification to be delivered by a later
    /// `next_notification` call.
    pub fn enqueue_notification(&self, payload: &[u8]) {
        self.lock().notifications.push_back(payload.to_vec());
    }

    /// Control whether a scan finds the device.
    pub fn set_device_present(&self, present: bool) {
        self.lock().device_present = present;
    }

    /// Control whether connection attempts succeed.
    pub fn set_connect_ok(&self, ok: bool) {
        self.lock().connect_ok = ok;
    }

    /// Control whether disconnect attempts succeed.
    pub fn set_disconnect_ok(&self, ok: bool) {
        self.lock().disconnect_ok = ok;
    }

    /// Expect a specific control-point write.
    ///
    /// Use `verify_expectations()` to check that all expected writes
    /// occurred in order.
    pub fn expect_write(&self, data: &[u8]) {
        self.lock().expected_writes.push_back(data.to_vec());
    }

    /// Verify that all expected writes have occurred in order.
    pub fn verify_expectations(&self) -> Result<(), String> {
        let state = self.lock();
        if !state.expected_writes.is_empty() {
            return Err(format!(
                "Expected {} more control-point write(s), but none occurred",
                state.expected_writes.len()
            ));
        }
        Ok(())
    }

    /// Get a copy of all control-point writes.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.lock().write_log.clone()
    }

    /// Whether the mock currently considers itself connected.
    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Whether control-point notifications are currently enabled.
    pub fn notifications_enabled(&self) -> bool {
        self.lock().notifications_enabled
    }

    /// Number of successful connections made so far. Teardown reconnects,
    /// so a full run against a healthy mock counts two.
    pub fn connect_count(&self) -> usize {
        self.lock().connect_count
    }
}

#[async_trait]
impl BleTransport for MockTransport {
    async fn find_device(&mut self, _service_uuids: &[Uuid]) -> Result<bool, TransportError> {
        Ok(self.lock().device_present)
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.connect_ok {
            return Err(TransportError::ConnectFailed);
        }
        state.connected = true;
        state.connect_count += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut state = self.lock();
        // The link drops either way; only the status reported differs.
        state.connected = false;
        state.notifications_enabled = false;
        if !state.disconnect_ok {
            return Err(TransportError::DisconnectFailed);
        }
        Ok(())
    }

    async fn enable_notifications(&mut self) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.notifications_enabled = true;
        Ok(())
    }

    async fn write_control_point(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }

        state.write_log.push(data.to_vec());

        if let Some(expected) = state.expected_writes.pop_front() {
            if expected != data {
                return Err(TransportError::frame(format!(
                    "Expected write: {:?}, got: {:?}",
                    expected, data
                )));
            }
        }

        Ok(())
    }

    async fn next_notification(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        // Without a subscription nothing is ever delivered, exactly like a
        // peripheral whose CCCD was never written.
        if !state.notifications_enabled {
            return Err(TransportError::timeout(timeout));
        }
        match state.notifications.pop_front() {
            Some(payload) => Ok(payload),
            None => Err(TransportError::timeout(timeout)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockTransport")
            .field("name", &self.name)
            .field("connected", &state.connected)
            .field("pending_notifications", &state.notifications.len())
            .finish()
    }
}
