//! Device session: the connect/command/response lifecycle for one test run.
//!
//! A `DeviceSession` owns the transport, the queue of outstanding response
//! expectations and the per-step result log, scoping all mutable test state
//! to one run instance. The session enforces the single-in-flight invariant:
//! each command pushes exactly one expectation and consumes exactly one
//! notification before the next command is issued.

use std::time::Duration;

use tracing::{debug, warn};

use crate::command::{hex_str, StatusCode};
use crate::expect::{ExpectQueue, StepRecord};
use crate::transport::{BleTransport, TransportError};

/// One connected exchange with the device under test.
pub struct DeviceSession {
    transport: Box<dyn BleTransport>,
    response_timeout: Duration,
    expectations: ExpectQueue,
    records: Vec<StepRecord>,
}

impl DeviceSession {
    /// Create a session over the given transport.
    ///
    /// `response_timeout` bounds the wait for each command's response
    /// notification; an expired deadline is recorded as a failed step, not
    /// an abort.
    pub fn new(transport: Box<dyn BleTransport>, response_timeout: Duration) -> Self {
        Self {
            transport,
            response_timeout,
            expectations: ExpectQueue::new(),
            records: Vec::new(),
        }
    }

    /// Scan for the device under test.
    pub async fn find_device(
        &mut self,
        service_uuids: &[uuid::Uuid],
    ) -> Result<bool, TransportError> {
        self.transport.find_device(service_uuids).await
    }

    /// Connect to the device under test.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        self.transport.connect().await
    }

    /// Disconnect from the device under test.
    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.transport.disconnect().await
    }

    /// Subscribe to control-point notifications.
    pub async fn enable_notifications(&mut self) -> Result<(), TransportError> {
        self.transport.enable_notifications().await
    }

    /// Issue a command and validate that the response starts with the given
    /// status byte.
    ///
    /// Returns whether the response matched. Transport faults other than a
    /// response timeout propagate as errors; a timeout is recorded as a
    /// failed step and returns `Ok(false)`.
    pub async fn expect_status(
        &mut self,
        label: &str,
        expected: StatusCode,
        command: &[u8],
    ) -> Result<bool, TransportError> {
        self.expect_response(label, vec![expected.into()], command)
            .await
    }

    /// Issue a command and validate the response against an arbitrary
    /// expected byte pattern (prefix comparison).
    pub async fn expect_response(
        &mut self,
        label: &str,
        expected: Vec<u8>,
        command: &[u8],
    ) -> Result<bool, TransportError> {
        debug!(label, command = %hex_str(command), "issuing command");
        // Queue the expectation only once the command is actually on the
        // wire; a failed write must not leave a stale expectation behind.
        self.transport.write_control_point(command).await?;
        self.expectations.push(expected);

        match self.transport.next_notification(self.response_timeout).await {
            Ok(payload) => {
                if let Some(status) = payload.first() {
                    debug!(
                        status = %StatusCode::describe(*status),
                        payload = %hex_str(&payload),
                        "response received"
                    );
                }
                match self.expectations.check(&payload) {
                    Some((expected, matched)) => {
                        let record = StepRecord {
                            label: label.to_string(),
                            expected,
                            actual: Some(payload),
                            matched,
                        };
                        if !matched {
                            warn!("{}", record.summary());
                        }
                        self.records.push(record);
                        Ok(matched)
                    }
                    None => {
                        // Unsolicited payload with nothing queued; discard.
                        debug!(payload = %hex_str(&payload), "no expectation outstanding, discarding");
                        Ok(false)
                    }
                }
            }
            Err(e) if e.is_timeout() => {
                let expected = self.expectations.expire().unwrap_or_default();
                let record = StepRecord {
                    label: label.to_string(),
                    expected,
                    actual: None,
                    matched: false,
                };
                warn!("{}", record.summary());
                self.records.push(record);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Issue a command and wait for its response without validating or
    /// recording anything. Used by teardown, which only cares that the
    /// device acted on the command.
    pub async fn send_and_drain(&mut self, command: &[u8]) -> Result<(), TransportError> {
        debug!(command = %hex_str(command), "issuing unchecked command");
        self.transport.write_control_point(command).await?;
        let payload = self.transport.next_notification(self.response_timeout).await?;
        debug!(payload = %hex_str(&payload), "drained response");
        Ok(())
    }

    /// Step records accumulated so far, in issue order.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Whether every recorded step matched its expectation.
    pub fn all_matched(&self) -> bool {
        self.records.iter().all(|r| r.matched)
    }

    /// Number of expectations queued without a consumed response. At most
    /// one between commands; zero once a response or timeout resolves it.
    pub fn outstanding_expectations(&self) -> usize {
        self.expectations.outstanding()
    }

    /// Transport identifier, for log output.
    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("transport", &self.transport)
            .field("outstanding", &self.expectations.outstanding())
            .field("records", &self.records.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command;
    use crate::transport::MockTransport;

    fn session_with_mock() -> (DeviceSession, MockTransport) {
        let mock = MockTransport::new("MOCK0");
        let session = DeviceSession::new(Box::new(mock.clone()), Duration::from_millis(50));
        (session, mock)
    }

    #[tokio::test]
    async fn test_expect_status_match() {
        let (mut session, mock) = session_with_mock();
        session.connect().await.unwrap();
        session.enable_notifications().await.unwrap();
        mock.enqueue_notification(&[StatusCode::Success.into()]);

        let matched = session
            .expect_status("valid config", StatusCode::Success, &command::set_gpio_config(0, 0, 1))
            .await
            .unwrap();

        assert!(matched);
        assert_eq!(session.records().len(), 1);
        assert!(session.all_matched());
        assert_eq!(mock.write_log(), vec![vec![0x50, 0x00, 0x00, 0x01]]);
    }

    #[tokio::test]
    async fn test_expect_status_mismatch_is_recorded() {
        let (mut session, mock) = session_with_mock();
        session.connect().await.unwrap();
        session.enable_notifications().await.unwrap();
        mock.enqueue_notification(&[StatusCode::InvalidData.into()]);

        let matched = session
            .expect_status("valid config", StatusCode::Success, &command::set_gpio_config(0, 0, 1))
            .await
            .unwrap();

        assert!(!matched);
        assert!(!session.all_matched());
        let record = &session.records()[0];
        assert_eq!(record.actual, Some(vec![0x05]));
    }

    #[tokio::test]
    async fn test_trailing_response_bytes_ignored() {
        let (mut session, mock) = session_with_mock();
        session.connect().await.unwrap();
        session.enable_notifications().await.unwrap();
        // Device echoes the opcode after the status byte.
        mock.enqueue_notification(&[0x07, 0x50, 0xaa]);

        let matched = session
            .expect_status("invalid pin", StatusCode::InvalidParameter, &[0x50, 0x20, 0x00, 0x01])
            .await
            .unwrap();

        assert!(matched);
    }

    #[tokio::test]
    async fn test_response_timeout_records_miss() {
        let (mut session, _mock) = session_with_mock();
        session.connect().await.unwrap();
        session.enable_notifications().await.unwrap();

        let matched = session
            .expect_status("no response", StatusCode::Success, &[0x56])
            .await
            .unwrap();

        assert!(!matched);
        let record = &session.records()[0];
        assert_eq!(record.actual, None);
        assert!(!record.matched);
    }

    #[tokio::test]
    async fn test_hard_fault_propagates() {
        let (mut session, _mock) = session_with_mock();
        // Not connected: the write itself fails.
        let result = session
            .expect_status("no link", StatusCode::Success, &[0x56])
            .await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
        assert!(session.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_queues_no_expectation() {
        let (mut session, mock) = session_with_mock();
        session.connect().await.unwrap();
        session.enable_notifications().await.unwrap();
        mock.expect_write(&[0xff]);

        let result = session
            .expect_status("wrong frame", StatusCode::Success, &[0x56])
            .await;

        assert!(matches!(result, Err(TransportError::Frame(_))));
        assert_eq!(session.outstanding_expectations(), 0);
        assert!(session.records().is_empty());
    }

    #[tokio::test]
    async fn test_send_and_drain() {
        let (mut session, mock) = session_with_mock();
        session.connect().await.unwrap();
        session.enable_notifications().await.unwrap();
        mock.enqueue_notification(&[0x00]);

        session
            .send_and_drain(&command::reset_default_configuration())
            .await
            .unwrap();

        assert!(session.records().is_empty());
        assert_eq!(mock.write_log(), vec![vec![0x56]]);
    }
}
