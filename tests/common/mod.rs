//! Shared test utilities for harness integration tests.
//!
//! This module provides common test infrastructure including:
//! - Mock transport creation with pre-programmed notifications
//! - Configuration builders with test-friendly timeouts
//! - A mock scripted with the documented responses of a healthy device

#![allow(dead_code)]

use bledut_harness::command::StatusCode;
use bledut_harness::config::Config;
use bledut_harness::transport::MockTransport;

/// Create a mock transport with pre-programmed notifications.
pub fn scripted_mock(responses: &[&[u8]]) -> MockTransport {
    let mock = MockTransport::new("MOCK0");
    for response in responses {
        mock.enqueue_notification(response);
    }
    mock
}

/// Create a mock that behaves like a healthy device: every GPIO step
/// answers with the documented status byte, and the teardown reset is
/// acknowledged too.
pub fn healthy_mock() -> MockTransport {
    let mock = scripted_mock(&[
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::Success.into()],
        &[StatusCode::InvalidState.into()],
        &[StatusCode::InvalidData.into()],
    ]);
    // Teardown drains one response to the reset command.
    mock.enqueue_notification(&[StatusCode::Success.into()]);
    mock
}

/// Default configuration with a response timeout short enough for mock
/// timeouts to be cheap.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.timing.response_timeout_ms = 50;
    config
}
