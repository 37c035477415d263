//! Test sequencing, aggregation and teardown.
//!
//! The sequencer drives a fixed ordered list of steps against one device
//! session. Setup and connect failures short-circuit the rest of the run
//! (including teardown); a response mismatch does not — every remaining step
//! still executes so the full picture lands in the report. Assertion
//! failures are state, not errors: the sequencer always reaches aggregation
//! and always produces a report.

use std::fmt;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::command::{self, Direction, PinState, Pull, StatusCode, PIN_COUNT, PIN_P0_00};
use crate::config::Config;
use crate::expect::StepRecord;
use crate::session::DeviceSession;
use crate::transport::{BleTransport, TransportError};

/// Number of command/response steps in the GPIO error-check procedure.
const GPIO_STEP_COUNT: usize = 6;

/// Direction byte the device does not document.
const INVALID_DIRECTION: u8 = 0x02;
/// Pull byte the device does not document.
const INVALID_PULL: u8 = 0x04;

/// Terminal verdict of one test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Pass,
    Fail,
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// Everything a test run produces.
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Terminal verdict.
    pub outcome: TestOutcome,
    /// Human-readable note explaining setup or link trouble, if any.
    pub note: Option<String>,
    /// Per-step records, in issue order.
    pub records: Vec<StepRecord>,
}

impl TestReport {
    fn failed(note: impl Into<String>) -> Self {
        Self {
            outcome: TestOutcome::Fail,
            note: Some(note.into()),
            records: Vec::new(),
        }
    }
}

/// A test case runnable by an external multi-test orchestrator.
#[async_trait]
pub trait TestCase {
    /// Display name for log output and test selection.
    fn display_name(&self) -> &'static str;

    /// Execute the test against the given session. Never panics; all
    /// failures are folded into the report.
    async fn run(&self, session: &mut DeviceSession, config: &Config) -> TestReport;
}

/// Functional test of the DUT's GPIO parameter validation and
/// error reporting.
///
/// Probes the configuration and write commands with out-of-range pin,
/// direction and pull values, one valid configuration, a write to an input
/// pin, and a truncated raw command, asserting the documented status code
/// for each.
#[derive(Debug, Default)]
pub struct GpioErrorCheckTest;

#[async_trait]
impl TestCase for GpioErrorCheckTest {
    fn display_name(&self) -> &'static str {
        "GpioErrorCheck Test"
    }

    async fn run(&self, session: &mut DeviceSession, config: &Config) -> TestReport {
        // Setup: discovery. Failure here skips everything, teardown included.
        let service_uuids = match config.device.parsed_service_uuids() {
            Ok(uuids) => uuids,
            Err(e) => return TestReport::failed(format!("Bad service UUID configuration: {e}")),
        };
        match session.find_device(&service_uuids).await {
            Ok(true) => {}
            Ok(false) => return TestReport::failed("Could not find a test device!"),
            Err(e) => return TestReport::failed(format!("Device discovery failed: {e}")),
        }

        if let Err(e) = session.connect().await {
            warn!(error = %e, "connect failed");
            return TestReport::failed("Failed to connect to device!");
        }

        let mut note = None;

        match self.run_gpio_steps(session).await {
            Ok(()) => {}
            Err(e) => {
                warn!(error = %e, "test body aborted");
                note = Some(format!("Test aborted mid-sequence: {e}"));
            }
        }

        if let Err(e) = session.disconnect().await {
            warn!(error = %e, "disconnect failed");
            // An earlier abort note says more than the disconnect does.
            note.get_or_insert_with(|| "Failed to disconnect".to_string());
        }

        // Aggregate before teardown so a teardown hiccup cannot touch the
        // verdict.
        let records = session.records().to_vec();
        let outcome = if records.len() == GPIO_STEP_COUNT && records.iter().all(|r| r.matched) {
            TestOutcome::Pass
        } else {
            TestOutcome::Fail
        };

        self.teardown(session).await;

        TestReport {
            outcome,
            note,
            records,
        }
    }
}

impl GpioErrorCheckTest {
    /// The six command/response steps. A transport hard fault aborts the
    /// remainder; a mismatch or response timeout does not.
    async fn run_gpio_steps(&self, session: &mut DeviceSession) -> Result<(), TransportError> {
        info!("Notification enable");
        session.enable_notifications().await?;

        info!("Set configuration for invalid GPIO pin as an input, pull down");
        session
            .expect_status(
                "configure invalid pin",
                StatusCode::InvalidParameter,
                &command::set_gpio_config(PIN_COUNT, Direction::Input.into(), Pull::Down.into()),
            )
            .await?;

        info!("Set configuration for GPIO pin with invalid direction");
        session
            .expect_status(
                "configure invalid direction",
                StatusCode::InvalidParameter,
                &command::set_gpio_config(PIN_P0_00, INVALID_DIRECTION, Pull::Down.into()),
            )
            .await?;

        info!("Set configuration for GPIO pin with invalid pull");
        session
            .expect_status(
                "configure invalid pull",
                StatusCode::InvalidParameter,
                &command::set_gpio_config(PIN_P0_00, Direction::Input.into(), INVALID_PULL),
            )
            .await?;

        info!("Set configuration for GPIO pin as input");
        session
            .expect_status(
                "configure input with pull-down",
                StatusCode::Success,
                &command::set_gpio_config(PIN_P0_00, Direction::Input.into(), Pull::Down.into()),
            )
            .await?;

        info!("Write to the input pin to induce error");
        session
            .expect_status(
                "write to input pin",
                StatusCode::InvalidState,
                &command::write_gpio(PIN_P0_00, PinState::High.into()),
            )
            .await?;

        info!("Set GPIO configuration incomplete");
        // Config opcode with the pull byte chopped off.
        session
            .expect_status(
                "truncated config command",
                StatusCode::InvalidData,
                &[command::OP_SET_GPIO_CONFIG, 0x02, 0x00],
            )
            .await?;

        Ok(())
    }

    /// Best-effort cleanup: reconnect, reset the device to its default
    /// configuration, disconnect. Failures are logged and swallowed; the
    /// verdict is already fixed by the time this runs.
    async fn teardown(&self, session: &mut DeviceSession) {
        info!("TearDown connect");
        if let Err(e) = session.connect().await {
            warn!(error = %e, "failed to connect for teardown");
            return;
        }

        if let Err(e) = session.enable_notifications().await {
            warn!(error = %e, "failed to enable notifications for teardown");
        } else {
            info!("Reset default configuration");
            if let Err(e) = session
                .send_and_drain(&command::reset_default_configuration())
                .await
            {
                warn!(error = %e, "reset to defaults failed");
            }
        }

        info!("TearDown disconnect");
        if let Err(e) = session.disconnect().await {
            warn!(error = %e, "failed to disconnect after teardown");
        }
        info!("TearDown done");
    }
}

/// Run the GPIO error-check test over the given transport and report the
/// verdict. This is the entry point the standalone CLI uses; orchestrators
/// embedding multiple tests drive [`TestCase`] directly.
pub async fn run_with_transport(transport: Box<dyn BleTransport>, config: &Config) -> TestReport {
    let mut session = DeviceSession::new(transport, config.timing.response_timeout());
    let test = GpioErrorCheckTest;
    info!(test = test.display_name(), transport = session.transport_name(), "starting");
    let report = test.run(&mut session, config).await;
    info!(test = test.display_name(), result = %report.outcome, "done");
    report
}
