//! End-to-end scenarios for the GPIO error-check test, driven against the
//! mock transport.

mod common;

use bledut_harness::command::{StatusCode, OP_RESET_DEFAULT_CONFIG, OP_SET_GPIO_CONFIG};
use bledut_harness::runner::{run_with_transport, TestOutcome};

use common::{healthy_mock, scripted_mock, test_config};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn scenario_a_documented_responses_pass() {
    let mock = healthy_mock();
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Pass);
    assert_eq!(report.note, None);
    assert_eq!(report.records.len(), 6);
    assert!(report.records.iter().all(|r| r.matched));

    // Six GPIO commands plus the teardown reset.
    let writes = mock.write_log();
    assert_eq!(writes.len(), 7);
    assert_eq!(writes[0][0], OP_SET_GPIO_CONFIG);
    assert_eq!(*writes.last().unwrap(), vec![OP_RESET_DEFAULT_CONFIG]);

    // Main body connect plus teardown reconnect.
    assert_eq!(mock.connect_count(), 2);
    assert!(!mock.is_connected());
}

#[tokio::test]
async fn scenario_b_wrong_status_fails_but_run_completes() {
    // Step 4 (valid config) answers INVALID_DATA instead of SUCCESS.
    let mock = scripted_mock(&[
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::InvalidData.into()],
        &[StatusCode::InvalidState.into()],
        &[StatusCode::InvalidData.into()],
    ]);
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Fail);
    assert_eq!(report.records.len(), 6, "mismatch must not abort the run");
    assert!(!report.records[3].matched);
    assert_eq!(report.records[3].actual, Some(vec![StatusCode::InvalidData.into()]));
    // The steps after the mismatch still ran and still matched.
    assert!(report.records[4].matched);
    assert!(report.records[5].matched);
}

#[tokio::test]
async fn scenario_c_device_not_found_skips_everything() {
    let mock = healthy_mock();
    mock.set_device_present(false);
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Fail);
    assert_eq!(report.note.as_deref(), Some("Could not find a test device!"));
    assert!(report.records.is_empty());
    // No commands were issued and teardown was skipped.
    assert!(mock.write_log().is_empty());
    assert_eq!(mock.connect_count(), 0);
}

#[tokio::test]
async fn scenario_d_disconnect_failure_noted_but_verdict_unaffected() {
    let mock = healthy_mock();
    mock.set_disconnect_ok(false);
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.note.as_deref(), Some("Failed to disconnect"));
    assert_eq!(report.outcome, TestOutcome::Pass);
    assert_eq!(report.records.len(), 6);
}

#[tokio::test]
async fn connect_failure_short_circuits_and_skips_teardown() {
    let mock = healthy_mock();
    mock.set_connect_ok(false);
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Fail);
    assert_eq!(report.note.as_deref(), Some("Failed to connect to device!"));
    assert!(report.records.is_empty());
    assert!(mock.write_log().is_empty());
}

#[tokio::test]
async fn mid_sequence_abort_still_runs_teardown() {
    // A transport fault on the first command aborts the checked sequence;
    // teardown must still reconnect, reset the device and disconnect.
    let mock = healthy_mock();
    mock.expect_write(&[0xff]);
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Fail);
    assert!(report.note.unwrap().contains("Test aborted mid-sequence"));
    assert!(report.records.is_empty());
    // The faulted command plus the teardown reset.
    let writes = mock.write_log();
    assert_eq!(writes.len(), 2);
    assert_eq!(*writes.last().unwrap(), vec![OP_RESET_DEFAULT_CONFIG]);
    // Main body connect plus teardown reconnect.
    assert_eq!(mock.connect_count(), 2);
    assert!(!mock.is_connected());
}

#[tokio::test]
async fn abort_note_survives_disconnect_failure() {
    // When the body aborts and the disconnect also fails, the abort note
    // carries more information and must not be replaced.
    let mock = healthy_mock();
    mock.expect_write(&[0xff]);
    mock.set_disconnect_ok(false);
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Fail);
    assert!(report.note.unwrap().contains("Test aborted mid-sequence"));
}

#[tokio::test]
async fn dropped_notification_times_out_and_run_continues() {
    // Only five responses arrive; the misalignment cascades and the final
    // step waits out its deadline.
    let mock = scripted_mock(&[
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::InvalidParameter.into()],
        &[StatusCode::InvalidState.into()],
        &[StatusCode::InvalidData.into()],
    ]);
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Fail);
    assert_eq!(report.records.len(), 6, "timeout must not abort the run");
    assert_eq!(report.records[5].actual, None);
    assert!(!report.records[5].matched);
    // All six commands were still issued; teardown reset fired too but its
    // drain timed out harmlessly.
    assert_eq!(mock.write_log().len(), 7);
}

#[tokio::test]
async fn command_bytes_match_documented_encoding() {
    let mock = healthy_mock();
    // Pin expectations on every control-point write of the main body.
    mock.expect_write(&[0x50, 0x20, 0x00, 0x01]); // invalid pin
    mock.expect_write(&[0x50, 0x00, 0x02, 0x01]); // invalid direction
    mock.expect_write(&[0x50, 0x00, 0x00, 0x04]); // invalid pull
    mock.expect_write(&[0x50, 0x00, 0x00, 0x01]); // valid input, pull-down
    mock.expect_write(&[0x51, 0x00, 0x01]); // write high to input pin
    mock.expect_write(&[0x50, 0x02, 0x00]); // truncated config
    mock.expect_write(&[0x56]); // teardown reset
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Pass);
    assert!(mock.verify_expectations().is_ok());
}

#[tokio::test]
async fn longer_notifications_still_match_on_status_prefix() {
    // Device appends the echoed opcode and parameters; only the status
    // byte is asserted.
    let mock = scripted_mock(&[
        &[0x07, 0x50, 0x20],
        &[0x07, 0x50, 0x00],
        &[0x07, 0x50, 0x00],
        &[0x00, 0x50, 0x00],
        &[0x06, 0x51, 0x00],
        &[0x05, 0x50],
    ]);
    let config = test_config();

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Pass);
}

#[tokio::test]
async fn bad_uuid_configuration_fails_before_touching_the_device() {
    let mock = healthy_mock();
    let mut config = test_config();
    config.device.service_uuids = vec!["not-a-uuid".to_string()];

    let report = run_with_transport(Box::new(mock.clone()), &config).await;

    assert_eq!(report.outcome, TestOutcome::Fail);
    assert!(report.note.unwrap().contains("service UUID"));
    assert!(mock.write_log().is_empty());
}
