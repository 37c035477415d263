//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

use crate::command::CONTROL_SERVICE_UUID;
use crate::transport::TransportError;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Device under test configuration
    pub device: DeviceConfig,
    /// Timing configuration
    pub timing: TimingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Device under test configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial port of the BLE gateway dongle (e.g. "/dev/ttyUSB0" or "COM3")
    pub gateway_port: Option<String>,
    /// Gateway link baud rate
    pub baud: u32,
    /// Service UUIDs the device under test advertises
    pub service_uuids: Vec<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            gateway_port: None,
            baud: 115200,
            service_uuids: vec![CONTROL_SERVICE_UUID.to_string()],
        }
    }
}

impl DeviceConfig {
    /// Parse the configured service UUIDs.
    pub fn parsed_service_uuids(&self) -> Result<Vec<Uuid>, TransportError> {
        self.service_uuids
            .iter()
            .map(|s| Uuid::parse_str(s).map_err(|_| TransportError::InvalidUuid(s.clone())))
            .collect()
    }
}

/// Timing configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long to wait for each command's response notification, in ms
    pub response_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 5000,
        }
    }
}

impl TimingConfig {
    /// Get the response timeout as Duration
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log file path (optional; stderr when unset)
    pub file: Option<PathBuf>,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}
