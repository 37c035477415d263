//! BLE DUT Harness Library
//!
//! This library provides the building blocks for automated functional tests
//! of a BLE peripheral's GPIO control endpoint: transport abstraction,
//! command encoding, response validation and test sequencing.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `command`: Control-point command encoding and status codes
//! - `expect`: Response validation against queued expectations
//! - `transport`: BLE transport abstraction (gateway and mock)
//! - `session`: Device session lifecycle for one test run
//! - `runner`: Test sequencing, aggregation and teardown
//! - `error`: Unified error handling

pub mod command;
pub mod config;
pub mod error;
pub mod expect;
pub mod runner;
pub mod session;
pub mod transport;

// Re-export commonly used types for convenience
pub use command::{Direction, PinState, Pull, StatusCode};
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::{HarnessError, HarnessResult};
pub use expect::{prefix_matches, ExpectQueue, StepRecord};
pub use runner::{run_with_transport, GpioErrorCheckTest, TestCase, TestOutcome, TestReport};
pub use session::DeviceSession;
pub use transport::{BleTransport, GatewayTransport, MockTransport, TransportError};
