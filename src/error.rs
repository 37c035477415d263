//! Unified harness error type.
//!
//! Transport and configuration failures carry their own error types; this
//! type exists so that library callers and the CLI can hold either behind a
//! single `Result`. The test sequencer itself never propagates assertion
//! failures as errors — those are captured in the test report.

use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Errors surfaced by the harness outside of test assertions.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A transport operation failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
