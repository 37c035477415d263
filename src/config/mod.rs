//! Configuration module for the test harness.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `BLEDUT_CONFIG` environment variable (explicit path)
//! 2. `./bledut.toml` (current directory)
//! 3. `~/.config/bledut/bledut.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\bledut\bledut.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `BLEDUT_<SECTION>_<KEY>`
//!
//! Examples:
//! - `BLEDUT_DEVICE_GATEWAY_PORT=/dev/ttyUSB1`
//! - `BLEDUT_DEVICE_BAUD=1000000`
//! - `BLEDUT_TIMING_RESPONSE_TIMEOUT_MS=250`
//! - `BLEDUT_LOGGING_LEVEL=debug`

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{Config, DeviceConfig, LogFormat, LoggingConfig, TimingConfig};
