//! Control-point command encoding for the device under test.
//!
//! The DUT exposes a single control-point characteristic. Every command is a
//! one-byte opcode followed by its parameters; the device answers each write
//! with a notification whose first byte is a [`StatusCode`].

use std::fmt;

/// 128-bit service UUID advertised by devices this harness can test.
pub const CONTROL_SERVICE_UUID: &str = "2413b33f-707f-90bd-2045-2ab8807571b7";

/// Opcode: configure a GPIO pin (pin, direction, pull).
pub const OP_SET_GPIO_CONFIG: u8 = 0x50;
/// Opcode: write a logic level to a GPIO pin (pin, state).
pub const OP_WRITE_GPIO: u8 = 0x51;
/// Opcode: restore the factory default configuration.
pub const OP_RESET_DEFAULT_CONFIG: u8 = 0x56;

/// Lowest pin number (P0.00).
pub const PIN_P0_00: u8 = 0x00;
/// One past the highest valid pin number; anything at or above is rejected.
pub const PIN_COUNT: u8 = 0x20;

/// Status byte returned in the first position of every command response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusCode {
    Success = 0x00,
    Locked = 0x01,
    InvalidLength = 0x02,
    UnlockFailed = 0x03,
    UpdateFailed = 0x04,
    InvalidData = 0x05,
    InvalidState = 0x06,
    InvalidParameter = 0x07,
}

impl StatusCode {
    /// Decode a status byte. Returns `None` for codes the device does not
    /// document.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Success),
            0x01 => Some(Self::Locked),
            0x02 => Some(Self::InvalidLength),
            0x03 => Some(Self::UnlockFailed),
            0x04 => Some(Self::UpdateFailed),
            0x05 => Some(Self::InvalidData),
            0x06 => Some(Self::InvalidState),
            0x07 => Some(Self::InvalidParameter),
            _ => None,
        }
    }

    /// Human-readable name matching the device documentation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Locked => "LOCKED",
            Self::InvalidLength => "INVALID_LENGTH",
            Self::UnlockFailed => "UNLOCK_FAILED",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::InvalidData => "INVALID_DATA",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidParameter => "INVALID_PARAMETER",
        }
    }

    /// Describe any status byte, including undocumented ones.
    pub fn describe(byte: u8) -> String {
        match Self::from_byte(byte) {
            Some(code) => code.as_str().to_string(),
            None => format!("UNKNOWN (0x{byte:02x})"),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StatusCode> for u8 {
    fn from(code: StatusCode) -> Self {
        code as u8
    }
}

/// GPIO pin direction parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Input = 0x00,
    Output = 0x01,
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction as u8
    }
}

/// GPIO pull resistor parameter. Values follow the nRF GPIO register
/// encoding, which is why `Up` is 0x03 and 0x02 is a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Pull {
    None = 0x00,
    Down = 0x01,
    Up = 0x03,
}

impl From<Pull> for u8 {
    fn from(pull: Pull) -> Self {
        pull as u8
    }
}

/// GPIO output level parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PinState {
    Low = 0x00,
    High = 0x01,
}

impl From<PinState> for u8 {
    fn from(state: PinState) -> Self {
        state as u8
    }
}

/// Encode a GPIO configuration command.
///
/// Parameters are raw bytes rather than the typed enums so that callers can
/// deliberately encode out-of-range values when probing the device's
/// parameter validation.
pub fn set_gpio_config(pin: u8, direction: u8, pull: u8) -> Vec<u8> {
    vec![OP_SET_GPIO_CONFIG, pin, direction, pull]
}

/// Encode a GPIO write command. Raw bytes for the same reason as
/// [`set_gpio_config`].
pub fn write_gpio(pin: u8, state: u8) -> Vec<u8> {
    vec![OP_WRITE_GPIO, pin, state]
}

/// Encode a reset-to-defaults command.
pub fn reset_default_configuration() -> Vec<u8> {
    vec![OP_RESET_DEFAULT_CONFIG]
}

/// Format a payload as lowercase hex for log output.
pub fn hex_str(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
