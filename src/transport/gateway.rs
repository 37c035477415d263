//! Serial-attached BLE gateway transport.
//!
//! Talks to a BLE bridge dongle over a serial port using a small framed
//! protocol. Host-to-gateway frames are `[0xA5, op, len, payload...]`;
//! gateway-to-host frames are `[0x5A, event, len, payload...]`. The gateway
//! acknowledges every command with an `ACK` event carrying the command
//! opcode and a status byte; control-point notifications from the connected
//! peripheral arrive as `NOTIFY` events and may interleave with acks, so
//! they are buffered until the harness asks for them.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::command::hex_str;

use super::error::TransportError;
use super::traits::BleTransport;

const SOF_COMMAND: u8 = 0xa5;
const SOF_EVENT: u8 = 0x5a;

const CMD_FIND: u8 = 0x01;
const CMD_CONNECT: u8 = 0x02;
const CMD_DISCONNECT: u8 = 0x03;
const CMD_SUBSCRIBE: u8 = 0x04;
const CMD_WRITE: u8 = 0x05;

const EVT_ACK: u8 = 0x01;
const EVT_NOTIFY: u8 = 0x02;

const ACK_OK: u8 = 0x00;
const ACK_FAILED: u8 = 0x01;
const ACK_NO_DEVICE: u8 = 0x02;

/// How long to wait for the gateway to acknowledge a command. Scans take
/// longest; the gateway caps its scan window below this.
const ACK_TIMEOUT: Duration = Duration::from_secs(15);

/// Granularity of the blocking serial reads inside a deadline loop.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// BLE transport backed by a serial-attached gateway dongle.
pub struct GatewayTransport {
    /// The underlying serial link to the gateway.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
    /// Notifications that arrived while waiting for an ack.
    pending_notifications: VecDeque<Vec<u8>>,
}

impl GatewayTransport {
    /// Open the serial link to the gateway.
    ///
    /// # Arguments
    /// * `port_name` - The system path to the serial port (e.g.,
    ///   "/dev/ttyUSB0" or "COM3")
    /// * `baud_rate` - Link speed; gateways ship configured for 115200
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(POLL_INTERVAL)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => TransportError::frame(format!(
                    "Gateway serial port not found: {port_name}"
                )),
                _ => TransportError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
            pending_notifications: VecDeque::new(),
        })
    }

    fn send_command(&mut self, op: u8, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > u8::MAX as usize {
            return Err(TransportError::frame("Command payload too long"));
        }
        let mut frame = Vec::with_capacity(3 + payload.len());
        frame.push(SOF_COMMAND);
        frame.push(op);
        frame.push(payload.len() as u8);
        frame.extend_from_slice(payload);
        debug!(op, payload = %hex_str(payload), "gateway command");
        self.port.write_all(&frame)?;
        Ok(())
    }

    /// Read one gateway frame, waiting at most until `deadline`.
    fn read_frame(&mut self, deadline: Instant) -> Result<(u8, Vec<u8>), TransportError> {
        let mut header = [0u8; 3];
        let mut filled = 0;

        while filled < header.len() {
            if Instant::now() >= deadline {
                return Err(TransportError::timeout(POLL_INTERVAL));
            }
            match self.port.read(&mut header[filled..]) {
                Ok(0) => {}
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(TransportError::Io(e)),
            }
        }

        if header[0] != SOF_EVENT {
            return Err(TransportError::frame(format!(
                "Bad start-of-frame byte 0x{:02x}",
                header[0]
            )));
        }

        let event = header[1];
        let len = header[2] as usize;
        let mut payload = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            if Instant::now() >= deadline {
                return Err(TransportError::frame("Truncated gateway frame"));
            }
            match self.port.read(&mut payload[filled..]) {
                Ok(0) => {}
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(TransportError::Io(e)),
            }
        }

        debug!(event, payload = %hex_str(&payload), "gateway event");
        Ok((event, payload))
    }

    /// Wait for the ack to `op`, buffering any notifications that arrive
    /// first.
    fn await_ack(&mut self, op: u8) -> Result<u8, TransportError> {
        let deadline = Instant::now() + ACK_TIMEOUT;
        loop {
            let (event, payload) = self.read_frame(deadline).map_err(|e| {
                if e.is_timeout() {
                    TransportError::frame(format!("Gateway did not acknowledge command 0x{op:02x}"))
                } else {
                    e
                }
            })?;
            match event {
                EVT_ACK => {
                    if payload.len() != 2 {
                        return Err(TransportError::frame("Malformed ack frame"));
                    }
                    if payload[0] != op {
                        warn!(
                            expected = op,
                            got = payload[0],
                            "ack for unexpected command, discarding"
                        );
                        continue;
                    }
                    return Ok(payload[1]);
                }
                EVT_NOTIFY => self.pending_notifications.push_back(payload),
                other => {
                    warn!(event = other, "unknown gateway event, discarding");
                }
            }
        }
    }
}

#[async_trait]
impl BleTransport for GatewayTransport {
    async fn find_device(&mut self, service_uuids: &[Uuid]) -> Result<bool, TransportError> {
        let mut payload = Vec::with_capacity(service_uuids.len() * 16);
        for uuid in service_uuids {
            payload.extend_from_slice(uuid.as_bytes());
        }
        self.send_command(CMD_FIND, &payload)?;
        match self.await_ack(CMD_FIND)? {
            ACK_OK => Ok(true),
            ACK_NO_DEVICE => Ok(false),
            status => Err(TransportError::frame(format!(
                "Scan failed with gateway status 0x{status:02x}"
            ))),
        }
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        self.send_command(CMD_CONNECT, &[])?;
        match self.await_ack(CMD_CONNECT)? {
            ACK_OK => Ok(()),
            _ => Err(TransportError::ConnectFailed),
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.send_command(CMD_DISCONNECT, &[])?;
        match self.await_ack(CMD_DISCONNECT)? {
            ACK_OK => Ok(()),
            _ => Err(TransportError::DisconnectFailed),
        }
    }

    async fn enable_notifications(&mut self) -> Result<(), TransportError> {
        self.send_command(CMD_SUBSCRIBE, &[])?;
        match self.await_ack(CMD_SUBSCRIBE)? {
            ACK_OK => Ok(()),
            status if status == ACK_FAILED => Err(TransportError::NotConnected),
            status => Err(TransportError::frame(format!(
                "Subscribe failed with gateway status 0x{status:02x}"
            ))),
        }
    }

    async fn write_control_point(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.send_command(CMD_WRITE, data)?;
        match self.await_ack(CMD_WRITE)? {
            ACK_OK => Ok(()),
            _ => Err(TransportError::NotConnected),
        }
    }

    async fn next_notification(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        if let Some(payload) = self.pending_notifications.pop_front() {
            return Ok(payload);
        }

        let deadline = Instant::now() + timeout;
        loop {
            match self.read_frame(deadline) {
                Ok((EVT_NOTIFY, payload)) => return Ok(payload),
                Ok((event, _)) => {
                    warn!(event, "unexpected gateway event while awaiting notification");
                }
                Err(e) if e.is_timeout() => return Err(TransportError::timeout(timeout)),
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for GatewayTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayTransport")
            .field("name", &self.name)
            .field(
                "pending_notifications",
                &self.pending_notifications.len(),
            )
            .finish()
    }
}
