use std::time::Duration;

use bytes::BytesMut;
use chrono::NaiveDate;
use tracing::{debug, warn};
use vantage_frame::{decode_frame, WAKE_COMMAND, WAKE_RESPONSE};
use vantage_transport::{ByteTransport, TransportError};

use crate::error::{DeviceError, Result};

/// Offset of the package-type byte in LOOP payloads.
const PACKAGE_TYPE_POSITION: usize = 4;

/// Firmware built after this date speaks LOOP2.
const LOOP2_FIRMWARE_CUTOVER: (i32, u32, u32) = (2002, 4, 24);

/// Tunables of the request/response layer.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Deadline for each blocking read.
    pub read_timeout: Duration,
    /// Maximum wake-up attempts. The console auto-sleeps after ~2 minutes
    /// of inactivity and must be woken before each burst of commands.
    pub wake_attempts: u32,
    /// Spacing between wake-up attempts.
    pub wake_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(2),
            wake_attempts: 3,
            wake_backoff: Duration::from_millis(250),
        }
    }
}

/// Stateless command/response exchange with a console.
///
/// One command is outstanding at a time; the engine owns the transport
/// exclusively, so this holds by construction.
pub struct ProtocolEngine<T> {
    transport: T,
    config: EngineConfig,
}

impl<T: ByteTransport> ProtocolEngine<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    pub fn with_config(transport: T, config: EngineConfig) -> Self {
        Self { transport, config }
    }

    pub fn open(&mut self) -> Result<()> {
        self.transport.open().map_err(Into::into)
    }

    pub fn close(&mut self) -> Result<()> {
        self.transport.close().map_err(Into::into)
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ensure_open(&self) -> Result<()> {
        if self.transport.is_open() {
            Ok(())
        } else {
            Err(DeviceError::ClosedConnection)
        }
    }

    /// Discard bytes left over from an earlier exchange.
    fn drain_stale(&mut self) {
        if let Ok(stale) = self.transport.read_available() {
            if !stale.is_empty() {
                debug!(bytes = stale.len(), "discarded stale receive bytes");
            }
        }
    }

    /// Wake the sleeping console: send `\n`, expect `\n\r`.
    pub fn wake_up(&mut self) -> Result<()> {
        self.ensure_open()?;
        for attempt in 1..=self.config.wake_attempts {
            self.drain_stale();
            self.transport.write(WAKE_COMMAND)?;
            match self.transport.wait_for_buffer(self.config.read_timeout) {
                Ok(reply) if reply == WAKE_RESPONSE => {
                    debug!(attempt, "console awake");
                    return Ok(());
                }
                Ok(reply) => debug!(attempt, ?reply, "unexpected wake reply"),
                Err(TransportError::Timeout(_)) => debug!(attempt, "wake attempt timed out"),
                Err(err) => return Err(err.into()),
            }
            if attempt < self.config.wake_attempts {
                std::thread::sleep(self.config.wake_backoff);
            }
        }

        warn!(attempts = self.config.wake_attempts, "console did not wake");
        Err(DeviceError::FailedToSendCommand(format!(
            "console did not wake after {} attempts",
            self.config.wake_attempts
        )))
    }

    /// Write a command and return the first reply burst.
    fn command(&mut self, command: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.drain_stale();
        self.transport.write(command)?;
        Ok(self.transport.wait_for_buffer(self.config.read_timeout)?)
    }

    /// Check the console echoes `TEST` back.
    pub fn validate_connection(&mut self) -> Result<()> {
        let reply = self.command(b"TEST\n")?;
        if reply.get(2..6) == Some(b"TEST".as_slice()) {
            Ok(())
        } else {
            Err(DeviceError::FailedToSendCommand(
                "console did not echo TEST".to_string(),
            ))
        }
    }

    /// Run a command whose reply is text following a literal `OK`.
    fn text_query(&mut self, command: &[u8]) -> Result<String> {
        let reply = self.command(command)?;
        let text = String::from_utf8_lossy(&reply);
        match text.find("OK") {
            Some(index) => Ok(text[index + 2..].trim().to_string()),
            None => Err(DeviceError::MalformedData(format!(
                "no OK in reply to {:?}",
                String::from_utf8_lossy(command)
            ))),
        }
    }

    /// The firmware build date, e.g. `"Apr 24 2002"`.
    pub fn firmware_date_code(&mut self) -> Result<String> {
        self.text_query(b"VER\n")
    }

    /// The firmware version string, e.g. `"v1.90"`.
    pub fn firmware_version(&mut self) -> Result<String> {
        Ok(format!("v{}", self.text_query(b"NVER\n")?))
    }

    /// Whether the console firmware is recent enough to answer LOOP2.
    pub fn supports_loop2_firmware(&mut self) -> Result<bool> {
        let code = self.firmware_date_code()?;
        let date = parse_firmware_date(&code)?;
        let (year, month, day) = LOOP2_FIRMWARE_CUTOVER;
        Ok(NaiveDate::from_ymd_opt(year, month, day).is_some_and(|cutover| date > cutover))
    }

    /// Write a command and reassemble its ACK-framed reply from
    /// `1 + extra_bursts` readable events, then validate and strip framing.
    fn framed_command(&mut self, command: &[u8], extra_bursts: usize) -> Result<Vec<u8>> {
        let mut wire = BytesMut::from(&self.command(command)?[..]);
        for _ in 0..extra_bursts {
            let chunk = self.transport.wait_for_buffer(self.config.read_timeout)?;
            wire.extend_from_slice(&chunk);
        }
        let payload = decode_frame(&wire)?;
        Ok(payload.to_vec())
    }

    /// Fetch the highs-and-lows packet payload.
    pub fn highs_and_lows(&mut self) -> Result<Vec<u8>> {
        self.framed_command(b"HILOWS\n", 0)
    }

    /// Fetch a LOOP1 packet payload.
    pub fn loop1(&mut self) -> Result<Vec<u8>> {
        let payload = self.framed_command(b"LPS 1 1\n", 0)?;
        match payload.get(PACKAGE_TYPE_POSITION) {
            Some(0) => Ok(payload),
            other => Err(DeviceError::MalformedData(format!(
                "expected LOOP1 package type 0, got {other:?}"
            ))),
        }
    }

    /// Fetch a LOOP2 packet payload.
    ///
    /// The console transmits LOOP2 in two serial bursts with a short gap;
    /// both are awaited and concatenated before frame validation.
    pub fn loop2(&mut self) -> Result<Vec<u8>> {
        let payload = self.framed_command(b"LPS 2 1\n", 1)?;
        match payload.get(PACKAGE_TYPE_POSITION) {
            Some(kind) if *kind != 0 => Ok(payload),
            other => Err(DeviceError::MalformedData(format!(
                "expected LOOP2 package type, got {other:?}"
            ))),
        }
    }
}

fn parse_firmware_date(code: &str) -> Result<NaiveDate> {
    let normalized = code.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDate::parse_from_str(&normalized, "%b %d %Y").map_err(|_| {
        DeviceError::MalformedData(format!("unparseable firmware date code {code:?}"))
    })
}
