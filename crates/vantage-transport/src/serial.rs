use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::ByteTransport;

/// Serial line configuration for a console link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM4`.
    pub path: String,
    /// Baud rate. Consoles default to 19200.
    pub baud_rate: u32,
}

impl SerialConfig {
    /// Config for a path at the console default baud rate.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
        }
    }

    /// The baud rate Vantage consoles ship with.
    pub const DEFAULT_BAUD_RATE: u32 = 19_200;
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// [`ByteTransport`] over a serial port.
///
/// The port is opened 8N1 with a short blocking-read timeout; actual read
/// deadlines are enforced by [`ByteTransport::wait_for_buffer`], which polls
/// the OS receive buffer instead of blocking in the driver.
pub struct SerialLink {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Blocking-read timeout applied to the OS port handle.
    const PORT_TIMEOUT: Duration = Duration::from_millis(50);

    /// Create a closed link for a configuration.
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    /// The configuration this link was created with.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl ByteTransport for SerialLink {
    fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }
        if self.config.path.is_empty() {
            return Err(TransportError::MissingDevicePath);
        }

        let port = serialport::new(&self.config.path, self.config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Self::PORT_TIMEOUT)
            .open()?;

        info!(
            path = %self.config.path,
            baud = self.config.baud_rate,
            "serial port opened"
        );
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            info!(path = %self.config.path, "serial port closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(TransportError::ClosedConnection)?;
        port.write_all(bytes)
            .and_then(|()| port.flush())
            .map_err(TransportError::FailedToWrite)
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        let port = self.port.as_mut().ok_or(TransportError::ClosedConnection)?;
        let pending = port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; pending];
        port.read_exact(&mut buf).map_err(|e| {
            TransportError::SerialConnection(serialport::Error::new(
                serialport::ErrorKind::Io(e.kind()),
                &e.to_string(),
            ))
        })?;
        debug!(bytes = buf.len(), "drained receive buffer");
        Ok(buf)
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
