use std::time::{Duration, Instant};

use crate::error::{Result, TransportError};

/// How often [`ByteTransport::wait_for_buffer`] re-checks the receive buffer.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A half-duplex byte stream to a console.
///
/// The transport is single-owner: exactly one device drives it, and
/// concurrent writes are undefined. Implementations buffer received bytes
/// until the owner drains them with [`read_available`](Self::read_available).
pub trait ByteTransport: Send {
    /// Open the transport. Opening an already-open transport is a no-op.
    fn open(&mut self) -> Result<()>;

    /// Close the transport. Closing a closed transport is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Whether the transport is currently open.
    fn is_open(&self) -> bool;

    /// Write a byte span to the device.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Drain whatever bytes are currently buffered (possibly none).
    fn read_available(&mut self) -> Result<Vec<u8>>;

    /// Block until at least one byte is buffered, then drain it.
    ///
    /// Fails with [`TransportError::Timeout`] when nothing arrives before
    /// the deadline, and with [`TransportError::ClosedConnection`] when the
    /// transport is closed while waiting.
    fn wait_for_buffer(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_open() {
                return Err(TransportError::ClosedConnection);
            }
            let chunk = self.read_available()?;
            if !chunk.is_empty() {
                return Ok(chunk);
            }
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout(timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        (**self).read_available()
    }

    fn wait_for_buffer(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        (**self).wait_for_buffer(timeout)
    }
}
