use std::time::Duration;

/// Errors that can occur on the byte transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Operation attempted while the transport is not open.
    #[error("connection to the console is closed")]
    ClosedConnection,

    /// Writing to the device failed at the I/O layer.
    #[error("failed to write to device: {0}")]
    FailedToWrite(#[source] std::io::Error),

    /// No bytes arrived before the deadline.
    #[error("no data received within {0:?}")]
    Timeout(Duration),

    /// The configuration does not name a device path.
    #[error("no device path configured")]
    MissingDevicePath,

    /// The underlying serial port failed to open or operate.
    #[error("serial connection error: {0}")]
    SerialConnection(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
