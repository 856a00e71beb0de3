use std::time::Duration;

use vantage_frame::FrameError;
use vantage_schema::SchemaError;
use vantage_transport::TransportError;

use crate::model::Model;

/// Errors surfaced by station operations and the realtime container.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Operation attempted while the connection is closed.
    #[error("connection to console is closed")]
    ClosedConnection,

    /// The console refused or garbled a command (NAK, missing ACK, failed
    /// wake-up, unexpected echo).
    #[error("failed to send command: {0}")]
    FailedToSendCommand(String),

    /// A response arrived but its contents are unusable (CRC mismatch,
    /// wrong packet type, unparseable text).
    #[error("malformed response: {0}")]
    MalformedData(String),

    /// A record schema failed against the payload.
    #[error("parser error: {0}")]
    Parser(#[from] SchemaError),

    /// The serial line itself failed.
    #[error("serial connection error: {0}")]
    SerialConnection(#[source] TransportError),

    /// A station is already connected on this transport.
    #[error("device is still connected")]
    DeviceStillConnected,

    /// The operation is not available on this console model.
    #[error("{operation} is not supported on {model}")]
    UnsupportedDeviceModel {
        model: Model,
        operation: &'static str,
    },

    /// No serial device path was configured.
    #[error("no device path configured")]
    MissingDevicePath,

    /// The console did not answer within the deadline.
    #[error("console did not answer within {0:?}")]
    Timeout(Duration),
}

impl From<TransportError> for DeviceError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ClosedConnection => DeviceError::ClosedConnection,
            TransportError::Timeout(deadline) => DeviceError::Timeout(deadline),
            TransportError::MissingDevicePath => DeviceError::MissingDevicePath,
            err @ (TransportError::FailedToWrite(_) | TransportError::SerialConnection(_)) => {
                DeviceError::SerialConnection(err)
            }
        }
    }
}

impl From<FrameError> for DeviceError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::NotAcknowledged(byte) => {
                DeviceError::FailedToSendCommand(format!("console answered 0x{byte:02X}"))
            }
            err @ (FrameError::CrcMismatch { .. } | FrameError::TooShort { .. }) => {
                DeviceError::MalformedData(err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
