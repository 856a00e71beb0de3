/// Errors that can occur while validating a framed console response.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The console answered with something other than ACK (0x06).
    ///
    /// 0x15 is NAK, 0x18 is CANCEL; anything else means the response is
    /// desynchronized.
    #[error("console did not acknowledge command (got 0x{0:02X})")]
    NotAcknowledged(u8),

    /// The checksum over the payload does not match the transmitted CRC.
    #[error("CRC mismatch (transmitted 0x{expected:04X}, computed 0x{computed:04X})")]
    CrcMismatch { expected: u16, computed: u16 },

    /// The buffer is too short to hold ACK, payload and CRC.
    #[error("framed response too short ({len} bytes, need at least {min})", min = crate::codec::MIN_FRAME_SIZE)]
    TooShort { len: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
