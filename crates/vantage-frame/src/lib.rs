//! CRC16 checksums and response framing for the Davis Vantage serial protocol.
//!
//! Every data response a Vantage console sends is framed as:
//! - A 1-byte acknowledgement (0x06)
//! - The payload
//! - A big-endian CRC16-CCITT checksum over the payload
//!
//! This crate validates and splits those frames; it knows nothing about the
//! payload contents.

pub mod codec;
pub mod crc;
pub mod error;

pub use codec::{
    decode_frame, encode_frame, ACK, CANCEL, CRC_SIZE, CR, LF, MIN_FRAME_SIZE, NAK, WAKE_COMMAND,
    WAKE_RESPONSE,
};
pub use error::{FrameError, Result};
