use crate::crc;
use crate::error::{FrameError, Result};

/// Positive acknowledgement preceding every CRC-framed response.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement.
pub const NAK: u8 = 0x15;
/// The console aborted the command.
pub const CANCEL: u8 = 0x18;
/// Line feed.
pub const LF: u8 = 0x0A;
/// Carriage return.
pub const CR: u8 = 0x0D;

/// The byte the host sends to wake a sleeping console.
pub const WAKE_COMMAND: &[u8] = b"\n";
/// The exact two-byte reply of an awake console.
pub const WAKE_RESPONSE: [u8; 2] = [LF, CR];

/// Size of the trailing checksum.
pub const CRC_SIZE: usize = 2;
/// Smallest possible frame: ACK + one payload byte + CRC.
pub const MIN_FRAME_SIZE: usize = 1 + 1 + CRC_SIZE;

/// Split a framed response into its payload, validating ACK and CRC.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────────────┬───────────────────┐
/// │ ACK (1B)  │ Payload          │ CRC16 (2B, BE)    │
/// │ 0x06      │ (N bytes)        │ over payload only │
/// └───────────┴──────────────────┴───────────────────┘
/// ```
///
/// Returns a borrow of the payload bytes; callers hand it to the record
/// parser with positions relative to offset 0.
pub fn decode_frame(buf: &[u8]) -> Result<&[u8]> {
    if buf.len() < MIN_FRAME_SIZE {
        return Err(FrameError::TooShort { len: buf.len() });
    }
    if buf[0] != ACK {
        return Err(FrameError::NotAcknowledged(buf[0]));
    }

    let payload = &buf[1..buf.len() - CRC_SIZE];
    let expected = u16::from_be_bytes([buf[buf.len() - 2], buf[buf.len() - 1]]);
    let computed = crc::compute(payload);
    if computed != expected {
        return Err(FrameError::CrcMismatch { expected, computed });
    }

    Ok(payload)
}

/// Frame a payload the way the console would transmit it.
///
/// The driver never sends framed data to a console; this exists for test
/// harnesses that script console replies.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len() + CRC_SIZE);
    out.push(ACK);
    out.extend_from_slice(payload);
    out.extend_from_slice(&crc::compute(payload).to_be_bytes());
    out
}
