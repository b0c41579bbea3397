//! MLLP framing
//!
//! A frame on the wire is `0x0B <payload> 0x1C [0x0D]`. [`scan_frame`] is the
//! pure scan step; [`MllpCodec`] drives it from a `tokio_util` `Framed`
//! transport, so one socket read may yield zero, one or many frames.

use crate::domain::MllpError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Start-of-block byte (VT)
pub const START_BLOCK: u8 = 0x0B;
/// End-of-block byte (FS)
pub const END_BLOCK: u8 = 0x1C;
/// Carriage return following the end-of-block byte
pub const CARRIAGE_RETURN: u8 = 0x0D;

/// Default frame size limit
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1_000_000;

/// Result of scanning a buffer for the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameScan {
    /// No start byte anywhere in the buffer
    NoStart,
    /// Start byte at `start`, no end byte after it yet
    Partial { start: usize },
    /// Payload is `buf[start + 1..end]`; `consumed` bytes can be dropped
    Complete {
        start: usize,
        end: usize,
        consumed: usize,
    },
}

/// Locate the next frame in `buf`
///
/// # Example
///
/// ```
/// use hl7bridge::adapters::mllp::codec::{scan_frame, FrameScan};
///
/// let scan = scan_frame(b"\x0bMSH|^~\\&\x1c\r");
/// assert_eq!(scan, FrameScan::Complete { start: 0, end: 9, consumed: 11 });
/// ```
pub fn scan_frame(buf: &[u8]) -> FrameScan {
    let Some(start) = buf.iter().position(|&b| b == START_BLOCK) else {
        return FrameScan::NoStart;
    };
    let Some(offset) = buf[start + 1..].iter().position(|&b| b == END_BLOCK) else {
        return FrameScan::Partial { start };
    };
    let end = start + 1 + offset;
    let consumed = if buf.get(end + 1) == Some(&CARRIAGE_RETURN) {
        end + 2
    } else {
        end + 1
    };
    FrameScan::Complete {
        start,
        end,
        consumed,
    }
}

/// Wrap a payload in MLLP framing
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(START_BLOCK);
    out.extend_from_slice(payload);
    out.push(END_BLOCK);
    out.push(CARRIAGE_RETURN);
    out
}

/// Payload of the first complete frame in `raw`, if any
pub fn payload(raw: &[u8]) -> Option<&[u8]> {
    match scan_frame(raw) {
        FrameScan::Complete { start, end, .. } => Some(&raw[start + 1..end]),
        _ => None,
    }
}

/// `tokio_util` codec yielding frame payloads
#[derive(Debug, Clone)]
pub struct MllpCodec {
    max_frame_bytes: usize,
}

impl MllpCodec {
    /// Codec with the default size limit
    pub fn new() -> Self {
        Self::with_max_frame_bytes(DEFAULT_MAX_FRAME_BYTES)
    }

    /// Codec rejecting payloads longer than `max_frame_bytes`
    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }

    /// Configured size limit
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }
}

impl Default for MllpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MllpCodec {
    type Item = BytesMut;
    type Error = MllpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match scan_frame(src) {
            FrameScan::NoStart => {
                // Nothing here can start a frame
                src.clear();
                Ok(None)
            }
            FrameScan::Partial { start } => {
                src.advance(start);
                // Start byte plus payload so far
                if src.len() > self.max_frame_bytes + 1 {
                    return Err(MllpError::FrameTooLarge {
                        limit: self.max_frame_bytes,
                    });
                }
                Ok(None)
            }
            FrameScan::Complete {
                start,
                end,
                consumed,
            } => {
                let mut frame = src.split_to(consumed);
                frame.truncate(end);
                frame.advance(start + 1);
                if frame.len() > self.max_frame_bytes {
                    return Err(MllpError::FrameTooLarge {
                        limit: self.max_frame_bytes,
                    });
                }
                Ok(Some(frame))
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            Ok(None)
        } else {
            src.clear();
            Err(MllpError::UnexpectedEof)
        }
    }
}

impl<T: AsRef<[u8]>> Encoder<T> for MllpCodec {
    type Error = MllpError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = item.as_ref();
        dst.reserve(payload.len() + 3);
        dst.put_u8(START_BLOCK);
        dst.put_slice(payload);
        dst.put_u8(END_BLOCK);
        dst.put_u8(CARRIAGE_RETURN);
        Ok(())
    }
}
