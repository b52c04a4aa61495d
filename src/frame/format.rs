//! Unified2 frame layout.
//!
//! Every record on disk is a frame:
//!
//! 1. **Header** (8 bytes) - big-endian `u32` record type, big-endian `u32`
//!    body length
//! 2. **Body** - exactly `length` bytes, laid out according to the record type

use crate::record::RecordType;

/// Size of the fixed frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 8;

/// Largest body length accepted before any bytes are allocated for it.
///
/// Real records are bounded by the producer's snaplen plus a few dozen bytes
/// of fixed fields; anything near this limit means the header is garbage.
pub const MAX_RECORD_LEN: u32 = 16 * 1024 * 1024;

/// Undecoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub record_type: u32,
    pub length: u32,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8; FRAME_HEADER_LEN]) -> Self {
        Self {
            record_type: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// One complete frame: a known record type and its full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub record_type: RecordType,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn new(record_type: RecordType, body: Vec<u8>) -> Self {
        Self { record_type, body }
    }

    /// Bytes this frame occupies on disk, header included.
    pub fn encoded_len(&self) -> u64 {
        (FRAME_HEADER_LEN + self.body.len()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_big_endian() {
        let header = FrameHeader::parse(&[0, 0, 0, 104, 0, 0, 0, 60]);
        assert_eq!(header, FrameHeader { record_type: 104, length: 60 });

        let header = FrameHeader::parse(&[0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(header.record_type, 0x0102_0304);
        assert_eq!(header.length, u32::MAX);
    }

    #[test]
    fn encoded_len_includes_header() {
        let frame = Frame::new(RecordType::EventV2, vec![0; 60]);
        assert_eq!(frame.encoded_len(), 68);
    }
}
