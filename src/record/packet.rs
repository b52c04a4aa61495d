//! Packet records: a captured packet belonging to an event.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RecordType;
use super::cursor::BodyCursor;
use crate::DecodeError;

/// Length of a packet record body before the captured bytes.
pub const PACKET_HEADER_LEN: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub sensor_id: u32,
    pub event_id: u32,
    pub event_second: u32,
    pub packet_second: u32,
    pub packet_microsecond: u32,
    pub link_type: u32,
    /// Captured length as declared by the producer.
    pub length: u32,
    /// Captured bytes: everything in the body after the fixed fields.
    pub data: Vec<u8>,
}

impl PacketRecord {
    /// Decode a packet body.
    ///
    /// The captured data is sized by the bytes actually present in the body.
    /// A disagreeing `length` field is kept as-is and only logged.
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut cur = BodyCursor::new(RecordType::Packet, body);

        let sensor_id = cur.u32("sensor_id")?;
        let event_id = cur.u32("event_id")?;
        let event_second = cur.u32("event_second")?;
        let packet_second = cur.u32("packet_second")?;
        let packet_microsecond = cur.u32("packet_microsecond")?;
        let link_type = cur.u32("link_type")?;
        let length = cur.u32("length")?;
        let data = cur.rest().to_vec();

        let record = Self {
            sensor_id,
            event_id,
            event_second,
            packet_second,
            packet_microsecond,
            link_type,
            length,
            data,
        };
        if !record.declared_length_matches() {
            debug!(
                event_id,
                declared = length,
                actual = record.data.len(),
                "packet length field disagrees with captured bytes"
            );
        }
        Ok(record)
    }

    /// Whether the declared `length` equals the number of captured bytes.
    pub fn declared_length_matches(&self) -> bool {
        self.length as usize == self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::encode_packet_body;

    fn packet(data: Vec<u8>) -> PacketRecord {
        PacketRecord {
            sensor_id: 1,
            event_id: 99,
            event_second: 1_382_627_900,
            packet_second: 1_382_627_900,
            packet_microsecond: 123,
            link_type: 1,
            length: data.len() as u32,
            data,
        }
    }

    #[test]
    fn minimal_packet_has_no_data() {
        let body = encode_packet_body(&packet(Vec::new()));
        assert_eq!(body.len(), PACKET_HEADER_LEN);

        let decoded = PacketRecord::decode(&body).unwrap();
        assert!(decoded.data.is_empty());
        assert!(decoded.declared_length_matches());
    }

    #[test]
    fn data_is_sized_by_remaining_body_bytes() {
        let mut record = packet(vec![0xAA; 1514]);
        record.length = 60;
        let body = encode_packet_body(&record);

        let decoded = PacketRecord::decode(&body).unwrap();
        assert_eq!(decoded.data.len(), 1514);
        assert_eq!(decoded.length, 60);
        assert!(!decoded.declared_length_matches());
    }

    #[test]
    fn short_fixed_header_is_rejected() {
        let body = encode_packet_body(&packet(Vec::new()));
        let err = PacketRecord::decode(&body[..26]).unwrap_err();

        match err {
            DecodeError::Truncated { field, needed, available, .. } => {
                assert_eq!(field, "length");
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
