//! Typed unified2 records.
//!
//! A [`Frame`](crate::frame::Frame) read from disk is turned into one of the
//! closed set of [`Record`] variants by [`decode`]. The variant is chosen from
//! the frame's record type alone; the body is never inspected to guess it.
//!
//! ## Layouts
//!
//! All integers are big-endian.
//!
//! - **Event** (tags 7, 72, 104, 105, 111, 112): nine `u32` fields, two raw
//!   addresses (4 or 16 bytes), ports, protocol and impact bytes. The v2 and
//!   appid tags add an MPLS label, a VLAN id and two bytes of padding; the
//!   appid tags add a 64-byte zero-terminated application name.
//! - **Packet** (tag 2): seven `u32` fields followed by the captured bytes.
//! - **ExtraData** (tag 110): eight `u32` fields followed by the data blob.
//!
//! ## Usage Example
//!
//! ```rust
//! use unified2::frame::Frame;
//! use unified2::record::{Record, RecordType, decode};
//!
//! let mut body = vec![0u8; 28];
//! body[7] = 5; // event_id
//! body.extend_from_slice(b"captured");
//!
//! let frame = Frame::new(RecordType::Packet, body);
//! match decode(&frame).unwrap() {
//!     Record::Packet(packet) => {
//!         assert_eq!(packet.event_id, 5);
//!         assert_eq!(packet.data, b"captured");
//!     }
//!     other => panic!("unexpected record {:?}", other.record_type()),
//! }
//! ```

mod cursor;
mod event;
mod extra_data;
mod packet;
mod record_type;

pub use event::{APP_ID_LEN, EventRecord, RawAddr};
pub use extra_data::{EXTRA_DATA_HEADER_LEN, ExtraDataRecord};
pub use packet::{PACKET_HEADER_LEN, PacketRecord};
pub use record_type::RecordType;

use serde::{Deserialize, Serialize};

use crate::DecodeError;
use crate::frame::Frame;

/// A decoded unified2 record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Event(EventRecord),
    Packet(PacketRecord),
    ExtraData(ExtraDataRecord),
}

/// Decode a complete frame into a typed record.
pub fn decode(frame: &Frame) -> Result<Record, DecodeError> {
    Record::decode(frame.record_type, &frame.body)
}

impl Record {
    /// Decode a body according to its record type.
    pub fn decode(record_type: RecordType, body: &[u8]) -> Result<Self, DecodeError> {
        match record_type {
            RecordType::Event
            | RecordType::EventIp6
            | RecordType::EventV2
            | RecordType::EventV2Ip6
            | RecordType::EventAppId
            | RecordType::EventAppIdIp6 => EventRecord::decode(record_type, body).map(Record::Event),
            RecordType::Packet => PacketRecord::decode(body).map(Record::Packet),
            RecordType::ExtraData => ExtraDataRecord::decode(body).map(Record::ExtraData),
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Event(event) => event.record_type,
            Record::Packet(_) => RecordType::Packet,
            Record::ExtraData(_) => RecordType::ExtraData,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Record::Event(_))
    }

    pub fn as_event(&self) -> Option<&EventRecord> {
        match self {
            Record::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn event_id(&self) -> u32 {
        match self {
            Record::Event(event) => event.event_id,
            Record::Packet(packet) => packet.event_id,
            Record::ExtraData(extra) => extra.event_id,
        }
    }

    pub fn sensor_id(&self) -> u32 {
        match self {
            Record::Event(event) => event.sensor_id,
            Record::Packet(packet) => packet.sensor_id,
            Record::ExtraData(extra) => extra.sensor_id,
        }
    }
}

impl AsRef<Record> for Record {
    fn as_ref(&self) -> &Record {
        self
    }
}
