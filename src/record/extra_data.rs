//! Extra data records: metadata attached to an event.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RecordType;
use super::cursor::BodyCursor;
use crate::DecodeError;

/// Length of an extra data record body before the data blob.
pub const EXTRA_DATA_HEADER_LEN: usize = 32;

// type, data_type and data_length are counted in data_length
const DATA_LENGTH_OVERHEAD: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraDataRecord {
    pub event_type: u32,
    pub event_length: u32,
    pub sensor_id: u32,
    pub event_id: u32,
    pub event_second: u32,
    #[serde(rename = "type")]
    pub kind: u32,
    pub data_type: u32,
    pub data_length: u32,
    /// Data blob: everything in the body after the fixed fields.
    pub data: Vec<u8>,
}

impl ExtraDataRecord {
    /// Decode an extra data body.
    ///
    /// The blob is sized by the bytes actually present in the body, not by
    /// `data_length`.
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let mut cur = BodyCursor::new(RecordType::ExtraData, body);

        let event_type = cur.u32("event_type")?;
        let event_length = cur.u32("event_length")?;
        let sensor_id = cur.u32("sensor_id")?;
        let event_id = cur.u32("event_id")?;
        let event_second = cur.u32("event_second")?;
        let kind = cur.u32("type")?;
        let data_type = cur.u32("data_type")?;
        let data_length = cur.u32("data_length")?;
        let data = cur.rest().to_vec();

        let record = Self {
            event_type,
            event_length,
            sensor_id,
            event_id,
            event_second,
            kind,
            data_type,
            data_length,
            data,
        };
        if record.declared_data_len() != record.data.len() {
            debug!(
                event_id,
                declared = record.declared_data_len(),
                actual = record.data.len(),
                "extra data length field disagrees with blob size"
            );
        }
        Ok(record)
    }

    /// Blob size implied by `data_length`, which also counts the type,
    /// data type and length fields themselves.
    pub fn declared_data_len(&self) -> usize {
        self.data_length.saturating_sub(DATA_LENGTH_OVERHEAD) as usize
    }

    /// The blob as text, when it is valid UTF-8.
    pub fn data_as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}
