//! Event records: the alert that anchors a logical event.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::trace;

use super::RecordType;
use super::cursor::BodyCursor;
use crate::DecodeError;

/// Size of the fixed application name field of appid events.
pub const APP_ID_LEN: usize = 64;

// sensor_id .. priority: nine u32 fields
const EVENT_HEAD_LEN: usize = 36;
// sport, dport, protocol, impact_flag, impact, blocked
const EVENT_TAIL_LEN: usize = 8;
// mpls_label, vlan_id, pad
const EVENT_V2_LEN: usize = 8;

/// Raw source or destination address as stored on disk.
///
/// The width comes from the record type, never from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawAddr {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl RawAddr {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RawAddr::V4(bytes) => bytes,
            RawAddr::V6(bytes) => bytes,
        }
    }

    pub fn to_ip_addr(&self) -> IpAddr {
        match *self {
            RawAddr::V4(bytes) => IpAddr::V4(Ipv4Addr::from(bytes)),
            RawAddr::V6(bytes) => IpAddr::V6(Ipv6Addr::from(bytes)),
        }
    }
}

/// Decoded event record, covering every event tag.
///
/// IPv4 and IPv6 variants differ only in the width of [`RawAddr`]. The
/// optional fields are present exactly when the record type carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub record_type: RecordType,
    pub sensor_id: u32,
    pub event_id: u32,
    pub event_second: u32,
    pub event_microsecond: u32,
    pub signature_id: u32,
    pub generator_id: u32,
    pub signature_revision: u32,
    pub classification_id: u32,
    pub priority: u32,
    pub ip_source: RawAddr,
    pub ip_destination: RawAddr,
    pub sport_itype: u16,
    pub dport_icode: u16,
    pub protocol: u8,
    pub impact_flag: u8,
    pub impact: u8,
    pub blocked: u8,
    pub mpls_label: Option<u32>,
    pub vlan_id: Option<u16>,
    pub app_id: Option<String>,
}

impl EventRecord {
    /// Full body size of an event of the given type.
    ///
    /// Appid events may be shorter, down to the size without the name field.
    /// Returns `None` for non-event types.
    pub fn body_len(record_type: RecordType) -> Option<usize> {
        let width = record_type.address_width()?;
        let mut len = EVENT_HEAD_LEN + 2 * width + EVENT_TAIL_LEN;
        if record_type.has_mpls_vlan() {
            len += EVENT_V2_LEN;
        }
        if record_type.has_app_id() {
            len += APP_ID_LEN;
        }
        Some(len)
    }

    /// Decode an event body laid out according to `record_type`.
    ///
    /// Event bodies have a fixed size per type, so both short and long bodies
    /// are rejected. The one exception is the trailing application name of
    /// appid events, which may hold fewer than [`APP_ID_LEN`] bytes or none.
    pub fn decode(record_type: RecordType, body: &[u8]) -> Result<Self, DecodeError> {
        let mut cur = BodyCursor::new(record_type, body);

        let sensor_id = cur.u32("sensor_id")?;
        let event_id = cur.u32("event_id")?;
        let event_second = cur.u32("event_second")?;
        let event_microsecond = cur.u32("event_microsecond")?;
        let signature_id = cur.u32("signature_id")?;
        let generator_id = cur.u32("generator_id")?;
        let signature_revision = cur.u32("signature_revision")?;
        let classification_id = cur.u32("classification_id")?;
        let priority = cur.u32("priority")?;

        let (ip_source, ip_destination) = match record_type.address_width() {
            Some(16) => (
                RawAddr::V6(cur.array("ip_source")?),
                RawAddr::V6(cur.array("ip_destination")?),
            ),
            _ => (RawAddr::V4(cur.array("ip_source")?), RawAddr::V4(cur.array("ip_destination")?)),
        };

        let sport_itype = cur.u16("sport_itype")?;
        let dport_icode = cur.u16("dport_icode")?;
        let protocol = cur.u8("protocol")?;
        let impact_flag = cur.u8("impact_flag")?;
        let impact = cur.u8("impact")?;
        let blocked = cur.u8("blocked")?;

        let (mpls_label, vlan_id) = if record_type.has_mpls_vlan() {
            let mpls_label = cur.u32("mpls_label")?;
            let vlan_id = cur.u16("vlan_id")?;
            cur.u16("pad2")?;
            (Some(mpls_label), Some(vlan_id))
        } else {
            (None, None)
        };

        // The name field may be cut short or missing; only bytes past it are an error.
        let app_id = if record_type.has_app_id() && cur.remaining() > 0 {
            let len = cur.remaining().min(APP_ID_LEN);
            Some(null_terminated(cur.bytes("app_id", len)?))
        } else {
            None
        };

        cur.finish()?;

        trace!(%record_type, event_id, signature_id, "decoded event");

        Ok(Self {
            record_type,
            sensor_id,
            event_id,
            event_second,
            event_microsecond,
            signature_id,
            generator_id,
            signature_revision,
            classification_id,
            priority,
            ip_source,
            ip_destination,
            sport_itype,
            dport_icode,
            protocol,
            impact_flag,
            impact,
            blocked,
            mpls_label,
            vlan_id,
            app_id,
        })
    }

    /// Event timestamp as wall-clock time.
    pub fn event_time(&self) -> SystemTime {
        UNIX_EPOCH
            + Duration::from_secs(self.event_second as u64)
            + Duration::from_micros(self.event_microsecond as u64)
    }
}

fn null_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
