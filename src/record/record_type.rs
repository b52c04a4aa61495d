//! Unified2 record type tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of record types understood by this crate.
///
/// The discriminants are the on-disk tag values; they are defined by the
/// unified2 format and are not implementation choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum RecordType {
    Packet = 2,
    Event = 7,
    EventIp6 = 72,
    EventV2 = 104,
    EventV2Ip6 = 105,
    ExtraData = 110,
    EventAppId = 111,
    EventAppIdIp6 = 112,
}

impl RecordType {
    /// Every known record type, in tag order.
    pub const ALL: [RecordType; 8] = [
        RecordType::Packet,
        RecordType::Event,
        RecordType::EventIp6,
        RecordType::EventV2,
        RecordType::EventV2Ip6,
        RecordType::ExtraData,
        RecordType::EventAppId,
        RecordType::EventAppIdIp6,
    ];

    /// Look up a record type by its on-disk tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            2 => Some(RecordType::Packet),
            7 => Some(RecordType::Event),
            72 => Some(RecordType::EventIp6),
            104 => Some(RecordType::EventV2),
            105 => Some(RecordType::EventV2Ip6),
            110 => Some(RecordType::ExtraData),
            111 => Some(RecordType::EventAppId),
            112 => Some(RecordType::EventAppIdIp6),
            _ => None,
        }
    }

    /// On-disk tag value.
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Whether records of this type anchor a logical event.
    pub fn is_event(self) -> bool {
        !matches!(self, RecordType::Packet | RecordType::ExtraData)
    }

    /// Width in bytes of the source/destination addresses of an event type.
    ///
    /// Returns `None` for non-event types.
    pub fn address_width(self) -> Option<usize> {
        match self {
            RecordType::Event | RecordType::EventV2 | RecordType::EventAppId => Some(4),
            RecordType::EventIp6 | RecordType::EventV2Ip6 | RecordType::EventAppIdIp6 => Some(16),
            RecordType::Packet | RecordType::ExtraData => None,
        }
    }

    /// Whether the event layout carries the MPLS label and VLAN id fields.
    pub fn has_mpls_vlan(self) -> bool {
        matches!(
            self,
            RecordType::EventV2
                | RecordType::EventV2Ip6
                | RecordType::EventAppId
                | RecordType::EventAppIdIp6
        )
    }

    /// Whether the event layout ends with the application name field.
    pub fn has_app_id(self) -> bool {
        matches!(self, RecordType::EventAppId | RecordType::EventAppIdIp6)
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            RecordType::Packet => "Packet",
            RecordType::Event => "Event",
            RecordType::EventIp6 => "EventIp6",
            RecordType::EventV2 => "EventV2",
            RecordType::EventV2Ip6 => "EventV2Ip6",
            RecordType::ExtraData => "ExtraData",
            RecordType::EventAppId => "EventAppId",
            RecordType::EventAppIdIp6 => "EventAppIdIp6",
        }
    }
}

impl TryFrom<u32> for RecordType {
    type Error = u32;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        RecordType::from_tag(tag).ok_or(tag)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.tag())
    }
}
