//! Test utilities for building unified2 data in memory.
//!
//! Encoders here are the inverse of the decoders in [`crate::record`] and are
//! shared by unit tests, integration tests and benchmarks. They only use the
//! standard library so the `benchmark` feature needs no extra dependencies.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::record::{
    APP_ID_LEN, EventRecord, ExtraDataRecord, PacketRecord, RawAddr, Record, RecordType,
};

/// Event id shared by every record of [`multi_record_event_log`].
pub const FIXTURE_EVENT_ID: u32 = 1;

/// Number of records in [`multi_record_event_log`].
pub const FIXTURE_RECORD_COUNT: usize = 17;

/// Frame a body under an arbitrary (possibly unknown) record type tag.
pub fn encode_frame(tag: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// Encode a complete frame, header included.
pub fn encode_record(record: &Record) -> Vec<u8> {
    let body = match record {
        Record::Event(event) => encode_event_body(event),
        Record::Packet(packet) => encode_packet_body(packet),
        Record::ExtraData(extra) => encode_extra_data_body(extra),
    };
    encode_frame(record.record_type().tag(), &body)
}

/// Encode an event body using the layout of `event.record_type`.
pub fn encode_event_body(event: &EventRecord) -> Vec<u8> {
    let record_type = event.record_type;
    let mut out = Vec::with_capacity(EventRecord::body_len(record_type).unwrap_or(0));

    for value in [
        event.sensor_id,
        event.event_id,
        event.event_second,
        event.event_microsecond,
        event.signature_id,
        event.generator_id,
        event.signature_revision,
        event.classification_id,
        event.priority,
    ] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(event.ip_source.as_bytes());
    out.extend_from_slice(event.ip_destination.as_bytes());
    out.extend_from_slice(&event.sport_itype.to_be_bytes());
    out.extend_from_slice(&event.dport_icode.to_be_bytes());
    out.extend_from_slice(&[event.protocol, event.impact_flag, event.impact, event.blocked]);

    if record_type.has_mpls_vlan() {
        out.extend_from_slice(&event.mpls_label.unwrap_or(0).to_be_bytes());
        out.extend_from_slice(&event.vlan_id.unwrap_or(0).to_be_bytes());
        out.extend_from_slice(&[0, 0]);
    }
    if record_type.has_app_id() {
        let mut name = [0u8; APP_ID_LEN];
        let app_id = event.app_id.as_deref().unwrap_or("").as_bytes();
        let len = app_id.len().min(APP_ID_LEN);
        name[..len].copy_from_slice(&app_id[..len]);
        out.extend_from_slice(&name);
    }
    out
}

pub fn encode_packet_body(packet: &PacketRecord) -> Vec<u8> {
    let mut out = Vec::with_capacity(28 + packet.data.len());
    for value in [
        packet.sensor_id,
        packet.event_id,
        packet.event_second,
        packet.packet_second,
        packet.packet_microsecond,
        packet.link_type,
        packet.length,
    ] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&packet.data);
    out
}

pub fn encode_extra_data_body(extra: &ExtraDataRecord) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + extra.data.len());
    for value in [
        extra.event_type,
        extra.event_length,
        extra.sensor_id,
        extra.event_id,
        extra.event_second,
        extra.kind,
        extra.data_type,
        extra.data_length,
    ] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&extra.data);
    out
}

/// A plausible event of the given type.
///
/// Optional fields are filled exactly when the record type carries them, so
/// the result survives an encode/decode cycle unchanged.
pub fn sample_event(record_type: RecordType, event_id: u32) -> EventRecord {
    let (ip_source, ip_destination) = match record_type.address_width() {
        Some(16) => (
            RawAddr::V6([0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
            RawAddr::V6([0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]),
        ),
        _ => (RawAddr::V4([10, 0, 0, 1]), RawAddr::V4([192, 168, 1, 20])),
    };

    EventRecord {
        record_type,
        sensor_id: 0,
        event_id,
        event_second: 1_382_627_900,
        event_microsecond: 500_000,
        signature_id: 2_013_028,
        generator_id: 1,
        signature_revision: 4,
        classification_id: 22,
        priority: 2,
        ip_source,
        ip_destination,
        sport_itype: 49_152,
        dport_icode: 80,
        protocol: 6,
        impact_flag: 0,
        impact: 0,
        blocked: 0,
        mpls_label: record_type.has_mpls_vlan().then_some(0),
        vlan_id: record_type.has_mpls_vlan().then_some(100),
        app_id: record_type.has_app_id().then(|| "http".to_string()),
    }
}

pub fn sample_packet(event_id: u32, data: &[u8]) -> PacketRecord {
    PacketRecord {
        sensor_id: 0,
        event_id,
        event_second: 1_382_627_900,
        packet_second: 1_382_627_900,
        packet_microsecond: 500_123,
        link_type: 1,
        length: data.len() as u32,
        data: data.to_vec(),
    }
}

pub fn sample_extra_data(event_id: u32, data: &[u8]) -> ExtraDataRecord {
    ExtraDataRecord {
        event_type: 4,
        event_length: (24 + data.len()) as u32,
        sensor_id: 0,
        event_id,
        event_second: 1_382_627_900,
        kind: 9,
        data_type: 1,
        data_length: data.len() as u32 + 8,
        data: data.to_vec(),
    }
}

/// Records of one logical event: an EventV2, its packet, and fifteen extra
/// data records.
pub fn multi_record_event_records() -> Vec<Record> {
    let mut records = Vec::with_capacity(FIXTURE_RECORD_COUNT);
    records.push(Record::Event(sample_event(RecordType::EventV2, FIXTURE_EVENT_ID)));
    records.push(Record::Packet(sample_packet(FIXTURE_EVENT_ID, &[0x45; 74])));
    for kind in 0..(FIXTURE_RECORD_COUNT - 2) as u32 {
        let data = format!("extra-data-{kind}");
        let mut extra = sample_extra_data(FIXTURE_EVENT_ID, data.as_bytes());
        extra.kind = kind + 1;
        records.push(Record::ExtraData(extra));
    }
    records
}

/// The encoded form of [`multi_record_event_records`].
///
/// The first frame is 68 bytes long.
pub fn multi_record_event_log() -> Vec<u8> {
    encode_records(&multi_record_event_records())
}

pub fn encode_records(records: &[Record]) -> Vec<u8> {
    records.iter().flat_map(encode_record).collect()
}

/// Write `bytes` to `dir/name`, returning the full path.
pub fn write_spool_file(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Append `bytes` to `dir/name`, creating the file when missing.
pub fn append_spool_file(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    let mut file =
        std::fs::OpenOptions::new().create(true).append(true).open(dir.join(name))?;
    file.write_all(bytes)
}
