//! End-to-end checks through the public API: raw bytes on disk, a spool
//! reader, a resumed reader and the aggregator.

use anyhow::{Context, Result, ensure};
use std::path::Path;
use unified2::{EventAggregator, Record, RecordType, SpoolReader, Unified2};

fn frame(tag: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// Event (IPv4, tag 7): nine u32, two addresses, ports, four bytes.
fn event(event_id: u32, signature_id: u32) -> Vec<u8> {
    let mut body = Vec::new();
    for value in [0, event_id, 1_382_627_900, 0, signature_id, 1, 1, 3, 2] {
        body.extend_from_slice(&u32::to_be_bytes(value));
    }
    body.extend_from_slice(&[10, 0, 0, 1, 10, 0, 0, 2]);
    body.extend_from_slice(&1024u16.to_be_bytes());
    body.extend_from_slice(&443u16.to_be_bytes());
    body.extend_from_slice(&[6, 0, 0, 0]);
    frame(7, &body)
}

fn packet(event_id: u32, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for value in [0, event_id, 1_382_627_900, 1_382_627_900, 0, 1, data.len() as u32] {
        body.extend_from_slice(&u32::to_be_bytes(value));
    }
    body.extend_from_slice(data);
    frame(2, &body)
}

fn write(dir: &Path, name: &str, frames: &[Vec<u8>]) -> Result<()> {
    std::fs::write(dir.join(name), frames.concat()).with_context(|| format!("writing {name}"))
}

fn drain(reader: &mut SpoolReader) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    while let Some(record) = reader.next_record()? {
        records.push(record);
    }
    Ok(records)
}

#[test]
fn spool_resume_is_byte_identical_to_uninterrupted_read() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "snort.log.100", &[event(1, 1000), packet(1, b"GET /"), packet(1, b"HTTP")])?;
    write(dir.path(), "snort.log.200", &[event(2, 2000), packet(2, b"\x00\x01")])?;

    let mut uninterrupted = Unified2::spool(dir.path(), "snort.log");
    let all = drain(&mut uninterrupted)?;
    ensure!(all.len() == 5, "read {} records", all.len());

    // Stop after every record in turn and resume from the saved position.
    for stop in 1..all.len() {
        let mut first = Unified2::spool(dir.path(), "snort.log");
        let mut seen = Vec::new();
        for _ in 0..stop {
            seen.push(first.next_record()?.context("record before stop")?);
        }
        let saved = first.offset().clone();
        drop(first);

        let mut resumed = Unified2::resume(dir.path(), "snort.log", saved)?;
        seen.extend(drain(&mut resumed)?);
        ensure!(seen == all, "resume after {stop} records diverged");
    }
    Ok(())
}

#[test]
fn spool_records_group_into_logical_events() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "snort.log.1", &[event(1, 1000), packet(1, b"a")])?;
    write(dir.path(), "snort.log.2", &[packet(1, b"b"), event(2, 2000)])?;

    let mut reader = Unified2::spool(dir.path(), "snort.log");
    let mut aggregator = EventAggregator::new();
    let mut events = Vec::new();
    while let Some(record) = reader.next_record()? {
        events.extend(aggregator.add(record));
    }
    events.push(aggregator.flush());

    ensure!(events.len() == 2);
    ensure!(events[0].event().map(|e| e.signature_id) == Some(1000));
    let payloads: Vec<Vec<u8>> = events[0].packets().map(|p| p.data.clone()).collect();
    ensure!(payloads == vec![b"a".to_vec(), b"b".to_vec()]);
    ensure!(events[1].len() == 1);
    Ok(())
}

#[test]
fn single_file_reader_reports_offsets() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "alert", &[event(9, 1), packet(9, b"payload")])?;

    let mut reader = Unified2::open(dir.path().join("alert"))?;
    let first = reader.next_record()?.context("event")?;
    ensure!(first.record_type() == RecordType::Event);
    ensure!(reader.offset() == 8 + 52);

    let second = reader.next_record()?.context("packet")?;
    ensure!(second.event_id() == 9);
    ensure!(reader.next_record()?.is_none());
    ensure!(reader.records_read() == 2);
    Ok(())
}
