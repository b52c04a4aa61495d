//! Benchmarks for unified2 frame reading and record decoding
//!
//! Covers the per-record cost of:
//! - Framing only (`read_frame`) versus framing plus decoding
//! - Decoding each record layout from an in-memory body
//! - Grouping decoded records into logical events
//!
//! Platform: Cross-platform (fixtures are generated in memory, CI-safe)

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::io::Cursor;
use unified2::test_utils::{
    encode_records, multi_record_event_records, sample_event, sample_extra_data, sample_packet,
};
use unified2::{EventAggregator, Frame, Record, RecordReader, RecordType, decode, read_frame};

/// A log of `events` logical events of 17 records each
fn event_log(events: usize) -> Vec<u8> {
    let records: Vec<Record> =
        (0..events).flat_map(|_| multi_record_event_records()).collect();
    encode_records(&records)
}

fn bench_reading(c: &mut Criterion) {
    let data = event_log(100);

    let mut group = c.benchmark_group("read_log");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("frames_only", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(data.as_slice()));
            let mut count = 0usize;
            while read_frame(&mut cursor).is_ok() {
                count += 1;
            }
            black_box(count)
        })
    });

    group.bench_function("decoded_records", |b| {
        b.iter(|| {
            let reader = RecordReader::from_reader(Cursor::new(black_box(data.as_slice())))
                .expect("cursor position is always available");
            black_box(reader.filter_map(Result::ok).count())
        })
    });

    group.finish();
}

fn bench_decode_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_layout");

    let samples = [
        ("event", Record::Event(sample_event(RecordType::Event, 1))),
        ("event_v2_ip6", Record::Event(sample_event(RecordType::EventV2Ip6, 1))),
        ("event_appid_ip6", Record::Event(sample_event(RecordType::EventAppIdIp6, 1))),
        ("packet_1514", Record::Packet(sample_packet(1, &[0x45; 1514]))),
        ("extra_data", Record::ExtraData(sample_extra_data(1, b"/index.html"))),
    ];

    for (name, record) in samples {
        let encoded = encode_records(std::slice::from_ref(&record));
        let frame = Frame::new(record.record_type(), encoded[8..].to_vec());
        group.throughput(Throughput::Bytes(frame.body.len() as u64));
        group.bench_function(name, |b| b.iter(|| black_box(decode(black_box(&frame)))));
    }

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let records: Vec<Record> = (0..100).flat_map(|_| multi_record_event_records()).collect();

    c.bench_function("aggregate_100_events", |b| {
        b.iter(|| {
            let mut aggregator = EventAggregator::new();
            let mut groups = 0usize;
            for record in records.iter().cloned() {
                if aggregator.add(record).is_some() {
                    groups += 1;
                }
            }
            groups += usize::from(!aggregator.flush().is_empty());
            black_box(groups)
        })
    });
}

criterion_group!(benches, bench_reading, bench_decode_layouts, bench_aggregation);
criterion_main!(benches);
