//! Grouping of consecutive records into logical events.
//!
//! A producer writes one Event record followed by any number of Packet and
//! ExtraData records that belong to it. The next Event record is the only
//! signal that the previous event is complete, so the aggregator holds
//! records back until it sees one (or until the caller flushes).
//!
//! ```rust
//! use unified2::{EventAggregator, Record};
//!
//! fn group(records: Vec<Record>) -> Vec<Vec<Record>> {
//!     let mut aggregator = EventAggregator::new();
//!     let mut groups = Vec::new();
//!     for record in records {
//!         if let Some(event) = aggregator.add(record) {
//!             groups.push(event.into_records());
//!         }
//!     }
//!     let last = aggregator.flush();
//!     if !last.is_empty() {
//!         groups.push(last.into_records());
//!     }
//!     groups
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::record::{EventRecord, ExtraDataRecord, PacketRecord, Record};

/// How records that precede the first Event are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    /// Buffer them; the first group may then lack an Event record.
    #[default]
    Lenient,
    /// Discard them, so every group starts with an Event record.
    Strict,
}

/// One event record together with the records that followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalEvent<T = Record> {
    records: Vec<T>,
}

impl<T: AsRef<Record>> LogicalEvent<T> {
    /// The anchoring Event record, if the group starts with one.
    pub fn event(&self) -> Option<&EventRecord> {
        self.records.first().and_then(|r| r.as_ref().as_event())
    }

    pub fn packets(&self) -> impl Iterator<Item = &PacketRecord> {
        self.records.iter().filter_map(|r| match r.as_ref() {
            Record::Packet(packet) => Some(packet),
            _ => None,
        })
    }

    pub fn extra_data(&self) -> impl Iterator<Item = &ExtraDataRecord> {
        self.records.iter().filter_map(|r| match r.as_ref() {
            Record::ExtraData(extra) => Some(extra),
            _ => None,
        })
    }
}

impl<T> LogicalEvent<T> {
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> IntoIterator for LogicalEvent<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Buffers records until the start of the next event.
///
/// Generic over anything that can be viewed as a [`Record`], so callers can
/// aggregate records together with metadata such as their spool position.
#[derive(Debug)]
pub struct EventAggregator<T = Record> {
    buffer: Vec<T>,
    policy: AggregationPolicy,
}

impl<T: AsRef<Record>> Default for EventAggregator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: AsRef<Record>> EventAggregator<T> {
    pub fn new() -> Self {
        Self::with_policy(AggregationPolicy::default())
    }

    pub fn with_policy(policy: AggregationPolicy) -> Self {
        Self { buffer: Vec::new(), policy }
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// Add a record, returning the previous group when `record` starts a new
    /// event.
    pub fn add(&mut self, record: T) -> Option<LogicalEvent<T>> {
        let is_event = record.as_ref().is_event();

        if is_event && !self.buffer.is_empty() {
            let completed = self.take_buffer();
            self.buffer.push(record);
            trace!(records = completed.len(), "logical event complete");
            return Some(completed);
        }

        if !is_event && self.buffer.is_empty() && self.policy == AggregationPolicy::Strict {
            let record = record.as_ref();
            warn!(
                record_type = %record.record_type(),
                event_id = record.event_id(),
                "discarding record with no preceding event"
            );
            return None;
        }

        self.buffer.push(record);
        None
    }

    /// Drain everything buffered, in arrival order. May be empty.
    pub fn flush(&mut self) -> LogicalEvent<T> {
        self.take_buffer()
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn take_buffer(&mut self) -> LogicalEvent<T> {
        LogicalEvent { records: std::mem::take(&mut self.buffer) }
    }
}
