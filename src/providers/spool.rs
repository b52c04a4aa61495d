//! Polling provider over a unified2 spool directory

use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::Result;
use crate::config::SpoolConfig;
use crate::provider::RecordProvider;
use crate::spool::{SpoolItem, SpoolPosition, SpoolReader};

/// Provider that reads a spool and polls for new data at the end of it.
///
/// Must be created inside a tokio runtime.
pub struct SpoolProvider {
    reader: SpoolReader,

    /// Poll pacing when the spool has no complete record
    interval: Interval,

    /// Whether to wait for more data at the end of the spool
    follow: bool,

    records: u64,
}

impl SpoolProvider {
    pub fn new(reader: SpoolReader, poll_interval: Duration) -> Self {
        let mut interval = interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { reader, interval, follow: true, records: 0 }
    }

    /// Build the reader described by `config`, resuming at its start position.
    pub fn from_config(config: &SpoolConfig) -> Result<Self> {
        let reader = match &config.start {
            Some(position) => {
                SpoolReader::with_position(&config.directory, &config.prefix, position.clone())?
            }
            None => SpoolReader::new(&config.directory, &config.prefix),
        };

        info!(
            "Following spool {}/{}* (poll every {}ms)",
            config.directory.display(),
            config.prefix,
            config.poll_interval_ms
        );

        let mut provider = Self::new(reader, config.poll_interval());
        provider.follow = config.follow;
        Ok(provider)
    }

    /// Stop at the end of the spool instead of waiting for more data.
    pub fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
    }

    pub fn reader(&self) -> &SpoolReader {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut SpoolReader {
        &mut self.reader
    }
}

#[async_trait::async_trait]
impl RecordProvider for SpoolProvider {
    async fn next_record(&mut self) -> Result<Option<SpoolItem>> {
        loop {
            if let Some(item) = self.reader.next_item()? {
                self.records += 1;
                trace!(
                    "Record {}: {} at {}:{}",
                    self.records,
                    item.record.record_type(),
                    item.position.filename,
                    item.position.offset
                );
                return Ok(Some(item));
            }

            if !self.follow {
                debug!("Reached end of spool after {} records", self.records);
                return Ok(None);
            }

            self.interval.tick().await;
        }
    }

    fn position(&self) -> SpoolPosition {
        self.reader.offset().clone()
    }
}
