//! Spool follower configuration.
//!
//! ```yaml
//! directory: /var/log/suricata
//! prefix: unified2.alert
//! poll_interval_ms: 250
//! aggregation: strict
//! start:
//!   filename: unified2.alert.1382627900
//!   offset: 68
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::aggregator::AggregationPolicy;
use crate::spool::SpoolPosition;
use crate::{Result, Unified2Error};

const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// Directory holding the rotating files.
    pub directory: PathBuf,
    /// File name prefix shared by every file of the spool.
    pub prefix: String,
    /// Delay between polls when no complete record is available.
    pub poll_interval_ms: u64,
    /// Keep waiting for new data at the end of the spool. When `false` the
    /// record stream ends once everything currently on disk has been read.
    pub follow: bool,
    /// Saved position to resume from; the oldest file when absent.
    pub start: Option<SpoolPosition>,
    pub aggregation: AggregationPolicy,
    /// Emit a buffered logical event after this long without new records.
    pub idle_flush_ms: Option<u64>,
    /// Records buffered between the reader task and the consumer.
    pub channel_capacity: usize,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            prefix: String::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            follow: true,
            start: None,
            aggregation: AggregationPolicy::default(),
            idle_flush_ms: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SpoolConfig {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { directory: directory.into(), prefix: prefix.into(), ..Self::default() }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            Unified2Error::config_error_with_source("failed to parse spool config", Box::new(e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Unified2Error::file_error(path.to_path_buf(), e))?;
        debug!("Loaded spool config from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(Unified2Error::config_error("prefix must not be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Unified2Error::config_error("poll_interval_ms must be greater than zero"));
        }
        if self.channel_capacity == 0 {
            return Err(Unified2Error::config_error("channel_capacity must be greater than zero"));
        }
        if self.idle_flush_ms == Some(0) {
            return Err(Unified2Error::config_error("idle_flush_ms must be greater than zero"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn idle_flush(&self) -> Option<Duration> {
        self.idle_flush_ms.map(Duration::from_millis)
    }

    pub fn with_start(mut self, position: SpoolPosition) -> Self {
        self.start = Some(position);
        self
    }

    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }
}
