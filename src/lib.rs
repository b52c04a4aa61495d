//! Reader for unified2 binary IDS logs.
//!
//! Snort, Suricata and Barnyard-style sensors write alerts as unified2: a
//! sequence of length-prefixed records (events, captured packets, extra data)
//! spread over rotating spool files. This crate decodes those records and
//! follows a spool as it grows.
//!
//! # Features
//!
//! - **Typed records**: every record type decodes into a [`Record`] variant
//! - **Safe live reads**: partially written records are never consumed
//! - **Resumable spools**: [`SpoolPosition`] survives restarts byte-exactly
//! - **Logical events**: [`EventAggregator`] groups an event with its packets
//!   and extra data
//! - **Async follow**: [`SpoolConnection`] streams records from a tokio task
//!
//! ## Example (single file)
//!
//! ```rust,no_run
//! use unified2::Unified2;
//!
//! fn main() -> unified2::Result<()> {
//!     let mut reader = Unified2::open("/var/log/snort/merged.log.1382627900")?;
//!     while let Some(record) = reader.next_record()? {
//!         println!("{} event_id={}", record.record_type(), record.event_id());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Example (following a spool)
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use unified2::{SpoolConfig, Unified2};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SpoolConfig::new("/var/log/snort", "merged.log");
//!     let mut connection = Unified2::follow(config).await?;
//!     let mut events = connection.events();
//!
//!     while let Some(event) = events.next().await {
//!         let event = event?;
//!         if let Some(alert) = event.event() {
//!             println!("signature {} with {} packets", alert.signature_id, event.packets().count());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod aggregator;
pub mod config;
mod error;
pub mod frame;
pub mod record;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;

// Spool reading
pub mod spool;

// Async follow architecture
pub mod connection;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod stream;

// Core exports
pub use aggregator::{AggregationPolicy, EventAggregator, LogicalEvent};
pub use config::SpoolConfig;
pub use error::*;
pub use frame::{Frame, RecordReader, read_frame, read_record};
pub use record::{
    EventRecord, ExtraDataRecord, PacketRecord, RawAddr, Record, RecordType, decode,
};
pub use spool::{SpoolItem, SpoolPosition, SpoolReader, discover_spool_files};

// Main API exports
pub use connection::SpoolConnection;
pub use stream::{AggregateExt, TryAggregateExt};

/// Entry point for the three ways of reading unified2 data.
///
/// # Examples
///
/// ## Resume a spool synchronously
/// ```rust,no_run
/// use unified2::{SpoolPosition, Unified2};
///
/// fn main() -> unified2::Result<()> {
///     let saved = SpoolPosition::new("merged.log.1382627900", 68);
///     let mut reader = Unified2::resume("/var/log/snort", "merged.log", saved)?;
///     while let Some(record) = reader.next_record()? {
///         println!("{:?} -> {:?}", record.record_type(), reader.offset());
///     }
///     Ok(())
/// }
/// ```
pub struct Unified2;

impl Unified2 {
    /// Open a single unified2 file for sequential reading.
    ///
    /// # Errors
    ///
    /// Returns [`Unified2Error::File`] if the file cannot be opened.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<RecordReader> {
        RecordReader::open(path)
    }

    /// Read a spool directory from its oldest file.
    ///
    /// Nothing is touched on disk until the first read.
    pub fn spool(dir: impl Into<std::path::PathBuf>, prefix: impl Into<String>) -> SpoolReader {
        SpoolReader::new(dir, prefix)
    }

    /// Read a spool directory from a saved position.
    ///
    /// # Errors
    ///
    /// Returns an error if the position names a file outside the spool or a
    /// file that cannot be opened.
    pub fn resume(
        dir: impl Into<std::path::PathBuf>,
        prefix: impl Into<String>,
        position: SpoolPosition,
    ) -> Result<SpoolReader> {
        SpoolReader::with_position(dir, prefix, position)
    }

    /// Follow a spool from a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or its start position
    /// cannot be opened.
    pub async fn follow(config: SpoolConfig) -> Result<SpoolConnection> {
        SpoolConnection::open(config).await
    }
}
