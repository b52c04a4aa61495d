//! Reading a directory of rotating unified2 files as one record stream.
//!
//! Producers such as Snort and Suricata write `<prefix>.<suffix>` files and
//! start a new one when the current file grows too large or too old. A
//! [`SpoolReader`] walks those files in rotation order and reports a
//! [`SpoolPosition`] that can be persisted and later handed back to
//! [`SpoolReader::with_position`] to resume without losing or repeating
//! records.

mod discovery;
mod reader;

pub use discovery::{RotationKey, SpoolFile, discover_spool_files};
pub use reader::{SpoolItem, SpoolPosition, SpoolReader};
