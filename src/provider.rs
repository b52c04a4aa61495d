//! Provider trait for record sources

use crate::Result;
use crate::spool::{SpoolItem, SpoolPosition};

/// Trait for asynchronous record sources
///
/// Providers own their reader and handle waiting for new data internally, so
/// the driver task only has to loop over [`RecordProvider::next_record`].
#[async_trait::async_trait]
pub trait RecordProvider: Send + 'static {
    /// Get the next record
    ///
    /// Returns:
    /// - `Ok(Some(item))` - Record available, with the position just after it
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - Error occurred; decode errors affect a single record and
    ///   the provider may be polled again
    async fn next_record(&mut self) -> Result<Option<SpoolItem>>;

    /// Position after the last record returned
    fn position(&self) -> SpoolPosition;
}
