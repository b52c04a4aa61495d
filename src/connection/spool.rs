//! Follow connection for unified2 spool directories

use futures::{Stream, StreamExt, stream::BoxStream};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{ReceiverStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::{AggregationPolicy, LogicalEvent};
use crate::config::SpoolConfig;
use crate::driver::Driver;
use crate::provider::RecordProvider;
use crate::providers::SpoolProvider;
use crate::spool::{SpoolItem, SpoolPosition};
use crate::stream::TryAggregateExt;
use crate::Result;

/// Background reader over a spool directory
///
/// One tokio task owns the reader and feeds records to a bounded channel.
/// The record stream can be taken once, either raw with [`records`] or
/// grouped with [`events`].
///
/// [`records`]: SpoolConnection::records
/// [`events`]: SpoolConnection::events
pub struct SpoolConnection {
    /// Record receiver, until a stream takes it
    records: Option<mpsc::Receiver<Result<SpoolItem>>>,

    /// Position watch receiver
    positions: watch::Receiver<SpoolPosition>,

    aggregation: AggregationPolicy,
    idle_flush: Option<std::time::Duration>,

    /// Cancellation token for stopping the reader task
    cancel: CancellationToken,
}

impl SpoolConnection {
    /// Start following the spool described by `config`.
    pub async fn open(config: SpoolConfig) -> Result<Self> {
        config.validate()?;
        info!("Opening spool {}/{}*", config.directory.display(), config.prefix);

        let provider = SpoolProvider::from_config(&config)?;
        Ok(Self::from_provider(provider, &config))
    }

    /// Drive an arbitrary provider, taking channel and grouping settings from
    /// `config`.
    pub fn from_provider<P: RecordProvider>(provider: P, config: &SpoolConfig) -> Self {
        let channels = Driver::spawn(provider, config.channel_capacity);
        debug!("Spool connection started at {:?}", *channels.positions.borrow());

        Self {
            records: Some(channels.records),
            positions: channels.positions,
            aggregation: config.aggregation,
            idle_flush: config.idle_flush(),
            cancel: channels.cancel,
        }
    }

    /// Stream of records and per-record errors, in spool order.
    ///
    /// Only the first call (to this or [`SpoolConnection::events`]) receives
    /// records; later calls get an empty stream.
    pub fn records(&mut self) -> BoxStream<'static, Result<SpoolItem>> {
        match self.records.take() {
            Some(rx) => ReceiverStream::new(rx).boxed(),
            None => {
                warn!("Record stream already taken");
                futures::stream::empty().boxed()
            }
        }
    }

    /// Stream of logical events grouped with the configured policy.
    ///
    /// Errors are yielded in place as they arrive and leave the open group
    /// intact. A fatal error is the last item before the stream ends.
    pub fn events(&mut self) -> BoxStream<'static, Result<LogicalEvent<SpoolItem>>> {
        self.records().try_aggregate_events(self.aggregation, self.idle_flush).boxed()
    }

    /// Position after the last record read by the background task.
    ///
    /// This runs ahead of what the consumer has processed by up to the
    /// channel capacity; persist [`SpoolItem::position`] for exact resumption.
    pub fn position(&self) -> SpoolPosition {
        self.positions.borrow().clone()
    }

    /// Get position changes as a stream
    pub fn position_updates(&self) -> impl Stream<Item = SpoolPosition> + 'static {
        WatchStream::new(self.positions.clone())
    }

    /// Stop the reader task; open streams end after draining buffered records.
    pub fn close(&self) {
        info!("Closing spool connection");
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SpoolConnection {
    fn drop(&mut self) {
        debug!("Dropping spool connection");
        self.cancel.cancel();
    }
}
