//! Driver spawns and manages the record reading task

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::Result;
use crate::provider::RecordProvider;
use crate::spool::{SpoolItem, SpoolPosition};

/// Consecutive retryable errors tolerated before the task gives up.
const MAX_ERRORS: u32 = 10;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Records (and errors) in reading order
    pub records: mpsc::Receiver<Result<SpoolItem>>,
    /// Latest spool position
    pub positions: watch::Receiver<SpoolPosition>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the record reading task
///
/// The task owns the provider. Records go through a bounded channel so a slow
/// consumer applies backpressure instead of losing records.
///
/// Incomplete reads are retried with backoff. Any other non-record error is
/// forwarded once and ends the task.
pub struct Driver;

impl Driver {
    /// Spawn the reader task for the given provider
    pub fn spawn<P>(provider: P, capacity: usize) -> DriverChannels
    where
        P: RecordProvider,
    {
        let (record_tx, record_rx) = mpsc::channel(capacity.max(1));
        let (position_tx, position_rx) = watch::channel(provider.position());
        let cancel = CancellationToken::new();

        let cancel_task = cancel.clone();
        tokio::spawn(async move {
            Self::record_reader_task(provider, record_tx, position_tx, cancel_task).await;
        });

        DriverChannels { records: record_rx, positions: position_rx, cancel }
    }

    async fn record_reader_task<P>(
        mut provider: P,
        record_tx: mpsc::Sender<Result<SpoolItem>>,
        position_tx: watch::Sender<SpoolPosition>,
        cancel: CancellationToken,
    ) where
        P: RecordProvider,
    {
        info!("Record reader task started");
        let mut record_count = 0u64;
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Record reader cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Record reader cancelled during read");
                    break;
                }
                result = provider.next_record() => result,
            };

            let message = match result {
                Ok(Some(item)) => {
                    record_count += 1;
                    error_count = 0;
                    trace!(
                        "Record {}: {} ends at {}:{}",
                        record_count,
                        item.record.record_type(),
                        item.position.filename,
                        item.position.offset
                    );
                    let _ = position_tx.send(item.position.clone());
                    Ok(item)
                }
                Ok(None) => {
                    info!("Provider ended after {} records", record_count);
                    break;
                }
                Err(e) if e.is_record_error() => {
                    // The reader already moved past the bad frame.
                    warn!("Skipping record: {}", e);
                    let _ = position_tx.send(provider.position());
                    Err(e)
                }
                Err(e) if e.is_retryable() => {
                    error_count += 1;
                    warn!("Provider error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!("Too many provider errors, shutting down");
                        let _ = Self::forward(&record_tx, &cancel, Err(e)).await;
                        break;
                    }

                    if !Self::forward(&record_tx, &cancel, Err(e)).await {
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    continue;
                }
                Err(e) => {
                    error!("Fatal provider error: {}", e);
                    let _ = Self::forward(&record_tx, &cancel, Err(e)).await;
                    break;
                }
            };

            if !Self::forward(&record_tx, &cancel, message).await {
                break;
            }
        }

        info!("Record reader task ended (read {} records)", record_count);
    }

    /// Send one message, returning `false` when the task should stop.
    async fn forward(
        record_tx: &mpsc::Sender<Result<SpoolItem>>,
        cancel: &CancellationToken,
        message: Result<SpoolItem>,
    ) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            sent = record_tx.send(message) => {
                if sent.is_err() {
                    debug!("Record receiver dropped, shutting down");
                }
                sent.is_ok()
            }
        }
    }
}
