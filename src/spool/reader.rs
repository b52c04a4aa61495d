//! Resumable reader over a directory of rotating unified2 files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::discovery::{RotationKey, SpoolFile, discover_spool_files};
use crate::frame::RecordReader;
use crate::record::Record;
use crate::{Result, Unified2Error};

/// Where a spool reader is: the file it is reading and the byte offset of the
/// next unread frame in it.
///
/// An empty `filename` means no file has been opened yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpoolPosition {
    pub filename: String,
    pub offset: u64,
}

impl SpoolPosition {
    pub fn new(filename: impl Into<String>, offset: u64) -> Self {
        Self { filename: filename.into(), offset }
    }
}

/// A record together with the spool position just after it.
///
/// Persisting `position` once the record has been handled gives at-least-once
/// processing across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolItem {
    pub record: Record,
    pub position: SpoolPosition,
}

impl AsRef<Record> for SpoolItem {
    fn as_ref(&self) -> &Record {
        &self.record
    }
}

type CloseHook = Box<dyn FnMut(&Path) + Send>;

struct OpenFile {
    reader: RecordReader,
    name: String,
    key: RotationKey,
}

impl OpenFile {
    fn is_older_than(&self, file: &SpoolFile) -> bool {
        (&self.key, self.name.as_str()) < (&file.key, file.name.as_str())
    }
}

/// Reads records from `<dir>/<prefix>.<suffix>` files in rotation order.
///
/// The reader never blocks: when the newest file has no complete record left
/// it returns `Ok(None)`, and the caller decides when to ask again. A file is
/// only left behind once a newer one exists, since the producer never appends
/// to a file after rotating away from it.
pub struct SpoolReader {
    dir: PathBuf,
    prefix: String,
    current: Option<OpenFile>,
    finished: Option<(RotationKey, String)>,
    position: SpoolPosition,
    close_hook: Option<CloseHook>,
}

impl SpoolReader {
    /// A reader that starts at the oldest file in the spool.
    ///
    /// Nothing is opened until the first call to [`SpoolReader::next_record`].
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            current: None,
            finished: None,
            position: SpoolPosition::default(),
            close_hook: None,
        }
    }

    /// A reader that resumes at a previously saved position.
    ///
    /// The named file is opened and positioned immediately so a stale position
    /// is reported here rather than on the first read.
    pub fn with_position(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        position: SpoolPosition,
    ) -> Result<Self> {
        let mut reader = Self::new(dir, prefix);
        if position.filename.is_empty() {
            return Ok(reader);
        }

        let key = RotationKey::for_file(&position.filename, &reader.prefix).ok_or_else(|| {
            Unified2Error::config_error(format!(
                "resume file {} does not match spool prefix {}",
                position.filename, reader.prefix
            ))
        })?;
        let path = reader.dir.join(&position.filename);
        let file_reader = RecordReader::open_at(&path, position.offset)?;

        info!("Resuming spool at {} offset {}", position.filename, position.offset);
        reader.current = Some(OpenFile { reader: file_reader, name: position.filename.clone(), key });
        reader.position = position;
        Ok(reader)
    }

    /// Register a callback invoked with the path of each file the reader
    /// finishes with, e.g. to delete or archive it.
    pub fn set_close_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&Path) + Send + 'static,
    {
        self.close_hook = Some(Box::new(hook));
    }

    /// Position after the last returned record.
    pub fn offset(&self) -> &SpoolPosition {
        &self.position
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Files currently in the spool, oldest first.
    pub fn files(&self) -> Result<Vec<SpoolFile>> {
        discover_spool_files(&self.dir, &self.prefix)
    }

    /// Read the next record from the spool.
    ///
    /// - `Ok(Some(record))`: the position now points just past `record`
    /// - `Ok(None)`: no complete record available yet, position unchanged
    /// - `Err(Decode { .. })`: one bad record; the position has moved past it
    ///   and the next call continues with the following record
    /// - any other error is fatal for the current position
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let mut rechecked = false;
        loop {
            if self.current.is_none() && !self.open_next()? {
                return Ok(None);
            }
            let Some(current) = self.current.as_mut() else {
                return Ok(None);
            };

            match current.reader.next_record() {
                Ok(Some(record)) => {
                    self.position.offset = current.reader.offset();
                    return Ok(Some(record));
                }
                Err(err) if err.is_record_error() => {
                    self.position.offset = current.reader.offset();
                    debug!(
                        file = %current.name,
                        offset = self.position.offset,
                        error = %err,
                        "skipping undecodable record"
                    );
                    return Err(err);
                }
                Err(err) => return Err(err),
                Ok(None) => {
                    if !self.newer_file_exists()? {
                        return Ok(None);
                    }
                    // The producer may have written its last record just
                    // before rotating, so look once more before moving on.
                    if !rechecked {
                        rechecked = true;
                        continue;
                    }
                    self.finish_current();
                    rechecked = false;
                }
            }
        }
    }

    /// Like [`SpoolReader::next_record`], pairing the record with the
    /// position just after it.
    pub fn next_item(&mut self) -> Result<Option<SpoolItem>> {
        Ok(self
            .next_record()?
            .map(|record| SpoolItem { record, position: self.position.clone() }))
    }

    fn newer_file_exists(&self) -> Result<bool> {
        let Some(current) = self.current.as_ref() else {
            return Ok(false);
        };
        Ok(self.files()?.iter().any(|file| current.is_older_than(file)))
    }

    /// Open the oldest file not yet consumed. Returns `false` if none exists.
    fn open_next(&mut self) -> Result<bool> {
        let files = self.files()?;
        let next = files.into_iter().find(|file| match &self.finished {
            Some((key, name)) => (key, name.as_str()) < (&file.key, file.name.as_str()),
            None => true,
        });
        let Some(file) = next else {
            return Ok(false);
        };

        let reader = RecordReader::open(&file.path)?;
        if self.finished.is_some() {
            info!("Spool rotated to {}", file.name);
        } else {
            debug!("Opened spool file {}", file.name);
        }
        self.position = SpoolPosition::new(file.name.clone(), 0);
        self.current = Some(OpenFile { reader, name: file.name, key: file.key });
        Ok(true)
    }

    fn finish_current(&mut self) {
        let Some(OpenFile { reader, name, key }) = self.current.take() else {
            return;
        };
        let path = reader.path().to_path_buf();
        let offset = reader.offset();
        let records_read = reader.records_read();
        // Release the handle first so the hook may move or delete the file.
        drop(reader);

        if let Ok(metadata) = std::fs::metadata(&path) {
            let leftover = metadata.len().saturating_sub(offset);
            if leftover > 0 {
                warn!(file = %name, offset, leftover, "abandoning partial record at end of rotated file");
            }
        }
        debug!("Finished spool file {} after {} records", name, records_read);

        if let Some(hook) = self.close_hook.as_mut() {
            hook(&path);
        }
        self.finished = Some((key, name));
    }
}

impl std::fmt::Debug for SpoolReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpoolReader")
            .field("dir", &self.dir)
            .field("prefix", &self.prefix)
            .field("position", &self.position)
            .field("close_hook", &self.close_hook.is_some())
            .finish()
    }
}
