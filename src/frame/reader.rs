//! Frame and record reading from seekable streams.
//!
//! [`read_frame`] is the only place that seeks backwards: it remembers where it
//! started and restores that position whenever it cannot return a complete
//! frame. Callers can therefore retry a failed read once a concurrent writer has
//! appended more bytes, without losing or duplicating anything.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use unified2::frame::RecordReader;
//!
//! fn dump() -> unified2::Result<()> {
//!     let mut reader = RecordReader::open("/var/log/suricata/unified2.alert.1382627900")?;
//!     while let Some(record) = reader.next_record()? {
//!         println!("{} event_id={}", record.record_type(), record.event_id());
//!     }
//!     println!("stopped at offset {}", reader.offset());
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::format::{FRAME_HEADER_LEN, Frame, FrameHeader, MAX_RECORD_LEN};
use crate::record::{Record, RecordType, decode};
use crate::{Result, Unified2Error};

// Upper bound on the up-front body allocation; larger bodies grow as read.
const INITIAL_BODY_CAPACITY: u32 = 64 * 1024;

/// Read one complete frame from `stream`.
///
/// On success the stream is positioned at the start of the next frame. On any
/// error the stream is back where it was before the call:
///
/// - [`Unified2Error::IncompleteHeader`] / [`Unified2Error::IncompleteBody`]:
///   not enough bytes yet, retry later
/// - [`Unified2Error::InvalidHeader`]: unknown record type, the stream is not
///   (or no longer) unified2
/// - [`Unified2Error::OversizedRecord`]: absurd body length
pub fn read_frame<R: Read + Seek>(stream: &mut R) -> Result<Frame> {
    let start = stream.stream_position()?;
    rollback_on_error(stream, start, |stream| read_frame_at(stream, start))
}

/// Read and decode one record from `stream`.
///
/// Framing errors behave as in [`read_frame`]. A decode failure is reported as
/// [`Unified2Error::Decode`] with the stream already past the bad frame.
pub fn read_record<R: Read + Seek>(stream: &mut R) -> Result<Record> {
    let offset = stream.stream_position()?;
    let frame = read_frame(stream)?;
    decode(&frame).map_err(|source| Unified2Error::Decode { offset, source })
}

fn rollback_on_error<R, T>(
    stream: &mut R,
    start: u64,
    attempt: impl FnOnce(&mut R) -> Result<T>,
) -> Result<T>
where
    R: Seek,
{
    match attempt(stream) {
        Ok(value) => Ok(value),
        Err(err) => {
            stream.seek(SeekFrom::Start(start))?;
            trace!(offset = start, error = %err, "rewound after failed frame read");
            Err(err)
        }
    }
}

fn read_frame_at<R: Read>(stream: &mut R, start: u64) -> Result<Frame> {
    let mut header_bytes = [0u8; FRAME_HEADER_LEN];
    let got = read_available(stream, &mut header_bytes)?;
    if got < FRAME_HEADER_LEN {
        return Err(Unified2Error::IncompleteHeader {
            offset: start,
            missing: (FRAME_HEADER_LEN - got) as u64,
        });
    }

    let header = FrameHeader::parse(&header_bytes);
    let record_type = RecordType::from_tag(header.record_type).ok_or(
        Unified2Error::InvalidHeader { offset: start, record_type: header.record_type },
    )?;

    if header.length > MAX_RECORD_LEN {
        return Err(Unified2Error::OversizedRecord {
            offset: start,
            record_type,
            length: header.length,
            limit: MAX_RECORD_LEN,
        });
    }

    let mut body = Vec::with_capacity(header.length.min(INITIAL_BODY_CAPACITY) as usize);
    Read::take(&mut *stream, header.length as u64).read_to_end(&mut body)?;
    if body.len() < header.length as usize {
        return Err(Unified2Error::IncompleteBody {
            offset: start,
            record_type,
            length: header.length,
            missing: (header.length as usize - body.len()) as u64,
        });
    }

    trace!(offset = start, %record_type, length = header.length, "read frame");
    Ok(Frame::new(record_type, body))
}

/// Fill as much of `buf` as the stream currently holds.
fn read_available<R: Read>(stream: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Sequential record reader over a single unified2 file or stream.
///
/// Tracks the byte offset of the next unread frame so a caller can save it
/// and later resume with [`RecordReader::open_at`].
pub struct RecordReader<R = BufReader<File>> {
    stream: R,
    path: PathBuf,
    offset: u64,
    records_read: u64,
}

impl RecordReader<BufReader<File>> {
    /// Open a unified2 file at its beginning.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_at(path, 0)
    }

    /// Open a unified2 file and position it at `offset`.
    ///
    /// `offset` must be a frame boundary, normally one previously returned by
    /// [`RecordReader::offset`].
    pub fn open_at<P: AsRef<Path>>(path: P, offset: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file =
            File::open(&path).map_err(|e| Unified2Error::file_error(path.clone(), e))?;
        let mut stream = BufReader::new(file);
        stream
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Unified2Error::file_error(path.clone(), e))?;

        debug!("Opened unified2 file {} at offset {}", path.display(), offset);
        Ok(Self { stream, path, offset, records_read: 0 })
    }
}

impl<R: Read + Seek> RecordReader<R> {
    /// Wrap an already positioned stream (for in-memory data and tests).
    pub fn from_reader(mut stream: R) -> Result<Self> {
        let offset = stream.stream_position()?;
        Ok(Self { stream, path: PathBuf::from("<memory>"), offset, records_read: 0 })
    }

    /// Read the next raw frame without decoding it.
    ///
    /// Returns `Ok(None)` when no complete frame is available yet; the reader
    /// stays at the same offset and can be called again later.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match read_frame(&mut self.stream) {
            Ok(frame) => {
                self.offset += frame.encoded_len();
                self.records_read += 1;
                Ok(Some(frame))
            }
            Err(err) if err.is_incomplete() => {
                trace!(offset = self.offset, error = %err, "no complete frame available");
                Ok(None)
            }
            Err(err) => Err(self.attach_path(err)),
        }
    }

    /// Read and decode the next record.
    ///
    /// Returns `Ok(None)` at the end of the available data. A decode failure
    /// consumes the bad frame, so the following call continues with the next
    /// record.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let start = self.offset;
        match self.next_frame()? {
            Some(frame) => decode(&frame)
                .map(Some)
                .map_err(|source| Unified2Error::Decode { offset: start, source }),
            None => Ok(None),
        }
    }

    /// Offset of the next unread frame.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Path of the underlying file (`<memory>` for wrapped streams).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames read so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn into_inner(self) -> R {
        self.stream
    }

    fn attach_path(&self, err: Unified2Error) -> Unified2Error {
        match err {
            Unified2Error::File { source, .. } => {
                Unified2Error::file_error(self.path.clone(), source)
            }
            other => other,
        }
    }
}

impl<R: Read + Seek> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        encode_frame, multi_record_event_log, sample_event, sample_packet, encode_record,
    };
    use anyhow::{Context, Result, ensure};
    use std::io::Cursor;

    #[test]
    fn complete_file_yields_every_record_then_end() -> Result<()> {
        let data = multi_record_event_log();
        let mut cursor = Cursor::new(data.clone());

        let mut count = 0;
        loop {
            match read_record(&mut cursor) {
                Ok(_) => count += 1,
                Err(Unified2Error::IncompleteHeader { missing, offset }) => {
                    ensure!(missing == 8, "clean end should miss a whole header, missed {missing}");
                    ensure!(offset == data.len() as u64);
                    break;
                }
                Err(other) => anyhow::bail!("unexpected error: {other}"),
            }
        }

        ensure!(count == 17, "expected 17 records, read {count}");
        ensure!(cursor.position() == data.len() as u64);
        Ok(())
    }

    #[test]
    fn truncated_header_leaves_position_unchanged() {
        let data = multi_record_event_log();
        let mut cursor = Cursor::new(data[..5].to_vec());

        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, Unified2Error::IncompleteHeader { offset: 0, missing: 3 }));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn truncated_body_rewinds_to_frame_start() {
        let data = multi_record_event_log();
        // First frame is 68 bytes; stop 10 bytes into the second frame's body.
        let mut cursor = Cursor::new(data[..68 + 8 + 10].to_vec());

        read_frame(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 68);

        let err = read_frame(&mut cursor).unwrap_err();
        match err {
            Unified2Error::IncompleteBody { offset, record_type, missing, length } => {
                assert_eq!(offset, 68);
                assert_eq!(record_type, RecordType::Packet);
                assert_eq!(missing, length as u64 - 10);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cursor.position(), 68);
    }

    #[test]
    fn retry_succeeds_once_data_is_appended() {
        let full = multi_record_event_log();
        let mut cursor = Cursor::new(full[..40].to_vec());
        assert!(read_frame(&mut cursor).unwrap_err().is_incomplete());

        // Simulate the writer finishing the record.
        cursor.get_mut().extend_from_slice(&full[40..68]);
        let frame = read_frame(&mut cursor).unwrap();
        assert_eq!(frame.record_type, RecordType::EventV2);
        assert_eq!(cursor.position(), 68);
    }

    #[test]
    fn unknown_record_type_is_invalid_header() {
        let mut data = encode_frame(99, &[0u8; 4]);
        data.extend(encode_record(&crate::Record::Packet(sample_packet(1, b"x"))));
        let mut cursor = Cursor::new(data);

        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, Unified2Error::InvalidHeader { offset: 0, record_type: 99 }));
        assert!(!err.is_retryable());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn oversized_length_is_rejected_without_reading() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&(MAX_RECORD_LEN + 1).to_be_bytes());
        let mut cursor = Cursor::new(data);

        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, Unified2Error::OversizedRecord { .. }));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn decode_failure_consumes_the_frame() -> Result<()> {
        // An IPv6 event tag wrapped around an IPv4 sized body.
        let event = crate::Record::Event(sample_event(RecordType::EventV2, 1));
        let body = encode_record(&event)[8..].to_vec();
        let mut data = encode_frame(RecordType::EventV2Ip6.tag(), &body);
        data.extend(encode_record(&crate::Record::Packet(sample_packet(1, b"next"))));

        let mut reader = RecordReader::from_reader(Cursor::new(data))?;
        let err = reader.next_record().unwrap_err();
        ensure!(err.is_record_error(), "expected decode error, got {err}");
        ensure!(matches!(err, Unified2Error::Decode { offset: 0, .. }));
        ensure!(reader.offset() == 68);

        let next = reader.next_record()?.context("expected the following packet")?;
        ensure!(next.record_type() == RecordType::Packet);
        ensure!(reader.next_record()?.is_none());
        Ok(())
    }

    #[test]
    fn record_reader_resumes_at_saved_offset() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("unified2.log");
        std::fs::write(&path, multi_record_event_log())?;

        let mut first = RecordReader::open(&path)?;
        first.next_record()?.context("first record")?;
        ensure!(first.offset() == 68, "offset after first record was {}", first.offset());
        let second = first.next_record()?.context("second record")?;

        let mut resumed = RecordReader::open_at(&path, 68)?;
        let resumed_second = resumed.next_record()?.context("resumed record")?;
        ensure!(resumed_second == second);
        ensure!(!resumed_second.is_event());
        ensure!(resumed.offset() == first.offset());
        Ok(())
    }

    #[test]
    fn iterator_collects_all_records() -> Result<()> {
        let reader = RecordReader::from_reader(Cursor::new(multi_record_event_log()))?;
        let records = reader.collect::<crate::Result<Vec<_>>>()?;

        ensure!(records.len() == 17);
        ensure!(records[0].is_event());
        ensure!(records[1..].iter().all(|r| !r.is_event()));
        Ok(())
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RecordReader::open("/nonexistent/unified2.log").err().unwrap();
        match err {
            Unified2Error::File { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/unified2.log"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
