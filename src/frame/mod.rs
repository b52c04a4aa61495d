//! Unified2 framing: the 8-byte header plus body, and the readers built on it.

mod format;
mod reader;

pub use format::{FRAME_HEADER_LEN, Frame, FrameHeader, MAX_RECORD_LEN};
pub use reader::{RecordReader, read_frame, read_record};
