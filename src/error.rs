//! Error types for unified2 decoding and spool reading.
//!
//! All errors implement `std::error::Error` and carry enough context (byte
//! offsets, expected vs. available lengths) for a caller to log the failure and
//! decide whether to wait, skip or abort.
//!
//! ## Error Categories
//!
//! - **Incomplete reads**: a writer has not finished the record yet. The stream
//!   position has been restored, so retrying later is always safe.
//! - **Structural errors**: an unknown record type or an absurd record length.
//!   The file is corrupt or from an unsupported format version.
//! - **Decode errors**: a frame was read completely but its body does not match
//!   the layout of its record type. Only that one record is lost.
//! - **I/O errors**: files or directories that cannot be opened or read.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use unified2::Unified2Error;
//!
//! let error = Unified2Error::IncompleteHeader { offset: 0, missing: 8 };
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::record::RecordType;

/// Result type alias for unified2 operations.
pub type Result<T, E = Unified2Error> = std::result::Result<T, E>;

/// Main error type for unified2 operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Unified2Error {
    #[error("Incomplete record header at offset {offset}: missing {missing} of 8 bytes")]
    IncompleteHeader { offset: u64, missing: u64 },

    #[error(
        "Incomplete {record_type} record at offset {offset}: missing {missing} of {length} body bytes"
    )]
    IncompleteBody { offset: u64, record_type: RecordType, length: u32, missing: u64 },

    #[error("Invalid record header at offset {offset}: unknown record type {record_type}")]
    InvalidHeader { offset: u64, record_type: u32 },

    #[error("{record_type} record at offset {offset} declares {length} bytes (limit {limit})")]
    OversizedRecord { offset: u64, record_type: RecordType, length: u32, limit: u32 },

    #[error("Failed to decode record at offset {offset}")]
    Decode {
        offset: u64,
        #[source]
        source: DecodeError,
    },

    #[error("Unified2 file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Spool directory error: {path}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Failure to interpret the body of a completely read frame.
///
/// Framing already succeeded when one of these is produced, so the byte
/// boundary of the next frame is known and reading can continue past it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(
        "{record_type} field '{field}' truncated: needs {needed} bytes at body offset {offset}, {available} available"
    )]
    Truncated {
        record_type: RecordType,
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{record_type} body has {extra} bytes beyond its {expected}-byte layout")]
    TrailingBytes { record_type: RecordType, expected: usize, extra: usize },
}

impl DecodeError {
    /// The record type whose layout was violated.
    pub fn record_type(&self) -> RecordType {
        match self {
            DecodeError::Truncated { record_type, .. } => *record_type,
            DecodeError::TrailingBytes { record_type, .. } => *record_type,
        }
    }

    /// Number of bytes missing for a truncated field, zero otherwise.
    pub fn shortfall(&self) -> usize {
        match self {
            DecodeError::Truncated { needed, available, .. } => needed.saturating_sub(*available),
            DecodeError::TrailingBytes { .. } => 0,
        }
    }
}

impl Unified2Error {
    /// Returns whether retrying the same read later may succeed.
    ///
    /// Only incomplete reads qualify: the stream was rewound and a concurrent
    /// writer may still append the missing bytes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Unified2Error::IncompleteHeader { .. } => true,
            Unified2Error::IncompleteBody { .. } => true,
            Unified2Error::InvalidHeader { .. } => false,
            Unified2Error::OversizedRecord { .. } => false,
            Unified2Error::Decode { .. } => false,
            Unified2Error::File { .. } => false,
            Unified2Error::Directory { .. } => false,
            Unified2Error::Config { .. } => false,
        }
    }

    /// Returns whether this is a short read against a partially written record.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Unified2Error::IncompleteHeader { .. } | Unified2Error::IncompleteBody { .. })
    }

    /// Returns whether the failure is confined to a single record.
    ///
    /// The reader has already moved past the offending frame, so the caller
    /// may log it and keep reading.
    pub fn is_record_error(&self) -> bool {
        matches!(self, Unified2Error::Decode { .. })
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Unified2Error::IncompleteHeader { .. } | Unified2Error::IncompleteBody { .. } => vec![
                "Wait for the writer to finish the record and read again",
                "Check that the writer is still running",
            ],
            Unified2Error::InvalidHeader { .. } => vec![
                "Verify the file is a unified2 log",
                "Check the producer's unified2 output version",
                "Skip the file if it is known to be corrupt",
            ],
            Unified2Error::OversizedRecord { .. } => vec![
                "Verify the file is a unified2 log",
                "Skip the file if it is known to be corrupt",
            ],
            Unified2Error::Decode { .. } => vec![
                "Skip the record and continue reading",
                "Check the producer for unified2 output bugs",
            ],
            Unified2Error::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
                "Verify the saved resume position refers to an existing file",
            ],
            Unified2Error::Directory { .. } => vec![
                "Check the spool directory exists",
                "Check directory permissions",
            ],
            Unified2Error::Config { .. } => vec![
                "Check the configuration file syntax",
                "Verify required settings are present and non-zero",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        Unified2Error::File { path, source }
    }

    /// Helper constructor for spool directory errors.
    pub fn directory_error(path: PathBuf, source: std::io::Error) -> Self {
        Unified2Error::Directory { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(reason: impl Into<String>) -> Self {
        Unified2Error::Config { reason: reason.into(), source: None }
    }

    /// Helper constructor for configuration errors with source.
    pub fn config_error_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Unified2Error::Config { reason: reason.into(), source: Some(source) }
    }
}

impl From<std::io::Error> for Unified2Error {
    fn from(err: std::io::Error) -> Self {
        Unified2Error::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
