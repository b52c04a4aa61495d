//! Bounds-checked big-endian reads over a record body.

use super::RecordType;
use crate::DecodeError;

/// Sequential reader over a frame body.
///
/// Every read names the field it is reading so a short body produces a
/// [`DecodeError::Truncated`] that says exactly what was missing.
pub(crate) struct BodyCursor<'a> {
    record_type: RecordType,
    data: &'a [u8],
    pos: usize,
}

impl<'a> BodyCursor<'a> {
    pub(crate) fn new(record_type: RecordType, data: &'a [u8]) -> Self {
        Self { record_type, data, pos: 0 }
    }

    fn take(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if len > available {
            return Err(DecodeError::Truncated {
                record_type: self.record_type,
                field,
                offset: self.pos,
                needed: len,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn array<const N: usize>(
        &mut self,
        field: &'static str,
    ) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(field, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        self.array::<4>(field).map(u32::from_be_bytes)
    }

    pub(crate) fn u16(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        self.array::<2>(field).map(u16::from_be_bytes)
    }

    pub(crate) fn u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        self.array::<1>(field).map(|b| b[0])
    }

    pub(crate) fn bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], DecodeError> {
        self.take(field, len)
    }

    /// Consume and return everything left in the body.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fail if anything is left past a fixed-size layout.
    pub(crate) fn finish(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(DecodeError::TrailingBytes {
                record_type: self.record_type,
                expected: self.pos,
                extra,
            }),
        }
    }
}
