//! In-place redaction of byte ranges.
//!
//! Erased regions are overwritten with zeros rather than removed, so the file
//! length never changes and every other offset in the file stays valid.

use std::io::{self, Seek, SeekFrom, Write};

use serde::Serialize;

use crate::error::EditError;

/// Size of the staging buffer used when writing zeros.
pub const ZERO_FILL_CHUNK: usize = 2048;

/// A contiguous region of the file, `[offset, offset + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ByteRange {
    /// Absolute start offset
    pub offset: u64,
    /// Number of bytes
    pub length: u64,
}

impl ByteRange {
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset, or `None` if it overflows.
    #[inline]
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `position` falls inside this range.
    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        position >= self.offset && self.end().map_or(true, |end| position < end)
    }

    /// Reject ranges that reach past the end of a file of `size` bytes.
    ///
    /// Empty ranges are always accepted.
    pub fn check_within(&self, size: u64) -> Result<(), EditError> {
        if self.is_empty() {
            return Ok(());
        }
        match self.end() {
            Some(end) if end <= size => Ok(()),
            _ => Err(EditError::RangeOutOfBounds {
                offset: self.offset,
                requested: self.length,
                size,
            }),
        }
    }
}

/// Overwrite `range` with zero bytes.
///
/// Zeros are written from a fixed [`ZERO_FILL_CHUNK`]-sized buffer until the
/// range is covered. No bounds checking is done here: a range past the end of
/// the file would extend it, so callers validate with
/// [`ByteRange::check_within`] first.
pub fn zero_fill<W: Write + Seek + ?Sized>(writer: &mut W, range: ByteRange) -> io::Result<()> {
    if range.is_empty() {
        return Ok(());
    }

    let zeros = [0u8; ZERO_FILL_CHUNK];
    writer.seek(SeekFrom::Start(range.offset))?;

    let mut remaining = range.length;
    while remaining > 0 {
        let chunk = remaining.min(ZERO_FILL_CHUNK as u64) as usize;
        writer.write_all(&zeros[..chunk])?;
        remaining -= chunk as u64;
    }

    Ok(())
}
