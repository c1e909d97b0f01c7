//! TIFF tag value reading.
//!
//! Values are stored either inline in the IFD entry or at an offset in the
//! file. Arrays such as StripOffsets and TileByteCounts are fetched with a
//! single read after checking they lie inside the file.

use std::io::{Read, Seek};

use bytes::Bytes;

use crate::error::EditError;
use crate::io::{read_uint_le, ByteRange, ReadAt};

use super::directory::{EntryValue, IfdEntry};
use super::parser::TiffFormat;
use super::tags::FieldType;

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from an open TIFF file.
pub struct ValueReader<'a, R: ?Sized> {
    reader: &'a mut R,
    format: TiffFormat,
    file_size: u64,
}

impl<'a, R: Read + Seek + ?Sized> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a mut R, format: TiffFormat, file_size: u64) -> Self {
        Self {
            reader,
            format,
            file_size,
        }
    }

    /// Width of one element when reading `entry` as an integer array.
    ///
    /// Unsigned integer types use their own width; anything else falls back
    /// to the format's offset width.
    pub fn element_width(&self, entry: &IfdEntry) -> usize {
        match entry.field_type {
            Some(t) if t.is_unsigned_integer() => t.size_in_bytes(),
            _ => self.format.value_offset_size(),
        }
    }

    /// Read raw bytes for an IFD entry's value.
    ///
    /// For inline values, returns the meaningful prefix of the value field.
    /// For external values, fetches the bytes from the file.
    pub fn read_bytes(&mut self, entry: &IfdEntry) -> Result<Bytes, EditError> {
        match &entry.value {
            EntryValue::Inline(bytes) => {
                let size = entry.value_byte_size().unwrap_or(0).min(bytes.len() as u64);
                Ok(bytes.slice(..size as usize))
            }
            EntryValue::External(range) => self.read_range(*range),
        }
    }

    /// Read an array of unsigned integers from an entry.
    ///
    /// This is the primary method for reading offsets and byte counts arrays.
    /// Elements are read positionally, `element_width` bytes each. A single
    /// element is always taken from the value field itself, even when its
    /// type is wider than the field.
    pub fn read_u64_array(&mut self, entry: &IfdEntry) -> Result<Vec<u64>, EditError> {
        match entry.count {
            0 => return Ok(Vec::new()),
            1 => return Ok(vec![self.read_scalar(entry)]),
            _ => {}
        }

        let width = self.element_width(entry);
        let bytes = match &entry.value {
            EntryValue::Inline(bytes) => bytes.clone(),
            EntryValue::External(range) => self.read_range(ByteRange::new(
                range.offset,
                entry.count.saturating_mul(width as u64),
            ))?,
        };

        Ok(parse_u64_array(&bytes, entry.count, width))
    }

    /// The value field of `entry` read as one unsigned integer.
    ///
    /// For a value classified as external the field holds an offset, which
    /// is returned as is.
    pub fn read_scalar(&self, entry: &IfdEntry) -> u64 {
        match &entry.value {
            EntryValue::Inline(bytes) => {
                let width = self.element_width(entry).min(bytes.len());
                read_uint_le(&bytes[..width], width)
            }
            EntryValue::External(range) => range.offset,
        }
    }

    /// Read a string value from an ASCII entry.
    ///
    /// Returns `None` for non-ASCII entries. The string ends at the first NUL.
    pub fn read_string(&mut self, entry: &IfdEntry) -> Result<Option<String>, EditError> {
        if entry.field_type != Some(FieldType::Ascii) {
            return Ok(None);
        }

        let bytes = self.read_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(Some(String::from_utf8_lossy(&bytes[..end]).into_owned()))
    }

    fn read_range(&mut self, range: ByteRange) -> Result<Bytes, EditError> {
        range.check_within(self.file_size)?;
        Ok(self.reader.read_exact_at(range.offset, range.length as usize)?)
    }
}

// =============================================================================
// Convenience functions for reading from bytes directly
// =============================================================================

/// Parse up to `count` little-endian unsigned integers of `width` bytes.
///
/// Stops early if `bytes` runs out.
pub fn parse_u64_array(bytes: &[u8], count: u64, width: usize) -> Vec<u64> {
    if width == 0 {
        return Vec::new();
    }

    let available = (bytes.len() / width) as u64;
    bytes
        .chunks_exact(width)
        .take(count.min(available) as usize)
        .map(|chunk| read_uint_le(chunk, width))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
