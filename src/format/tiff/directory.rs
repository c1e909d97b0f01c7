//! Image File Directory decoding.
//!
//! # IFD Layout
//!
//! ```text
//! Classic TIFF: count (u16) | entries (12 bytes each) | next IFD offset (u32)
//! BigTIFF:      count (u64) | entries (20 bytes each) | next IFD offset (u64)
//! ```
//!
//! The three parts are contiguous, so the whole span of a directory follows
//! from its entry count alone.
//!
//! # Entry Layout
//!
//! ```text
//! Classic TIFF: tag (u16) | type (u16) | count (u32) | value/offset (4 bytes)
//! BigTIFF:      tag (u16) | type (u16) | count (u64) | value/offset (8 bytes)
//! ```
//!
//! Whether the value/offset field holds the data itself or points at it is
//! not flagged anywhere; it follows from `count * type width` compared with the
//! field width. Entries are classified once, at decode time, into
//! [`EntryValue::Inline`] or [`EntryValue::External`].

use std::io::{ErrorKind, Read, Seek};

use bytes::Bytes;
use tracing::debug;

use crate::error::{EditError, TiffError};
use crate::io::{read_u16_le, read_uint_le, ByteRange, ReadAt};

use super::parser::TiffFormat;
use super::tags::{fits_inline, type_width, FieldType, TiffTag};

// =============================================================================
// IfdEntry
// =============================================================================

/// Where an entry's data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    /// Data stored in the value field itself (the full 4 or 8 field bytes)
    Inline(Bytes),
    /// Data stored elsewhere in the file
    External(ByteRange),
}

/// A single decoded directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Tag identifier
    pub tag_id: u16,

    /// Field type, if known
    pub field_type: Option<FieldType>,

    /// Raw field type code as stored in the file
    pub field_type_raw: u16,

    /// Number of values
    pub count: u64,

    /// Inline data or location of external data
    pub value: EntryValue,
}

impl IfdEntry {
    /// Decode one entry from exactly `format.ifd_entry_size()` bytes.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than the entry size for `format`.
    pub fn parse(bytes: &[u8], format: TiffFormat) -> Self {
        let tag_id = read_u16_le(&bytes[0..2]);
        let field_type_raw = read_u16_le(&bytes[2..4]);

        let count_size = format.entry_count_size();
        let count = read_uint_le(&bytes[4..4 + count_size], count_size);

        let value_start = 4 + count_size;
        let value_size = format.value_offset_size();
        let value_field = &bytes[value_start..value_start + value_size];

        let value = if fits_inline(field_type_raw, count, format) {
            EntryValue::Inline(Bytes::copy_from_slice(value_field))
        } else {
            EntryValue::External(ByteRange::new(
                read_uint_le(value_field, value_size),
                (type_width(field_type_raw) as u64).saturating_mul(count),
            ))
        };

        IfdEntry {
            tag_id,
            field_type: FieldType::from_u16(field_type_raw),
            field_type_raw,
            count,
            value,
        }
    }

    /// Known tag for this entry, if any.
    #[inline]
    pub fn tag(&self) -> Option<TiffTag> {
        TiffTag::from_u16(self.tag_id)
    }

    /// Total size of the entry's data in bytes.
    ///
    /// Returns `None` if the field type is unknown.
    pub fn value_byte_size(&self) -> Option<u64> {
        self.field_type
            .map(|t| (t.size_in_bytes() as u64).saturating_mul(self.count))
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self.value, EntryValue::Inline(_))
    }

    /// Location of out-of-line data, or `None` if the value is inline.
    #[inline]
    pub fn external_range(&self) -> Option<ByteRange> {
        match self.value {
            EntryValue::External(range) => Some(range),
            EntryValue::Inline(_) => None,
        }
    }

    /// First value of an inline unsigned integer entry.
    ///
    /// Returns `None` for external values, empty entries and non-integer types.
    pub fn inline_u64(&self) -> Option<u64> {
        let field_type = self.field_type?;
        if self.count == 0 || !field_type.is_unsigned_integer() {
            return None;
        }
        match &self.value {
            EntryValue::Inline(bytes) => Some(read_uint_le(bytes, field_type.size_in_bytes())),
            EntryValue::External(_) => None,
        }
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// One decoded Image File Directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Absolute offset of the directory in the file
    pub offset: u64,

    /// Directory layout the entries were decoded with
    pub format: TiffFormat,

    /// Entries in file order
    pub entries: Vec<IfdEntry>,

    /// Offset of the next directory, 0 for the last one
    pub next_ifd_offset: u64,
}

impl Ifd {
    /// Total size in bytes of an IFD with `entry_count` entries.
    #[inline]
    pub fn calculate_size(entry_count: u64, format: TiffFormat) -> u64 {
        format.ifd_size(entry_count)
    }

    /// Decode a directory from its complete byte span.
    ///
    /// `offset` is where `bytes` starts in the file.
    pub fn parse(bytes: &[u8], offset: u64, format: TiffFormat) -> Result<Self, TiffError> {
        let count_size = format.ifd_count_size();
        let truncated = |required: u64| TiffError::TruncatedIfd {
            offset,
            required,
            available: bytes.len() as u64,
        };

        if bytes.len() < count_size {
            return Err(truncated(count_size as u64));
        }
        let entry_count = read_uint_le(&bytes[..count_size], count_size);

        let required = Self::calculate_size(entry_count, format);
        if (bytes.len() as u64) < required {
            return Err(truncated(required));
        }

        let entry_size = format.ifd_entry_size();
        let entries = bytes[count_size..]
            .chunks_exact(entry_size)
            .take(entry_count as usize)
            .map(|raw| IfdEntry::parse(raw, format))
            .collect();

        let next_pos = format.next_offset_position(entry_count) as usize;
        let next_size = format.ifd_next_offset_size();
        let next_ifd_offset = read_uint_le(&bytes[next_pos..next_pos + next_size], next_size);

        Ok(Ifd {
            offset,
            format,
            entries,
            next_ifd_offset,
        })
    }

    /// Read and decode the directory at `offset`.
    ///
    /// The entry count is read first, then the whole span in one read. A
    /// directory that would run past `file_size` is rejected before anything
    /// is allocated for it. The reader's cursor position afterwards is
    /// unspecified.
    pub fn read<R: Read + Seek + ?Sized>(
        reader: &mut R,
        offset: u64,
        format: TiffFormat,
        file_size: u64,
    ) -> Result<Self, EditError> {
        let count_size = format.ifd_count_size();
        let count_bytes = read_span(reader, offset, count_size as u64, file_size)?;
        let entry_count = read_uint_le(&count_bytes, count_size);

        let ifd_size = Self::calculate_size(entry_count, format);
        let ifd_bytes = read_span(reader, offset, ifd_size, file_size)?;
        let ifd = Self::parse(&ifd_bytes, offset, format)?;

        debug!(
            offset = ifd.offset,
            entries = entry_count,
            next = ifd.next_ifd_offset,
            "Decoded IFD"
        );

        Ok(ifd)
    }

    /// Number of entries in the directory.
    #[inline]
    pub fn entry_count(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Byte span of the whole directory: count field, entries and next pointer.
    #[inline]
    pub fn span(&self) -> ByteRange {
        ByteRange::new(
            self.offset,
            Self::calculate_size(self.entry_count(), self.format),
        )
    }

    /// Location of this directory's next-IFD offset field.
    #[inline]
    pub fn next_offset_field(&self) -> ByteRange {
        ByteRange::new(
            self.offset + self.format.next_offset_position(self.entry_count()),
            self.format.ifd_next_offset_size() as u64,
        )
    }

    /// Find the first entry with the given tag ID.
    pub fn get_entry(&self, tag_id: u16) -> Option<&IfdEntry> {
        self.entries.iter().find(|e| e.tag_id == tag_id)
    }

    /// Find the first entry for a known tag.
    #[inline]
    pub fn get_entry_by_tag(&self, tag: TiffTag) -> Option<&IfdEntry> {
        self.get_entry(tag.as_u16())
    }

    #[inline]
    pub fn has_tag(&self, tag: TiffTag) -> bool {
        self.get_entry_by_tag(tag).is_some()
    }

    /// Entries whose data is stored outside the directory, with its location.
    pub fn external_values(&self) -> impl Iterator<Item = (&IfdEntry, ByteRange)> + '_ {
        self.entries
            .iter()
            .filter_map(|e| e.external_range().map(|range| (e, range)))
    }
}

/// Read `len` bytes of a directory at `offset`, mapping short reads to a decode error.
fn read_span<R: Read + Seek + ?Sized>(
    reader: &mut R,
    offset: u64,
    len: u64,
    file_size: u64,
) -> Result<Bytes, EditError> {
    let truncated = TiffError::TruncatedIfd {
        offset,
        required: len,
        available: file_size.saturating_sub(offset),
    };

    let fits = offset.checked_add(len).is_some_and(|end| end <= file_size);
    let len = match usize::try_from(len) {
        Ok(len) if fits => len,
        _ => return Err(truncated.into()),
    };

    reader.read_exact_at(offset, len).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            EditError::Tiff(truncated)
        } else {
            EditError::Io(e)
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
