//! TIFF header parsing and the per-format layout profile.
//!
//! # TIFF Header Structure
//!
//! ## Classic TIFF (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! ## BigTIFF (16 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II")
//! Bytes 2-3: Version (43 = 0x002B)
//! Bytes 4-5: Offset byte size (must be 8)
//! Bytes 6-7: Reserved
//! Bytes 8-15: Offset to first IFD (8 bytes)
//! ```
//!
//! Big-endian ("MM") files are recognised and rejected.

use serde::Serialize;

use crate::error::TiffError;
use crate::io::{read_u16_le, read_u32_le, read_u64_le, ByteRange};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Version number for BigTIFF
const VERSION_BIGTIFF: u16 = 43;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of BigTIFF header in bytes
pub const BIGTIFF_HEADER_SIZE: usize = 16;

// =============================================================================
// TiffFormat
// =============================================================================

/// Directory layout profile: classic TIFF or BigTIFF.
///
/// Every width the directory walk, erase and relink steps need comes from
/// here, so those steps are written once for both formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TiffFormat {
    /// 32-bit offsets, 16-bit entry counts
    Classic,
    /// 64-bit offsets and entry counts
    Big,
}

impl TiffFormat {
    /// Size of an IFD entry in bytes.
    ///
    /// Classic TIFF: 12 bytes (2 tag + 2 type + 4 count + 4 value/offset)
    /// BigTIFF: 20 bytes (2 tag + 2 type + 8 count + 8 value/offset)
    #[inline]
    pub const fn ifd_entry_size(self) -> usize {
        match self {
            TiffFormat::Classic => 12,
            TiffFormat::Big => 20,
        }
    }

    /// Size of the entry count field at the start of an IFD.
    #[inline]
    pub const fn ifd_count_size(self) -> usize {
        match self {
            TiffFormat::Classic => 2,
            TiffFormat::Big => 8,
        }
    }

    /// Size of the next IFD offset field at the end of an IFD.
    #[inline]
    pub const fn ifd_next_offset_size(self) -> usize {
        match self {
            TiffFormat::Classic => 4,
            TiffFormat::Big => 8,
        }
    }

    /// Size of the count field inside an IFD entry.
    #[inline]
    pub const fn entry_count_size(self) -> usize {
        match self {
            TiffFormat::Classic => 4,
            TiffFormat::Big => 8,
        }
    }

    /// Size of the value/offset field in an IFD entry.
    ///
    /// This is the inline capacity: data no wider than this is stored in the
    /// entry itself.
    #[inline]
    pub const fn value_offset_size(self) -> usize {
        match self {
            TiffFormat::Classic => 4,
            TiffFormat::Big => 8,
        }
    }

    /// Size of the file header, which ends with the first IFD offset.
    #[inline]
    pub const fn header_size(self) -> usize {
        match self {
            TiffFormat::Classic => TIFF_HEADER_SIZE,
            TiffFormat::Big => BIGTIFF_HEADER_SIZE,
        }
    }

    /// Total span of an IFD holding `entry_count` entries.
    ///
    /// Saturates instead of overflowing so absurd counts read from a corrupt
    /// file simply fail the bounds check.
    #[inline]
    pub fn ifd_size(self, entry_count: u64) -> u64 {
        (self.ifd_entry_size() as u64)
            .saturating_mul(entry_count)
            .saturating_add((self.ifd_count_size() + self.ifd_next_offset_size()) as u64)
    }

    /// Offset of the next-IFD field relative to the start of the IFD.
    #[inline]
    pub fn next_offset_position(self, entry_count: u64) -> u64 {
        (self.ifd_entry_size() as u64)
            .saturating_mul(entry_count)
            .saturating_add(self.ifd_count_size() as u64)
    }

    pub const fn name(self) -> &'static str {
        match self {
            TiffFormat::Classic => "TIFF",
            TiffFormat::Big => "BigTIFF",
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Classic TIFF or BigTIFF
    pub format: TiffFormat,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from raw bytes.
    ///
    /// The input must contain at least 8 bytes for classic TIFF or 16 bytes for BigTIFF.
    ///
    /// # Arguments
    /// * `bytes` - Raw header bytes (at least 8 bytes, preferably 16 for BigTIFF support)
    /// * `file_size` - Total file size (used to validate IFD offset)
    ///
    /// # Errors
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `UnsupportedByteOrder` if the file is big-endian
    /// - `InvalidVersion` if version is not 42 or 43
    /// - `InvalidBigTiffOffsetSize` if BigTIFF offset size is not 8
    /// - `FileTooSmall` if there aren't enough bytes for the header
    /// - `InvalidIfdOffset` if the first IFD offset is outside the file
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        // Byte order marker is a fixed byte pattern, so endianness is irrelevant here
        let magic = read_u16_le(&bytes[0..2]);
        match magic {
            BYTE_ORDER_LITTLE_ENDIAN => {}
            BYTE_ORDER_BIG_ENDIAN => return Err(TiffError::UnsupportedByteOrder),
            _ => return Err(TiffError::InvalidMagic(magic)),
        }

        let version = read_u16_le(&bytes[2..4]);
        let (format, first_ifd_offset) = match version {
            VERSION_TIFF => (TiffFormat::Classic, read_u32_le(&bytes[4..8]) as u64),
            VERSION_BIGTIFF => {
                if bytes.len() < BIGTIFF_HEADER_SIZE {
                    return Err(TiffError::FileTooSmall {
                        required: BIGTIFF_HEADER_SIZE as u64,
                        actual: bytes.len() as u64,
                    });
                }

                let offset_size = read_u16_le(&bytes[4..6]);
                if offset_size != 8 {
                    return Err(TiffError::InvalidBigTiffOffsetSize(offset_size));
                }

                // Bytes 6-7 are reserved and ignored
                (TiffFormat::Big, read_u64_le(&bytes[8..16]))
            }
            _ => return Err(TiffError::InvalidVersion(version)),
        };

        if first_ifd_offset >= file_size {
            return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            format,
            first_ifd_offset,
        })
    }

    /// Location of the first-IFD offset field inside the header.
    ///
    /// This is the only part of the header that is ever rewritten.
    #[inline]
    pub fn first_ifd_offset_field(&self) -> ByteRange {
        let width = self.format.ifd_next_offset_size() as u64;
        ByteRange::new(self.format.header_size() as u64 - width, width)
    }
}

// =============================================================================
// Tests
// =============================================================================
