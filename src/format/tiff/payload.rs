//! Tile/strip payload resolution.
//!
//! Pixel data is described by a pair of entries: an offsets entry and a byte
//! counts entry with the same number of elements. Tiled images use
//! TileOffsets/TileByteCounts, stripped images StripOffsets/StripByteCounts.
//! A directory with neither has no pixel payload to erase.

use std::fmt;
use std::io::{Read, Seek};

use serde::Serialize;
use tracing::debug;

use crate::error::EditError;
use crate::io::ByteRange;

use super::directory::Ifd;
use super::tags::TiffTag;
use super::values::ValueReader;

// =============================================================================
// PixelLayout
// =============================================================================

/// How a directory's pixel data is organised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    Tiles,
    Strips,
}

impl PixelLayout {
    /// Tag holding the chunk offsets for this layout.
    pub const fn offsets_tag(self) -> TiffTag {
        match self {
            PixelLayout::Tiles => TiffTag::TileOffsets,
            PixelLayout::Strips => TiffTag::StripOffsets,
        }
    }

    /// Tag holding the chunk byte counts for this layout.
    pub const fn byte_counts_tag(self) -> TiffTag {
        match self {
            PixelLayout::Tiles => TiffTag::TileByteCounts,
            PixelLayout::Strips => TiffTag::StripByteCounts,
        }
    }

    /// Detect the layout of a directory from its offsets tags.
    ///
    /// Returns `Ok(None)` when the directory carries no pixel payload tags.
    ///
    /// # Errors
    /// `AmbiguousLayout` if both tile and strip offsets are present.
    pub fn detect(ifd: &Ifd) -> Result<Option<Self>, EditError> {
        let tiled = ifd.has_tag(TiffTag::TileOffsets);
        let stripped = ifd.has_tag(TiffTag::StripOffsets);

        match (tiled, stripped) {
            (true, true) => Err(EditError::AmbiguousLayout(ifd.offset)),
            (true, false) => Ok(Some(PixelLayout::Tiles)),
            (false, true) => Ok(Some(PixelLayout::Strips)),
            (false, false) => Ok(None),
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelLayout::Tiles => f.write_str("Tile"),
            PixelLayout::Strips => f.write_str("Strip"),
        }
    }
}

// =============================================================================
// PayloadExtents
// =============================================================================

/// Location of every pixel data chunk of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadExtents {
    pub layout: PixelLayout,

    /// One range per tile or strip, in entry order
    pub chunks: Vec<ByteRange>,
}

impl PayloadExtents {
    /// Resolve the pixel payload of `ifd`.
    ///
    /// Returns `Ok(None)` if the directory has neither tile nor strip offsets.
    /// When the element count is 1 both values come straight from the entries'
    /// value fields; otherwise the two external arrays are read and paired
    /// positionally.
    ///
    /// # Errors
    /// - `AmbiguousLayout` if both tile and strip offsets are present
    /// - `MissingTag` if the byte counts partner is absent
    /// - `ChunkCountMismatch` if the two entries disagree on the element count
    /// - `ShortValueArray` if fewer values could be read than the entries declare
    /// - `RangeOutOfBounds` if an array lies outside the file
    pub fn resolve<R: Read + Seek + ?Sized>(
        reader: &mut ValueReader<'_, R>,
        ifd: &Ifd,
    ) -> Result<Option<Self>, EditError> {
        let Some(layout) = PixelLayout::detect(ifd)? else {
            return Ok(None);
        };

        let offsets_tag = layout.offsets_tag();
        let byte_counts_tag = layout.byte_counts_tag();

        let offsets = ifd
            .get_entry_by_tag(offsets_tag)
            .ok_or(EditError::MissingTag(offsets_tag.name()))?;
        let byte_counts = ifd
            .get_entry_by_tag(byte_counts_tag)
            .ok_or(EditError::MissingTag(byte_counts_tag.name()))?;

        if offsets.count != byte_counts.count {
            return Err(EditError::ChunkCountMismatch {
                layout,
                offsets: offsets.count,
                byte_counts: byte_counts.count,
            });
        }

        let addresses = reader.read_u64_array(offsets)?;
        let lengths = reader.read_u64_array(byte_counts)?;

        for (tag, values) in [(offsets_tag, &addresses), (byte_counts_tag, &lengths)] {
            if values.len() as u64 != offsets.count {
                return Err(EditError::ShortValueArray {
                    tag: tag.name(),
                    expected: offsets.count,
                    actual: values.len() as u64,
                });
            }
        }

        let chunks: Vec<ByteRange> = addresses
            .into_iter()
            .zip(lengths)
            .map(|(offset, length)| ByteRange::new(offset, length))
            .collect();

        debug!(
            ifd = ifd.offset,
            layout = %layout,
            chunks = chunks.len(),
            "Resolved pixel payload"
        );

        Ok(Some(PayloadExtents { layout, chunks }))
    }

    /// Number of tiles or strips.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Sum of all chunk lengths.
    pub fn total_bytes(&self) -> u64 {
        self.chunks
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.length))
    }
}

// =============================================================================
// Tests
// =============================================================================
