use thiserror::Error;

use crate::format::tiff::PixelLayout;

/// Errors that can occur when parsing TIFF headers and directories
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Big-endian ("MM") files are recognised but not supported
    #[error("Unsupported byte order: only little-endian (II) files can be edited")]
    UnsupportedByteOrder,

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Directory extends past the end of the file
    #[error("Truncated IFD at offset {offset}: needs {required} bytes, file has {available}")]
    TruncatedIfd {
        offset: u64,
        required: u64,
        available: u64,
    },

    /// The next-IFD chain points back at a directory already visited
    #[error("IFD chain loops back to offset {0}")]
    IfdCycle(u64),
}

/// Errors that can occur while inspecting or deleting a page
#[derive(Debug, Error)]
pub enum EditError {
    /// I/O error on the underlying file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF parsing error
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// Page ordinals start at 1
    #[error("Invalid page number {0}: pages are numbered from 1")]
    InvalidPage(usize),

    /// Requested page is beyond the end of the IFD chain
    #[error("Page {requested} not found: file has {page_count} page(s)")]
    PageNotFound { requested: usize, page_count: usize },

    /// Offsets and byte counts entries disagree on the number of chunks
    #[error("{layout} count mismatch: {offsets} offsets but {byte_counts} byte counts")]
    ChunkCountMismatch {
        layout: PixelLayout,
        offsets: u64,
        byte_counts: u64,
    },

    /// An offsets or byte counts entry holds fewer values than its count
    #[error("{tag} declares {expected} values but only {actual} could be read")]
    ShortValueArray {
        tag: &'static str,
        expected: u64,
        actual: u64,
    },

    /// Offsets entry has no byte counts partner
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Directory declares both tile and strip offsets
    #[error("Directory at offset {0} declares both tile and strip offsets")]
    AmbiguousLayout(u64),

    /// Requested range exceeds file bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },
}
