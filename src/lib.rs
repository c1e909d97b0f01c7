//! # tiffsnip
//!
//! Delete a single page from a multi-page TIFF or BigTIFF file, in place.
//!
//! A TIFF file is a linked list of Image File Directories (IFDs), one per
//! page. Deleting a page zeroes its directory, its tile or strip data and any
//! tag values stored out of line, then relinks the chain around it. Freed
//! space is not reclaimed: the file keeps its length and every surviving
//! offset stays valid.
//!
//! ## Architecture
//!
//! - [`io`] - positioned reads/writes and zero-filling
//! - [`mod@format`] - TIFF/BigTIFF header and directory decoding
//! - [`edit`] - chain walking, inspection and page deletion
//! - [`config`] - CLI configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use tiffsnip::PageEditor;
//!
//! let mut editor = PageEditor::open_path("scan.tif")?;
//! let plan = editor.delete_page(2)?;
//! println!("zeroed {} bytes", plan.erased_bytes());
//! # Ok::<(), tiffsnip::EditError>(())
//! ```

pub mod config;
pub mod edit;
pub mod error;
pub mod format;
pub mod io;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use edit::{
    ChainReport, DeletionPlan, EntrySummary, IfdChain, PageEditor, PageSummary, Relink,
    TagValueRange,
};
pub use error::{EditError, TiffError};
pub use format::tiff::{
    type_width, EntryValue, FieldType, Ifd, IfdEntry, PayloadExtents, PixelLayout, TiffFormat,
    TiffHeader, TiffTag, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE,
};
pub use io::{zero_fill, ByteRange, ZERO_FILL_CHUNK};
