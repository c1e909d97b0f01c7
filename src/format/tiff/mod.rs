//! TIFF and BigTIFF structure decoding.
//!
//! # Key Concepts
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets and 16-bit
//!   entry counts, BigTIFF uses 64-bit for both. [`TiffFormat`] carries the
//!   widths so the rest of the crate handles both with the same code.
//!
//! - **IFD (Image File Directory)**: One per page, linked through a trailing
//!   next-IFD offset. An offset of 0 ends the chain.
//!
//! - **Inline vs offset values**: Small values are stored inline in the IFD entry,
//!   larger values are stored at an offset pointed to by the entry.
//!
//! - **Byte order**: Only little-endian ("II") files are supported.

mod directory;
mod parser;
mod payload;
mod tags;
mod values;

pub use directory::{EntryValue, Ifd, IfdEntry};
pub use parser::{TiffFormat, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use payload::{PayloadExtents, PixelLayout};
pub use tags::{fits_inline, type_width, FieldType, TiffTag};
pub use values::{parse_u64_array, ValueReader};
