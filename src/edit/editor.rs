//! Page deletion.
//!
//! Deleting page `k` of an `n`-page file:
//!
//! 1. Walk the chain to page `k`.
//! 2. Zero its directory (count field, entries and next pointer).
//! 3. Zero every tile or strip it references.
//! 4. Zero every tag value it stores out of line.
//! 5. Point the header (page 1) or page `k - 1` at page `k + 1`.
//!
//! Steps 1-5 are first computed as a [`DeletionPlan`] and validated against
//! the file length, so decode, consistency and range errors abort before any
//! byte is written. An I/O failure while the plan is being applied can still
//! leave the page erased but not yet unlinked.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::EditError;
use crate::format::tiff::{
    Ifd, PayloadExtents, TiffHeader, TiffTag, ValueReader, BIGTIFF_HEADER_SIZE,
};
use crate::io::{encode_uint_le, zero_fill, ReadAt, WriteAt};

use super::chain::{self, IfdChain};
use super::plan::{DeletionPlan, Relink};
use super::report::{ChainReport, PageSummary};

/// An open TIFF file being inspected or edited.
///
/// The editor owns the handle exclusively; every read and write repositions
/// the cursor explicitly.
pub struct PageEditor<F> {
    file: F,
    header: TiffHeader,
    file_size: u64,
}

impl PageEditor<File> {
    /// Open `path` for reading and writing.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, EditError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::open(file)
    }

    /// Open `path` for inspection only.
    pub fn open_path_read_only<P: AsRef<Path>>(path: P) -> Result<Self, EditError> {
        Self::open(File::open(path)?)
    }
}

impl<F: Read + Seek> PageEditor<F> {
    /// Read and validate the header of `file`.
    pub fn open(mut file: F) -> Result<Self, EditError> {
        let file_size = file.byte_len()?;
        let header_len = (BIGTIFF_HEADER_SIZE as u64).min(file_size) as usize;
        let header_bytes = file.read_exact_at(0, header_len)?;
        let header = TiffHeader::parse(&header_bytes, file_size)?;

        debug!(
            format = header.format.name(),
            first_ifd = header.first_ifd_offset,
            file_size,
            "Opened TIFF"
        );

        Ok(Self {
            file,
            header,
            file_size,
        })
    }

    #[inline]
    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    #[inline]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Iterate over the directory chain from the start.
    pub fn chain(&mut self) -> IfdChain<'_, F> {
        IfdChain::new(&mut self.file, &self.header, self.file_size)
    }

    /// Decode every directory in chain order.
    pub fn pages(&mut self) -> Result<Vec<Ifd>, EditError> {
        self.chain().map(|item| item.map(|(_, ifd)| ifd)).collect()
    }

    /// Decode the directory of page `ordinal` (1-based).
    pub fn page(&mut self, ordinal: usize) -> Result<Ifd, EditError> {
        chain::locate(&mut self.file, &self.header, self.file_size, ordinal)
    }

    /// Decode the directory that links to page `ordinal`, if it is not page 1.
    pub fn predecessor(&mut self, ordinal: usize) -> Result<Option<Ifd>, EditError> {
        chain::resolve_predecessor(&mut self.file, &self.header, self.file_size, ordinal)
    }

    /// Resolve the tile or strip data of a directory.
    pub fn payload(&mut self, ifd: &Ifd) -> Result<Option<PayloadExtents>, EditError> {
        let mut values = ValueReader::new(&mut self.file, self.header.format, self.file_size);
        PayloadExtents::resolve(&mut values, ifd)
    }

    /// Summarise every page without modifying the file.
    ///
    /// Only errors decoding the chain itself end the walk. Malformed tile or
    /// strip bookkeeping and unreadable descriptions are listed in
    /// [`PageSummary::issues`].
    pub fn inspect(&mut self) -> Result<ChainReport, EditError> {
        let ifds = self.pages()?;
        let mut pages = Vec::with_capacity(ifds.len());

        for (index, ifd) in ifds.iter().enumerate() {
            let ordinal = index + 1;
            let mut issues = Vec::new();

            let payload = page_result(self.payload(ifd), ordinal, &mut issues)?.flatten();

            let mut values = ValueReader::new(&mut self.file, self.header.format, self.file_size);
            let description = match ifd.get_entry_by_tag(TiffTag::ImageDescription) {
                Some(entry) => {
                    page_result(values.read_string(entry), ordinal, &mut issues)?.flatten()
                }
                None => None,
            };

            let mut summary = PageSummary::new(ordinal, ifd, payload.as_ref(), description);
            summary.issues = issues;
            pages.push(summary);
        }

        Ok(ChainReport {
            format: self.header.format,
            file_size: self.file_size,
            first_ifd_offset: self.header.first_ifd_offset,
            pages,
        })
    }

    /// Work out every write needed to delete page `ordinal`, without writing.
    ///
    /// # Errors
    /// - `InvalidPage` / `PageNotFound` for ordinals outside the chain
    /// - decode errors for truncated or cyclic chains
    /// - `ChunkCountMismatch`, `MissingTag`, `AmbiguousLayout` for malformed
    ///   tile/strip bookkeeping
    /// - `RangeOutOfBounds` if any write would land past the end of the file
    pub fn plan_deletion(&mut self, ordinal: usize) -> Result<DeletionPlan, EditError> {
        let ifd = self.page(ordinal)?;
        let payload = self.payload(&ifd)?;

        for entry in ifd.entries.iter().filter(|e| e.field_type.is_none()) {
            warn!(
                tag = entry.tag_id,
                field_type = entry.field_type_raw,
                "Unknown field type, out-of-line data for this tag is not erased"
            );
        }

        let predecessor = self.predecessor(ordinal)?;
        let plan = DeletionPlan::build(
            ordinal,
            &ifd,
            payload,
            predecessor.as_ref(),
            &self.header,
        );
        plan.validate(self.file_size)?;

        debug!(
            page = ordinal,
            ifd = plan.ifd_offset,
            bytes = plan.erased_bytes(),
            "Planned page deletion"
        );

        Ok(plan)
    }

    /// Give back the underlying handle.
    pub fn into_inner(self) -> F {
        self.file
    }
}

/// Keep a per-page failure as a report issue instead of ending the walk.
///
/// I/O errors still abort.
fn page_result<T>(
    result: Result<T, EditError>,
    ordinal: usize,
    issues: &mut Vec<String>,
) -> Result<Option<T>, EditError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(EditError::Io(e)) => Err(EditError::Io(e)),
        Err(e) => {
            warn!(page = ordinal, error = %e, "Page is malformed");
            issues.push(e.to_string());
            Ok(None)
        }
    }
}

impl<F: Read + Write + Seek> PageEditor<F> {
    /// Apply a plan produced by [`PageEditor::plan_deletion`].
    ///
    /// The plan is validated again before the first write.
    pub fn apply(&mut self, plan: &DeletionPlan) -> Result<(), EditError> {
        plan.validate(self.file_size)?;

        for range in plan.erased_ranges() {
            debug!(offset = range.offset, length = range.length, "Zero-filling");
            zero_fill(&mut self.file, range)?;
        }

        let relink = plan.relink;
        let width = self.header.format.ifd_next_offset_size();
        self.file.write_all_at(
            relink.field().offset,
            &encode_uint_le(relink.new_offset(), width),
        )?;
        self.file.flush()?;

        match relink {
            Relink::Header { new_offset, .. } => {
                self.header.first_ifd_offset = new_offset;
                info!(new_offset, "Rewrote first IFD offset in header");
            }
            Relink::Predecessor {
                ifd_offset,
                new_offset,
                ..
            } => {
                info!(
                    predecessor = ifd_offset,
                    new_offset, "Rewrote predecessor next IFD offset"
                );
            }
        }

        info!(
            page = plan.ordinal,
            ifd = plan.ifd_offset,
            bytes = plan.erased_bytes(),
            "Deleted page"
        );

        Ok(())
    }

    /// Delete page `ordinal` (1-based) and return what was done.
    pub fn delete_page(&mut self, ordinal: usize) -> Result<DeletionPlan, EditError> {
        let plan = self.plan_deletion(ordinal)?;
        self.apply(&plan)?;
        Ok(plan)
    }
}
