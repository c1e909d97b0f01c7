//! Walking the IFD chain.
//!
//! Directories form a singly linked list through their next-IFD offsets,
//! starting at the header's first-IFD offset and ending at offset 0. Pages are
//! numbered from 1 in chain order.

use std::collections::HashSet;
use std::io::{Read, Seek};

use crate::error::{EditError, TiffError};
use crate::format::tiff::{Ifd, TiffFormat, TiffHeader};

/// Iterator over the directories of a file, yielding `(ordinal, ifd)`.
///
/// Decoding stops at the first error, which is yielded once. A chain that
/// revisits an offset is reported as [`TiffError::IfdCycle`].
pub struct IfdChain<'a, R: ?Sized> {
    reader: &'a mut R,
    format: TiffFormat,
    file_size: u64,
    next: u64,
    ordinal: usize,
    visited: HashSet<u64>,
    failed: bool,
}

impl<'a, R: Read + Seek + ?Sized> IfdChain<'a, R> {
    pub fn new(reader: &'a mut R, header: &TiffHeader, file_size: u64) -> Self {
        Self {
            reader,
            format: header.format,
            file_size,
            next: header.first_ifd_offset,
            ordinal: 0,
            visited: HashSet::new(),
            failed: false,
        }
    }
}

impl<R: Read + Seek + ?Sized> Iterator for IfdChain<'_, R> {
    type Item = Result<(usize, Ifd), EditError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next == 0 {
            return None;
        }

        let offset = self.next;
        if !self.visited.insert(offset) {
            self.failed = true;
            return Some(Err(TiffError::IfdCycle(offset).into()));
        }

        match Ifd::read(&mut *self.reader, offset, self.format, self.file_size) {
            Ok(ifd) => {
                self.next = ifd.next_ifd_offset;
                self.ordinal += 1;
                Some(Ok((self.ordinal, ifd)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Find the directory of page `ordinal` (1-based).
///
/// # Errors
/// - `InvalidPage` for ordinal 0
/// - `PageNotFound` if the chain ends first
/// - any decode error hit while walking
pub fn locate<R: Read + Seek + ?Sized>(
    reader: &mut R,
    header: &TiffHeader,
    file_size: u64,
    ordinal: usize,
) -> Result<Ifd, EditError> {
    if ordinal == 0 {
        return Err(EditError::InvalidPage(ordinal));
    }

    let mut page_count = 0;
    for item in IfdChain::new(reader, header, file_size) {
        let (current, ifd) = item?;
        if current == ordinal {
            return Ok(ifd);
        }
        page_count = current;
    }

    Err(EditError::PageNotFound {
        requested: ordinal,
        page_count,
    })
}

/// Find the directory that links to page `ordinal`.
///
/// Page 1 is linked from the header, so it has no predecessor and nothing is
/// read. For later pages the chain is walked again from the start.
pub fn resolve_predecessor<R: Read + Seek + ?Sized>(
    reader: &mut R,
    header: &TiffHeader,
    file_size: u64,
    ordinal: usize,
) -> Result<Option<Ifd>, EditError> {
    match ordinal {
        0 => Err(EditError::InvalidPage(ordinal)),
        1 => Ok(None),
        n => locate(reader, header, file_size, n - 1).map(Some),
    }
}
