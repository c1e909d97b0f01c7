//! Deletion plans.
//!
//! A plan lists every write needed to delete one page, in the order they are
//! applied: the directory span, the pixel payload, out-of-line tag values and
//! finally the single relink write. Building the plan does all the reading
//! and validation, so a plan that passes [`DeletionPlan::validate`] can be
//! applied without further decoding.

use std::iter;

use serde::Serialize;

use crate::error::EditError;
use crate::format::tiff::{Ifd, PayloadExtents, TiffHeader};
use crate::io::ByteRange;

/// The write that unlinks the deleted directory from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relink {
    /// Page 1 is deleted: the header's first-IFD offset is rewritten.
    Header { field: ByteRange, new_offset: u64 },
    /// A later page is deleted: the previous directory's next-IFD offset is rewritten.
    Predecessor {
        ifd_offset: u64,
        field: ByteRange,
        new_offset: u64,
    },
}

impl Relink {
    /// Location of the offset field being rewritten.
    pub fn field(&self) -> ByteRange {
        match *self {
            Relink::Header { field, .. } | Relink::Predecessor { field, .. } => field,
        }
    }

    /// Value written into the field: the deleted directory's next pointer.
    pub fn new_offset(&self) -> u64 {
        match *self {
            Relink::Header { new_offset, .. } | Relink::Predecessor { new_offset, .. } => {
                new_offset
            }
        }
    }
}

/// Out-of-line data belonging to one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagValueRange {
    pub tag_id: u16,
    pub range: ByteRange,
}

/// Every write needed to delete one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionPlan {
    /// 1-based page number
    pub ordinal: usize,

    /// Offset of the deleted directory
    pub ifd_offset: u64,

    /// Count field, entries and next pointer of the deleted directory
    pub directory: ByteRange,

    /// Tile or strip data, if the page has any
    pub payload: Option<PayloadExtents>,

    /// Out-of-line values of every entry, bookkeeping arrays included
    pub tag_values: Vec<TagValueRange>,

    pub relink: Relink,
}

impl DeletionPlan {
    /// Assemble the plan for deleting `ifd`, page `ordinal`.
    ///
    /// `predecessor` is the directory linking to `ifd`, or `None` when `ifd`
    /// is linked from the header.
    pub fn build(
        ordinal: usize,
        ifd: &Ifd,
        payload: Option<PayloadExtents>,
        predecessor: Option<&Ifd>,
        header: &TiffHeader,
    ) -> Self {
        let tag_values = ifd
            .external_values()
            .map(|(entry, range)| TagValueRange {
                tag_id: entry.tag_id,
                range,
            })
            .collect();

        let new_offset = ifd.next_ifd_offset;
        let relink = match predecessor {
            None => Relink::Header {
                field: header.first_ifd_offset_field(),
                new_offset,
            },
            Some(pred) => Relink::Predecessor {
                ifd_offset: pred.offset,
                field: pred.next_offset_field(),
                new_offset,
            },
        };

        DeletionPlan {
            ordinal,
            ifd_offset: ifd.offset,
            directory: ifd.span(),
            payload,
            tag_values,
            relink,
        }
    }

    /// Pixel data ranges, empty if the page has no payload.
    pub fn payload_ranges(&self) -> impl Iterator<Item = ByteRange> + '_ {
        self.payload
            .iter()
            .flat_map(|p| p.chunks.iter().copied())
    }

    /// All ranges to zero, in application order.
    pub fn erased_ranges(&self) -> impl Iterator<Item = ByteRange> + '_ {
        iter::once(self.directory)
            .chain(self.payload_ranges())
            .chain(self.tag_values.iter().map(|v| v.range))
    }

    /// Total number of bytes zeroed, counting overlaps twice.
    pub fn erased_bytes(&self) -> u64 {
        self.erased_ranges()
            .fold(0u64, |acc, r| acc.saturating_add(r.length))
    }

    /// Check every write lands inside a file of `file_size` bytes.
    pub fn validate(&self, file_size: u64) -> Result<(), EditError> {
        for range in self.erased_ranges() {
            range.check_within(file_size)?;
        }
        self.relink.field().check_within(file_size)
    }
}
