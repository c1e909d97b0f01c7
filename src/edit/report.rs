//! Read-only inspection reports.

use serde::Serialize;

use crate::format::tiff::{Ifd, IfdEntry, PayloadExtents, PixelLayout, TiffFormat};
use crate::io::ByteRange;

/// Summary of every page in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub format: TiffFormat,
    pub file_size: u64,
    pub first_ifd_offset: u64,
    pub pages: Vec<PageSummary>,
}

impl ChainReport {
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// One page of a [`ChainReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    /// 1-based position in the chain
    pub ordinal: usize,
    pub ifd_offset: u64,
    pub entry_count: u64,
    pub next_ifd_offset: u64,
    pub layout: Option<PixelLayout>,
    pub chunk_count: usize,
    pub payload_bytes: u64,
    /// Bytes of tag data stored outside the directory
    pub external_value_bytes: u64,
    pub description: Option<String>,
    pub entries: Vec<EntrySummary>,
    /// Problems found while resolving this page's data
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl PageSummary {
    pub fn new(
        ordinal: usize,
        ifd: &Ifd,
        payload: Option<&PayloadExtents>,
        description: Option<String>,
    ) -> Self {
        let external_value_bytes = ifd
            .external_values()
            .fold(0u64, |acc, (_, range)| acc.saturating_add(range.length));

        PageSummary {
            ordinal,
            ifd_offset: ifd.offset,
            entry_count: ifd.entry_count(),
            next_ifd_offset: ifd.next_ifd_offset,
            layout: payload.map(|p| p.layout),
            chunk_count: payload.map_or(0, PayloadExtents::chunk_count),
            payload_bytes: payload.map_or(0, PayloadExtents::total_bytes),
            external_value_bytes,
            description,
            entries: ifd.entries.iter().map(EntrySummary::from).collect(),
            issues: Vec::new(),
        }
    }
}

/// One directory entry of a [`PageSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub tag_id: u16,
    pub tag_name: Option<&'static str>,
    pub field_type: u16,
    pub count: u64,
    /// Location of the value when it is not stored inline
    pub external: Option<ByteRange>,
}

impl From<&IfdEntry> for EntrySummary {
    fn from(entry: &IfdEntry) -> Self {
        EntrySummary {
            tag_id: entry.tag_id,
            tag_name: entry.tag().map(|t| t.name()),
            field_type: entry.field_type_raw,
            count: entry.count,
            external: entry.external_range(),
        }
    }
}
