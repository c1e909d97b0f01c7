//! Test utilities for integration tests.
//!
//! [`TiffBuilder`] lays out a little-endian TIFF or BigTIFF file page by page
//! and records where every piece ended up, so tests can check exactly which
//! bytes an edit touched.

use std::ops::Range;

// =============================================================================
// Page descriptions
// =============================================================================

/// How a synthetic page stores its pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    None,
    Strips,
    Tiles,
}

/// A page to be written by [`TiffBuilder`].
#[derive(Debug, Clone)]
pub struct PageSpec {
    pub layout: Layout,
    pub chunks: Vec<Vec<u8>>,
    pub description: Option<String>,
}

impl PageSpec {
    /// A stripped page with one strip per entry in `chunks`.
    pub fn strips(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            layout: Layout::Strips,
            chunks,
            description: None,
        }
    }

    /// A tiled page with one tile per entry in `chunks`.
    pub fn tiles(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            layout: Layout::Tiles,
            chunks,
            description: None,
        }
    }

    /// A page without pixel data tags.
    pub fn empty() -> Self {
        Self {
            layout: Layout::None,
            chunks: Vec::new(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Chunk data filled with `fill`, one vector per chunk.
pub fn chunks(fill: u8, count: usize, len: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| vec![fill.wrapping_add(i as u8); len])
        .collect()
}

// =============================================================================
// Built file
// =============================================================================

/// Where one page was written.
#[derive(Debug, Clone)]
pub struct BuiltPage {
    pub ifd_offset: usize,
    /// Count field, entries and next pointer
    pub directory: Range<usize>,
    /// Next-IFD offset field
    pub next_field: Range<usize>,
    /// Tile or strip data
    pub payload: Vec<Range<usize>>,
    /// Out-of-line tag values (description and bookkeeping arrays)
    pub external: Vec<Range<usize>>,
    /// (tag, position of the entry)
    pub entries: Vec<(u16, usize)>,
}

impl BuiltPage {
    /// Position of the entry for `tag`.
    pub fn entry_position(&self, tag: u16) -> usize {
        self.entries
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, pos)| *pos)
            .unwrap_or_else(|| panic!("page has no entry for tag {}", tag))
    }

    /// Every range owned by this page.
    pub fn owned_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = vec![self.directory.clone()];
        ranges.extend(self.payload.iter().cloned());
        ranges.extend(self.external.iter().cloned());
        ranges
    }
}

/// A synthetic file and its layout.
#[derive(Debug, Clone)]
pub struct BuiltTiff {
    pub data: Vec<u8>,
    pub big: bool,
    pub first_ifd_field: Range<usize>,
    pub pages: Vec<BuiltPage>,
}

impl BuiltTiff {
    /// Width of the count field inside an entry.
    pub fn entry_count_width(&self) -> usize {
        if self.big {
            8
        } else {
            4
        }
    }

    /// Overwrite the element count of `tag` on page `index` (0-based).
    pub fn set_entry_count(&mut self, index: usize, tag: u16, count: u64) {
        let pos = self.pages[index].entry_position(tag) + 4;
        let width = self.entry_count_width();
        self.data[pos..pos + width].copy_from_slice(&count.to_le_bytes()[..width]);
    }

    /// Overwrite the tag id of an entry on page `index` (0-based).
    pub fn set_entry_tag(&mut self, index: usize, tag: u16, new_tag: u16) {
        let pos = self.pages[index].entry_position(tag);
        self.data[pos..pos + 2].copy_from_slice(&new_tag.to_le_bytes());
    }
}

// =============================================================================
// Builder
// =============================================================================

const IMAGE_WIDTH: u16 = 256;
const IMAGE_LENGTH: u16 = 257;
const IMAGE_DESCRIPTION: u16 = 270;
pub const STRIP_OFFSETS: u16 = 273;
pub const STRIP_BYTE_COUNTS: u16 = 279;
const TILE_WIDTH: u16 = 322;
const TILE_LENGTH: u16 = 323;
pub const TILE_OFFSETS: u16 = 324;
pub const TILE_BYTE_COUNTS: u16 = 325;

const SHORT: u16 = 3;
const ASCII: u16 = 2;
const LONG: u16 = 4;
const LONG8: u16 = 16;

/// One entry before it is encoded.
struct EntryDraft {
    tag: u16,
    field_type: u16,
    count: u64,
    /// Raw value field contents, or the offset of external data
    value: Vec<u8>,
}

/// Builds little-endian TIFF (42) or BigTIFF (43) files.
#[derive(Debug, Clone, Default)]
pub struct TiffBuilder {
    big: bool,
    pages: Vec<PageSpec>,
}

impl TiffBuilder {
    pub fn classic() -> Self {
        Self {
            big: false,
            pages: Vec::new(),
        }
    }

    pub fn bigtiff() -> Self {
        Self {
            big: true,
            pages: Vec::new(),
        }
    }

    pub fn page(mut self, page: PageSpec) -> Self {
        self.pages.push(page);
        self
    }

    fn offset_width(&self) -> usize {
        if self.big {
            8
        } else {
            4
        }
    }

    fn offset_type(&self) -> u16 {
        if self.big {
            LONG8
        } else {
            LONG
        }
    }

    fn push_offset(&self, data: &mut Vec<u8>, value: u64) {
        data.extend_from_slice(&value.to_le_bytes()[..self.offset_width()]);
    }

    /// Pad `bytes` to a full value field.
    fn value_field(&self, bytes: &[u8]) -> Vec<u8> {
        let mut field = bytes.to_vec();
        field.resize(self.offset_width(), 0);
        field
    }

    pub fn build(self) -> BuiltTiff {
        let mut data = Vec::new();
        let first_ifd_field;

        if self.big {
            data.extend_from_slice(b"II");
            data.extend_from_slice(&43u16.to_le_bytes());
            data.extend_from_slice(&8u16.to_le_bytes());
            data.extend_from_slice(&0u16.to_le_bytes());
            first_ifd_field = 8..16;
        } else {
            data.extend_from_slice(b"II");
            data.extend_from_slice(&42u16.to_le_bytes());
            first_ifd_field = 4..8;
        }
        data.resize(first_ifd_field.end, 0);

        let mut pages = Vec::with_capacity(self.pages.len());
        for spec in &self.pages {
            pages.push(self.write_page(&mut data, spec));
        }

        // Link the chain
        let mut link = first_ifd_field.clone();
        for page in &pages {
            let offset = (page.ifd_offset as u64).to_le_bytes();
            data[link.clone()].copy_from_slice(&offset[..link.len()]);
            link = page.next_field.clone();
        }

        BuiltTiff {
            data,
            big: self.big,
            first_ifd_field,
            pages,
        }
    }

    fn write_page(&self, data: &mut Vec<u8>, spec: &PageSpec) -> BuiltPage {
        let mut payload = Vec::new();
        let mut external = Vec::new();

        for chunk in &spec.chunks {
            let start = data.len();
            data.extend_from_slice(chunk);
            payload.push(start..data.len());
        }

        let mut drafts = vec![
            EntryDraft {
                tag: IMAGE_WIDTH,
                field_type: SHORT,
                count: 1,
                value: self.value_field(&64u16.to_le_bytes()),
            },
            EntryDraft {
                tag: IMAGE_LENGTH,
                field_type: SHORT,
                count: 1,
                value: self.value_field(&64u16.to_le_bytes()),
            },
        ];

        if let Some(ref description) = spec.description {
            let mut text = description.clone().into_bytes();
            text.push(0);
            let count = text.len() as u64;
            let value = if text.len() > self.offset_width() {
                let start = data.len();
                data.extend_from_slice(&text);
                external.push(start..data.len());
                self.value_field(&(start as u64).to_le_bytes()[..self.offset_width()])
            } else {
                self.value_field(&text)
            };
            drafts.push(EntryDraft {
                tag: IMAGE_DESCRIPTION,
                field_type: ASCII,
                count,
                value,
            });
        }

        let pair = match spec.layout {
            Layout::None => None,
            Layout::Strips => Some((STRIP_OFFSETS, STRIP_BYTE_COUNTS)),
            Layout::Tiles => {
                for tag in [TILE_WIDTH, TILE_LENGTH] {
                    drafts.push(EntryDraft {
                        tag,
                        field_type: SHORT,
                        count: 1,
                        value: self.value_field(&16u16.to_le_bytes()),
                    });
                }
                Some((TILE_OFFSETS, TILE_BYTE_COUNTS))
            }
        };

        if let Some((offsets_tag, counts_tag)) = pair {
            let addresses: Vec<u64> = payload.iter().map(|r| r.start as u64).collect();
            let lengths: Vec<u64> = payload.iter().map(|r| r.len() as u64).collect();

            for (tag, values) in [(offsets_tag, addresses), (counts_tag, lengths)] {
                let value = if values.len() == 1 {
                    self.value_field(&values[0].to_le_bytes()[..self.offset_width()])
                } else {
                    let start = data.len();
                    for v in &values {
                        self.push_offset(data, *v);
                    }
                    external.push(start..data.len());
                    self.value_field(&(start as u64).to_le_bytes()[..self.offset_width()])
                };
                drafts.push(EntryDraft {
                    tag,
                    field_type: self.offset_type(),
                    count: values.len() as u64,
                    value,
                });
            }
        }

        drafts.sort_by_key(|d| d.tag);

        // Word-align the directory
        if data.len() % 2 == 1 {
            data.push(0);
        }

        let ifd_offset = data.len();
        let count_width = if self.big { 8 } else { 2 };
        data.extend_from_slice(&(drafts.len() as u64).to_le_bytes()[..count_width]);

        let mut entries = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            entries.push((draft.tag, data.len()));
            data.extend_from_slice(&draft.tag.to_le_bytes());
            data.extend_from_slice(&draft.field_type.to_le_bytes());
            self.push_offset(data, draft.count);
            data.extend_from_slice(&draft.value);
        }

        let next_start = data.len();
        self.push_offset(data, 0);
        let next_field = next_start..data.len();

        BuiltPage {
            ifd_offset,
            directory: ifd_offset..data.len(),
            next_field,
            payload,
            external,
            entries,
        }
    }
}

// =============================================================================
// Assertions
// =============================================================================

/// Assert `after` differs from `before` only inside `allowed`.
pub fn assert_changed_only_within(before: &[u8], after: &[u8], allowed: &[Range<usize>]) {
    assert_eq!(before.len(), after.len(), "file length changed");
    for (i, (a, b)) in before.iter().zip(after).enumerate() {
        if a != b {
            assert!(
                allowed.iter().any(|r| r.contains(&i)),
                "byte {} changed from 0x{:02X} to 0x{:02X} outside the expected ranges",
                i,
                a,
                b
            );
        }
    }
}

/// Assert every byte of `ranges` is zero.
pub fn assert_zeroed(data: &[u8], ranges: &[Range<usize>]) {
    for range in ranges {
        assert!(
            data[range.clone()].iter().all(|&b| b == 0),
            "range {:?} was not zeroed",
            range
        );
    }
}

/// Read a little-endian offset of `range.len()` bytes.
pub fn read_offset(data: &[u8], range: Range<usize>) -> u64 {
    let mut buf = [0u8; 8];
    buf[..range.len()].copy_from_slice(&data[range]);
    u64::from_le_bytes(buf)
}
