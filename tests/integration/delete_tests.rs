//! Page deletion integration tests.
//!
//! Tests verify:
//! - File length never changes
//! - The chain gets one page shorter and the remaining pages keep their order
//! - Every byte owned by the deleted page is zeroed
//! - Nothing else changes except the one relinked offset field
//! - Malformed bookkeeping is rejected with no bytes written

use std::io::{Cursor, Write};

use tiffsnip::{EditError, PageEditor, PixelLayout, Relink};

use super::test_utils::{
    assert_changed_only_within, assert_zeroed, chunks, read_offset, BuiltTiff, PageSpec,
    TiffBuilder, STRIP_BYTE_COUNTS, TILE_BYTE_COUNTS, TILE_OFFSETS,
};

/// Four pages covering every payload shape.
fn four_page_file(builder: TiffBuilder) -> BuiltTiff {
    builder
        .page(PageSpec::strips(chunks(0x10, 1, 32)).with_description("first page description"))
        .page(PageSpec::strips(chunks(0x20, 3, 16)))
        .page(PageSpec::tiles(chunks(0x30, 4, 24)).with_description("third page description"))
        .page(PageSpec::tiles(chunks(0x40, 1, 48)))
        .build()
}

/// Delete `page` (1-based) and return the edited bytes.
fn delete(built: &BuiltTiff, page: usize) -> Vec<u8> {
    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();
    editor.delete_page(page).unwrap();
    editor.into_inner().into_inner()
}

/// Directory offsets of every remaining page, in chain order.
fn chain_offsets(data: Vec<u8>) -> Vec<u64> {
    let mut editor = PageEditor::open(Cursor::new(data)).unwrap();
    editor
        .inspect()
        .unwrap()
        .pages
        .iter()
        .map(|p| p.ifd_offset)
        .collect()
}

// =============================================================================
// Deleting every position
// =============================================================================

/// Delete each page in turn from a fresh copy and check all invariants.
fn check_every_position(built: &BuiltTiff) {
    let original: Vec<u64> = built.pages.iter().map(|p| p.ifd_offset as u64).collect();

    for (index, page) in built.pages.iter().enumerate() {
        let after = delete(built, index + 1);

        // Length invariance
        assert_eq!(after.len(), built.data.len());

        // Erasure completeness
        let owned = page.owned_ranges();
        assert_zeroed(&after, &owned);

        // Only the owned ranges and the relink field may differ
        let relink_field = if index == 0 {
            built.first_ifd_field.clone()
        } else {
            built.pages[index - 1].next_field.clone()
        };
        let mut allowed = owned;
        allowed.push(relink_field.clone());
        assert_changed_only_within(&built.data, &after, &allowed);

        // The relink field now holds the deleted page's old next pointer
        assert_eq!(
            read_offset(&after, relink_field),
            read_offset(&built.data, page.next_field.clone())
        );

        // Chain shortening
        let mut expected = original.clone();
        expected.remove(index);
        assert_eq!(chain_offsets(after), expected);
    }
}

#[test]
fn test_delete_every_position_classic() {
    check_every_position(&four_page_file(TiffBuilder::classic()));
}

#[test]
fn test_delete_every_position_bigtiff() {
    check_every_position(&four_page_file(TiffBuilder::bigtiff()));
}

// =============================================================================
// Relink cases
// =============================================================================

#[test]
fn test_delete_first_page_rewrites_header_only() {
    let built = four_page_file(TiffBuilder::classic());
    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();

    let plan = editor.delete_page(1).unwrap();
    let second = built.pages[1].ifd_offset as u64;

    assert!(matches!(
        plan.relink,
        Relink::Header { new_offset, .. } if new_offset == second
    ));
    assert_eq!(editor.header().first_ifd_offset, second);

    let after = editor.into_inner().into_inner();
    assert_eq!(read_offset(&after, 4..8), second);
    // Other pages' next pointers are untouched
    for page in &built.pages[1..] {
        assert_eq!(
            &after[page.directory.clone()],
            &built.data[page.directory.clone()]
        );
    }
}

#[test]
fn test_delete_interior_page_rewrites_predecessor_only() {
    let built = four_page_file(TiffBuilder::bigtiff());
    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();

    let plan = editor.delete_page(3).unwrap();
    let fourth = built.pages[3].ifd_offset as u64;

    match plan.relink {
        Relink::Predecessor {
            ifd_offset,
            field,
            new_offset,
        } => {
            assert_eq!(ifd_offset, built.pages[1].ifd_offset as u64);
            assert_eq!(field.offset, built.pages[1].next_field.start as u64);
            assert_eq!(field.length, 8);
            assert_eq!(new_offset, fourth);
        }
        other => panic!("expected predecessor relink, got {:?}", other),
    }

    let after = editor.into_inner().into_inner();
    assert_eq!(&after[..16], &built.data[..16]);
    assert_eq!(read_offset(&after, built.pages[1].next_field.clone()), fourth);
}

#[test]
fn test_delete_last_page_terminates_chain() {
    let built = four_page_file(TiffBuilder::classic());
    let after = delete(&built, 4);

    assert_eq!(read_offset(&after, built.pages[2].next_field.clone()), 0);
    assert_eq!(chain_offsets(after).len(), 3);
}

#[test]
fn test_delete_only_page_empties_chain() {
    let built = TiffBuilder::classic()
        .page(PageSpec::strips(chunks(0x01, 2, 8)))
        .build();
    let after = delete(&built, 1);

    assert_eq!(read_offset(&after, 4..8), 0);
    assert_zeroed(&after, &built.pages[0].owned_ranges());
}

#[test]
fn test_delete_page_without_payload() {
    let built = TiffBuilder::classic()
        .page(PageSpec::strips(chunks(0x01, 1, 8)))
        .page(PageSpec::empty().with_description("no pixels on this page"))
        .page(PageSpec::strips(chunks(0x03, 1, 8)))
        .build();

    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();
    let plan = editor.delete_page(2).unwrap();
    assert!(plan.payload.is_none());
    assert_eq!(plan.tag_values.len(), 1);
    assert_eq!(plan.tag_values[0].tag_id, 270);

    let after = editor.into_inner().into_inner();
    assert_zeroed(&after, &built.pages[1].owned_ranges());
}

// =============================================================================
// Repeated deletion
// =============================================================================

#[test]
fn test_delete_pages_in_sequence() {
    let built = four_page_file(TiffBuilder::classic());
    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();

    editor.delete_page(2).unwrap();
    editor.delete_page(1).unwrap();
    assert!(matches!(
        editor.delete_page(3),
        Err(EditError::PageNotFound {
            requested: 3,
            page_count: 2
        })
    ));

    let after = editor.into_inner().into_inner();
    assert_eq!(
        chain_offsets(after),
        vec![
            built.pages[2].ifd_offset as u64,
            built.pages[3].ifd_offset as u64
        ]
    );
}

#[test]
fn test_delete_rejects_page_zero() {
    let built = four_page_file(TiffBuilder::classic());
    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();

    assert!(matches!(
        editor.delete_page(0),
        Err(EditError::InvalidPage(0))
    ));
    assert_eq!(editor.into_inner().into_inner(), built.data);
}

// =============================================================================
// Consistency errors write nothing
// =============================================================================

#[test]
fn test_chunk_count_mismatch_writes_nothing() {
    let mut built = four_page_file(TiffBuilder::classic());
    built.set_entry_count(1, STRIP_BYTE_COUNTS, 2);

    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();
    let result = editor.delete_page(2);

    assert!(matches!(
        result,
        Err(EditError::ChunkCountMismatch {
            layout: PixelLayout::Strips,
            offsets: 3,
            byte_counts: 2
        })
    ));
    assert_eq!(editor.into_inner().into_inner(), built.data);
}

#[test]
fn test_missing_byte_counts_writes_nothing() {
    let mut built = four_page_file(TiffBuilder::bigtiff());
    // Rename TileByteCounts to an unrelated private tag
    built.set_entry_tag(2, TILE_BYTE_COUNTS, 65000);

    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();
    assert!(matches!(
        editor.delete_page(3),
        Err(EditError::MissingTag("TileByteCounts"))
    ));
    assert_eq!(editor.into_inner().into_inner(), built.data);
}

#[test]
fn test_tiles_and_strips_together_write_nothing() {
    let mut built = four_page_file(TiffBuilder::classic());
    // Page 4 gains a StripOffsets entry alongside its tiles
    built.set_entry_tag(3, 322, 273);

    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();
    assert!(matches!(
        editor.delete_page(4),
        Err(EditError::AmbiguousLayout(_))
    ));
    assert_eq!(editor.into_inner().into_inner(), built.data);
}

#[test]
fn test_chunk_past_end_writes_nothing() {
    let mut built = TiffBuilder::classic()
        .page(PageSpec::strips(chunks(0x01, 1, 8)))
        .page(PageSpec::tiles(chunks(0x02, 1, 8)))
        .build();

    // Point page 2's single tile past the end of the file
    let pos = built.pages[1].entry_position(TILE_OFFSETS) + 8;
    let beyond = built.data.len() as u32;
    built.data[pos..pos + 4].copy_from_slice(&beyond.to_le_bytes());

    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();
    assert!(matches!(
        editor.delete_page(2),
        Err(EditError::RangeOutOfBounds { .. })
    ));
    assert_eq!(editor.into_inner().into_inner(), built.data);
}

// =============================================================================
// Planning
// =============================================================================

#[test]
fn test_plan_matches_applied_deletion() {
    let built = four_page_file(TiffBuilder::classic());
    let mut editor = PageEditor::open(Cursor::new(built.data.clone())).unwrap();

    let plan = editor.plan_deletion(3).unwrap();
    let page = &built.pages[2];

    assert_eq!(plan.ordinal, 3);
    assert_eq!(plan.ifd_offset, page.ifd_offset as u64);
    assert_eq!(plan.directory.offset, page.directory.start as u64);
    assert_eq!(plan.directory.length, page.directory.len() as u64);

    let payload: Vec<(u64, u64)> = plan
        .payload_ranges()
        .map(|r| (r.offset, r.length))
        .collect();
    let expected: Vec<(u64, u64)> = page
        .payload
        .iter()
        .map(|r| (r.start as u64, r.len() as u64))
        .collect();
    assert_eq!(payload, expected);

    // Description plus the two tile arrays
    assert_eq!(plan.tag_values.len(), 3);

    editor.apply(&plan).unwrap();
    let after = editor.into_inner().into_inner();
    assert_eq!(after, delete(&built, 3));
}

#[test]
fn test_plan_serializes_to_json() {
    let built = four_page_file(TiffBuilder::classic());
    let mut editor = PageEditor::open(Cursor::new(built.data)).unwrap();
    let plan = editor.plan_deletion(1).unwrap();

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["relink"]["kind"], "header");
    assert_eq!(json["payload"]["layout"], "strips");
}

// =============================================================================
// Files on disk
// =============================================================================

#[test]
fn test_delete_page_on_disk() {
    let built = four_page_file(TiffBuilder::bigtiff());
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&built.data).unwrap();
    file.flush().unwrap();

    {
        let mut editor = PageEditor::open_path(file.path()).unwrap();
        editor.delete_page(2).unwrap();
    }

    let after = std::fs::read(file.path()).unwrap();
    assert_eq!(after, delete(&built, 2));

    let mut editor = PageEditor::open_path_read_only(file.path()).unwrap();
    assert_eq!(editor.inspect().unwrap().page_count(), 3);
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = PageEditor::open_path(dir.path().join("missing.tif"));
    assert!(matches!(result, Err(EditError::Io(_))));
}
