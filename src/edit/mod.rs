//! Inspecting and deleting pages of a TIFF file in place.
//!
//! Deleted bytes are zero-filled rather than removed, so the file length and
//! every surviving offset stay the same.

mod chain;
mod editor;
mod plan;
mod report;

pub use chain::{locate, resolve_predecessor, IfdChain};
pub use editor::PageEditor;
pub use plan::{DeletionPlan, Relink, TagValueRange};
pub use report::{ChainReport, EntrySummary, PageSummary};
