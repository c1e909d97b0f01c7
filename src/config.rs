//! Command-line configuration for tiffsnip.
//!
//! # Usage
//!
//! ```text
//! tiffsnip <PATH>            # list the pages of PATH
//! tiffsnip <PATH> <PAGE>     # delete page PAGE (1-based) from PATH
//! tiffsnip <PATH> <PAGE> --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `TIFFSNIP_FORMAT` - Report format, `text` or `json` (default: text)
//! - `TIFFSNIP_VERBOSE` - Enable debug logging
//! - `RUST_LOG` - Overrides the log filter entirely

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

// =============================================================================
// Output Format
// =============================================================================

/// How reports are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON document on stdout
    Json,
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// tiffsnip - delete a page from a multi-page TIFF in place.
///
/// Without PAGE the file is only inspected. With PAGE, that page's directory,
/// pixel data and out-of-line tag values are zero-filled and the page is
/// unlinked. The file length never changes.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiffsnip")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// TIFF or BigTIFF file to inspect or edit.
    pub path: PathBuf,

    /// Page to delete, counting from 1. Omit to inspect only.
    pub page: Option<usize>,

    /// Print what would be erased without writing anything.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "TIFFSNIP_FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false, env = "TIFFSNIP_VERBOSE")]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.page == Some(0) {
            return Err("Pages are numbered from 1".to_string());
        }

        if self.dry_run && self.page.is_none() {
            return Err("--dry-run needs a PAGE to plan a deletion for".to_string());
        }

        Ok(())
    }

    /// Whether this run modifies the file.
    pub fn is_mutating(&self) -> bool {
        self.page.is_some() && !self.dry_run
    }
}

// =============================================================================
// Tests
// =============================================================================
