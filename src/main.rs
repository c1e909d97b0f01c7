//! tiffsnip - delete a page from a multi-page TIFF in place.
//!
//! This binary wires the CLI configuration to [`tiffsnip::PageEditor`].

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiffsnip::{ChainReport, Config, DeletionPlan, OutputFormat, PageEditor, Relink};

fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match config.page {
        None => run_inspect(&config),
        Some(page) => run_delete(&config, page),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tiffsnip=debug"
    } else {
        "tiffsnip=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Inspect
// =============================================================================

fn run_inspect(config: &Config) -> ExitCode {
    let mut editor = match PageEditor::open_path_read_only(&config.path) {
        Ok(editor) => editor,
        Err(e) => {
            error!("Failed to open {}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let report = match editor.inspect() {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to read {}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match config.format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => return print_json(&report),
    }

    ExitCode::SUCCESS
}

fn print_report(report: &ChainReport) {
    println!("Format: {}", report.format.name());
    println!("File size: {} bytes", report.file_size);
    println!("First IFD: 0x{:x}", report.first_ifd_offset);
    println!("Pages: {}", report.page_count());

    for page in &report.pages {
        println!();
        println!("Page #{} at 0x{:x}", page.ordinal, page.ifd_offset);
        println!("  Entries: {}", page.entry_count);
        match page.layout {
            Some(layout) => println!(
                "  {} data: {} chunk(s), {} bytes",
                layout, page.chunk_count, page.payload_bytes
            ),
            None => println!("  No pixel data"),
        }
        if let Some(ref description) = page.description {
            println!("  Description: {}", description);
        }
        for issue in &page.issues {
            println!("  Issue: {}", issue);
        }
        for entry in &page.entries {
            let name = entry.tag_name.unwrap_or("?");
            match entry.external {
                Some(range) => println!(
                    "    TAG: {} ({}), Type: {}, Count: {}, Data: 0x{:x}+{}",
                    entry.tag_id, name, entry.field_type, entry.count, range.offset, range.length
                ),
                None => println!(
                    "    TAG: {} ({}), Type: {}, Count: {}, inline",
                    entry.tag_id, name, entry.field_type, entry.count
                ),
            }
        }
        println!("  Next IFD: 0x{:x}", page.next_ifd_offset);
    }
}

// =============================================================================
// Delete
// =============================================================================

fn run_delete(config: &Config, page: usize) -> ExitCode {
    let opened = if config.is_mutating() {
        PageEditor::open_path(&config.path)
    } else {
        PageEditor::open_path_read_only(&config.path)
    };
    let mut editor = match opened {
        Ok(editor) => editor,
        Err(e) => {
            error!("Failed to open {}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let plan = match editor.plan_deletion(page) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Cannot delete page {}: {}", page, e);
            return ExitCode::FAILURE;
        }
    };

    if config.dry_run {
        info!("Dry run: nothing written");
    } else if let Err(e) = editor.apply(&plan) {
        error!("Deleting page {} failed part way: {}", page, e);
        error!("The file may now hold an erased but still linked directory");
        return ExitCode::FAILURE;
    }

    match config.format {
        OutputFormat::Text => print_plan(&plan, config.dry_run),
        OutputFormat::Json => return print_json(&plan),
    }

    ExitCode::SUCCESS
}

fn print_plan(plan: &DeletionPlan, dry_run: bool) {
    let verb = if dry_run { "Would zero" } else { "Zeroed" };

    println!("Page #{} at 0x{:x}", plan.ordinal, plan.ifd_offset);
    println!(
        "  {} directory: 0x{:x}+{}",
        verb, plan.directory.offset, plan.directory.length
    );
    if let Some(ref payload) = plan.payload {
        println!(
            "  {} {} data: {} chunk(s), {} bytes",
            verb,
            payload.layout,
            payload.chunk_count(),
            payload.total_bytes()
        );
    }
    for value in &plan.tag_values {
        println!(
            "  {} tag {} data: 0x{:x}+{}",
            verb, value.tag_id, value.range.offset, value.range.length
        );
    }
    match plan.relink {
        Relink::Header { new_offset, .. } => {
            println!("  First IFD offset -> 0x{:x}", new_offset)
        }
        Relink::Predecessor {
            ifd_offset,
            new_offset,
            ..
        } => println!(
            "  Next IFD of 0x{:x} -> 0x{:x}",
            ifd_offset, new_offset
        ),
    }
    println!("  Total: {} bytes", plan.erased_bytes());
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize report: {}", e);
            ExitCode::FAILURE
        }
    }
}
