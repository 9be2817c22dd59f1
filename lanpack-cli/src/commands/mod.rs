pub(crate) mod config;
pub(crate) mod export;
pub(crate) mod import;
pub(crate) mod inspect;
pub(crate) mod list;
pub(crate) mod storage;

use std::path::Path;

use lanpack_sync::{ItemError, Selection};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use rusqlite::Connection;

use crate::cli_types::SelectionArgs;
use crate::error::CliError;

/// Open (creating if needed) the library database at `path`.
pub(crate) fn open_library(path: &Path) -> Result<Connection, CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    log::debug!("Opening library {}", path.display());
    Ok(lanpack_db::open_database(path)?)
}

pub(crate) fn selection(args: SelectionArgs) -> Selection {
    match args.only {
        Some(ids) => Selection::only(ids),
        None => Selection::All,
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Print per-item failures after a run.
pub(crate) fn print_item_errors(errors: &[ItemError]) {
    for e in errors {
        log::warn!(
            "  {} {} '{}' ({}): {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            e.item.kind,
            e.item.name,
            e.item.id,
            e.message,
        );
    }
}
