use std::path::Path;

use lanpack_model::StorageLocationType;
use lanpack_sync::{ImportContext, ImportOptions};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use rusqlite::Connection;
use uuid::Uuid;

use crate::cli_types::SelectionArgs;
use crate::commands::{print_item_errors, selection};
use crate::error::CliError;
use crate::progress::BarObserver;

/// Pick the storage location for archive payloads: explicit id, else the
/// library's default archive location.
fn resolve_storage(conn: &Connection, storage: Option<Uuid>) -> Result<Uuid, CliError> {
    if let Some(id) = storage {
        return Ok(id);
    }
    lanpack_db::default_storage_location(conn, StorageLocationType::Archive)?
        .map(|location| location.id)
        .ok_or_else(|| {
            CliError::config(
                "no storage location given and no default archive location; \
                 pass --storage or run 'lanpack storage add <dir> --default'",
            )
        })
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn run_import(
    conn: &Connection,
    package: &Path,
    storage: Option<Uuid>,
    options: ImportOptions,
    selection_args: SelectionArgs,
    dry_run: bool,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let storage = resolve_storage(conn, storage)?;
    let bar = BarObserver::new("Importing", quiet || json);
    let mut ctx = ImportContext::open(conn, package)?
        .with_options(options)
        .with_observer(&bar);

    let count = ctx.initialize()?.len();
    if !json {
        if let Some(manifest) = ctx.manifest() {
            log::info!(
                "Importing {} '{}' ({} sub-records){}",
                manifest.kind(),
                manifest.name().if_supports_color(Stdout, |t| t.bold()),
                count,
                if options.prune { ", pruning" } else { "" },
            );
        }
    }

    ctx.prepare_queue(&selection(selection_args), storage)?;
    let result = ctx.import_queue();
    bar.finish();
    let summary = result?;

    let saved = if dry_run {
        None
    } else {
        Some(ctx.save_changes()?)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    log::info!(
        "{} '{}' {}: {} added, {} updated, {} failed",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        summary.name,
        if summary.root_existed { "updated" } else { "created" },
        summary.added,
        summary.updated,
        summary.failed,
    );
    print_item_errors(&summary.errors);

    match saved {
        Some(saved) => log::debug!(
            "{} rows inserted, {} updated, {} deleted",
            saved.inserted,
            saved.updated,
            saved.deleted
        ),
        None => log::info!(
            "{}",
            "Dry run: nothing was saved.".if_supports_color(Stdout, |t| t.yellow())
        ),
    }
    Ok(())
}
