use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use lanpack_model::RootKind;
use lanpack_sync::ExportContext;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use rusqlite::Connection;
use uuid::Uuid;

use crate::cli_types::SelectionArgs;
use crate::commands::{format_bytes, print_item_errors, selection};
use crate::error::CliError;
use crate::progress::BarObserver;

pub(crate) fn run_export(
    conn: &Connection,
    kind: RootKind,
    id: Uuid,
    output: &Path,
    selection_args: SelectionArgs,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let bar = BarObserver::new("Exporting", quiet || json);
    let mut ctx = ExportContext::new(conn).with_observer(&bar);

    let (count, total_size) = {
        let descriptors = ctx.initialize(kind, id)?;
        let size: u64 = descriptors.iter().filter_map(|d| d.size).sum();
        (descriptors.len(), size)
    };
    let name = ctx.graph().map(|g| g.name().to_string()).unwrap_or_default();
    if !json {
        log::info!(
            "Exporting {} '{}' ({} sub-records, {})",
            kind,
            name.if_supports_color(Stdout, |t| t.bold()),
            count,
            format_bytes(total_size),
        );
    }

    ctx.prepare_queue(&selection(selection_args))?;

    let file = File::create(output)?;
    let result = ctx.export_queue(BufWriter::new(file));
    bar.finish();
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            // Drop the partial package.
            let _ = std::fs::remove_file(output);
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let written = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    log::info!(
        "{} {} exported, {} failed -> {} ({})",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        summary.exported,
        summary.failed,
        output.display().if_supports_color(Stdout, |t| t.cyan()),
        format_bytes(written),
    );
    print_item_errors(&summary.errors);
    Ok(())
}
