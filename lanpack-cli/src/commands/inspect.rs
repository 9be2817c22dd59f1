use std::path::Path;

use lanpack_sync::{PackageReader, describe_manifest};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use serde::Serialize;

use crate::commands::format_bytes;
use crate::error::CliError;

#[derive(Serialize)]
struct PackageInfo<'a> {
    kind: lanpack_model::RootKind,
    id: uuid::Uuid,
    name: &'a str,
    manifest_version: &'a str,
    entries: usize,
    records: Vec<lanpack_model::DescriptorInfo>,
}

/// Print a package's root and sub-records. The library is not opened.
pub(crate) fn run_inspect(package: &Path, json: bool) -> Result<(), CliError> {
    let mut reader = PackageReader::open(package)?;
    let manifest = reader.read_manifest()?;
    let records = describe_manifest(&manifest);

    let info = PackageInfo {
        kind: manifest.kind(),
        id: manifest.id(),
        name: manifest.name(),
        manifest_version: manifest.manifest_version(),
        entries: reader.entry_names().len(),
        records,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    log::info!(
        "{} {} ({})",
        info.kind.if_supports_color(Stdout, |t| t.cyan()),
        info.name.if_supports_color(Stdout, |t| t.bold()),
        info.id,
    );
    log::info!(
        "  Manifest version {}, {} archive entries",
        info.manifest_version,
        info.entries
    );
    log::info!("");

    if info.records.is_empty() {
        log::info!("  {}", "No sub-records.".if_supports_color(Stdout, |t| t.dimmed()));
        return Ok(());
    }

    let mut current_kind = None;
    for record in &info.records {
        if current_kind != Some(record.kind) {
            current_kind = Some(record.kind);
            log::info!("  {}:", record.kind.if_supports_color(Stdout, |t| t.bold()));
        }
        match record.size {
            Some(size) => log::info!(
                "    {} {} {}",
                record.id.if_supports_color(Stdout, |t| t.dimmed()),
                record.name,
                format!("({})", format_bytes(size)).if_supports_color(Stdout, |t| t.dimmed()),
            ),
            None => log::info!(
                "    {} {}",
                record.id.if_supports_color(Stdout, |t| t.dimmed()),
                record.name
            ),
        }
    }

    let total: u64 = info.records.iter().filter_map(|r| r.size).sum();
    log::info!("");
    log::info!("  {} records, {} of payloads", info.records.len(), format_bytes(total));
    Ok(())
}
