use std::path::Path;

use lanpack_model::{StorageLocation, StorageLocationType};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::CliError;

pub(crate) fn run_storage_list(conn: &Connection) -> Result<(), CliError> {
    let locations = lanpack_db::list_storage_locations(conn, None)?;
    if locations.is_empty() {
        log::info!("No storage locations. Add one with 'lanpack storage add <dir> --default'.");
        return Ok(());
    }

    for location in &locations {
        let missing = !Path::new(&location.path).is_dir();
        log::info!(
            "  {} {:<8} {}{}{}",
            location.id.if_supports_color(Stdout, |t| t.dimmed()),
            location.location_type.as_str(),
            location.path.if_supports_color(Stdout, |t| t.cyan()),
            if location.is_default {
                format!(" {}", "(default)".if_supports_color(Stdout, |t| t.green()))
            } else {
                String::new()
            },
            if missing {
                format!(" {}", "(missing)".if_supports_color(Stdout, |t| t.red()))
            } else {
                String::new()
            },
        );
    }
    Ok(())
}

pub(crate) fn run_storage_add(
    conn: &Connection,
    path: &Path,
    location_type: StorageLocationType,
    is_default: bool,
) -> Result<(), CliError> {
    if !path.is_dir() {
        return Err(CliError::other(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    let path = path.canonicalize()?;

    let location = StorageLocation {
        id: Uuid::new_v4(),
        path: path.to_string_lossy().into_owned(),
        location_type,
        is_default,
    };
    lanpack_db::insert_storage_location(conn, &location)?;

    log::info!(
        "{} Added {} location {} ({})",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        location_type.as_str(),
        location.path.if_supports_color(Stdout, |t| t.cyan()),
        location.id,
    );
    Ok(())
}

pub(crate) fn run_storage_remove(conn: &Connection, id: Uuid) -> Result<(), CliError> {
    if lanpack_db::delete_storage_location(conn, id)? {
        log::info!("Removed storage location {}", id);
        Ok(())
    } else {
        Err(CliError::other(format!("no storage location with id {}", id)))
    }
}
