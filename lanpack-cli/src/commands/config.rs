use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use uuid::Uuid;

use crate::error::CliError;
use crate::settings::{Settings, save_settings, settings_path};

/// Show current settings and where the database resolves to.
pub(crate) fn run_config_show(settings: &Settings, db_path: &Path) -> Result<(), CliError> {
    let path = settings_path();

    log::info!(
        "{}",
        "lanpack Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");
    if path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    log::info!(
        "  Database:      {}",
        db_path.display().if_supports_color(Stdout, |t| t.cyan())
    );
    match settings.import.default_storage {
        Some(id) => log::info!("  Storage:       {}", id),
        None => log::info!(
            "  Storage:       {}",
            "(library default)".if_supports_color(Stdout, |t| t.dimmed())
        ),
    }
    log::info!("  Prune:         {}", settings.import.prune);
    Ok(())
}

pub(crate) fn run_config_path() -> Result<(), CliError> {
    println!("{}", settings_path().display());
    Ok(())
}

pub(crate) fn run_config_set_db(mut settings: Settings, path: PathBuf) -> Result<(), CliError> {
    let path = std::path::absolute(&path)?;
    settings.database.path = Some(path.clone());
    save_settings(&settings)
        .map_err(|e| CliError::config(format!("failed to save settings: {e}")))?;
    log::info!(
        "Database set to {}",
        path.display().if_supports_color(Stdout, |t| t.cyan())
    );
    Ok(())
}

pub(crate) fn run_config_set_storage(mut settings: Settings, id: Uuid) -> Result<(), CliError> {
    settings.import.default_storage = Some(id);
    save_settings(&settings)
        .map_err(|e| CliError::config(format!("failed to save settings: {e}")))?;
    log::info!("Default import storage set to {}", id);
    Ok(())
}
