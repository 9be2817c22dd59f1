//! `~/.config/lanpack/settings.toml`: database path and import defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub import: ImportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct DatabaseSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct ImportSettings {
    pub default_storage: Option<Uuid>,
    #[serde(default)]
    pub prune: bool,
}

/// Returns `~/.config/lanpack/settings.toml`.
pub(crate) fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("lanpack").join("settings.toml")
}

/// Default database location, next to the settings file.
pub(crate) fn default_database_path() -> PathBuf {
    let data = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    data.join("lanpack").join("library.db")
}

/// Load settings from disk, returning defaults if missing or corrupt.
pub(crate) fn load_settings() -> Settings {
    let path = settings_path();
    match std::fs::read_to_string(&path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Failed to parse settings at {}: {}", path.display(), e);
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

/// Save settings to disk atomically (write to temp, then rename).
pub(crate) fn save_settings(settings: &Settings) -> std::io::Result<()> {
    let path = settings_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(settings).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

/// Resolve the database path: CLI override, then settings, then the default.
pub(crate) fn resolve_database_path(cli_override: Option<PathBuf>, settings: &Settings) -> PathBuf {
    cli_override
        .or_else(|| settings.database.path.clone())
        .unwrap_or_else(default_database_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert!(settings.database.path.is_none());
        assert!(settings.import.default_storage.is_none());
        assert!(!settings.import.prune);
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let mut settings = Settings::default();
        settings.database.path = Some(PathBuf::from("/srv/lan/library.db"));
        settings.import.default_storage = Some(Uuid::new_v4());
        settings.import.prune = true;

        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back.database.path, settings.database.path);
        assert_eq!(back.import.default_storage, settings.import.default_storage);
        assert!(back.import.prune);
    }

    #[test]
    fn cli_override_wins() {
        let mut settings = Settings::default();
        settings.database.path = Some(PathBuf::from("from-settings.db"));
        assert_eq!(
            resolve_database_path(Some(PathBuf::from("cli.db")), &settings),
            PathBuf::from("cli.db")
        );
        assert_eq!(
            resolve_database_path(None, &settings),
            PathBuf::from("from-settings.db")
        );
    }
}
