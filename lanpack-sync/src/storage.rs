//! Resolving storage locations to filesystem roots.

use std::path::PathBuf;

use lanpack_db::storage;
use lanpack_model::{StorageLocation, StorageLocationType};
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::SyncError;
use crate::package::check_file_name;

/// Source of storage locations for payload files.
pub trait StorageResolver {
    fn location(&self, id: Uuid) -> Result<Option<StorageLocation>, SyncError>;

    fn default_location(
        &self,
        location_type: StorageLocationType,
    ) -> Result<Option<StorageLocation>, SyncError>;

    /// On-disk path of an existing payload file.
    ///
    /// Uses the record's own location when it has one, otherwise the default
    /// location of `location_type`.
    fn payload_path(
        &self,
        location_type: StorageLocationType,
        location_id: Option<Uuid>,
        file_name: &str,
    ) -> Result<PathBuf, SyncError> {
        let location = match location_id {
            Some(id) => self.location(id)?,
            None => self.default_location(location_type)?,
        };
        let Some(location) = location else {
            return Err(SyncError::MissingPayload(format!(
                "no {} storage location for '{file_name}'",
                location_type.as_str()
            )));
        };
        Ok(PathBuf::from(location.path).join(check_file_name(file_name)?))
    }
}

/// Resolves locations from the library database.
pub struct DbStorageResolver<'a> {
    conn: &'a Connection,
}

impl<'a> DbStorageResolver<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl StorageResolver for DbStorageResolver<'_> {
    fn location(&self, id: Uuid) -> Result<Option<StorageLocation>, SyncError> {
        Ok(storage::get_storage_location(self.conn, id)?)
    }

    fn default_location(
        &self,
        location_type: StorageLocationType,
    ) -> Result<Option<StorageLocation>, SyncError> {
        Ok(storage::default_storage_location(self.conn, location_type)?)
    }
}

/// Where each payload kind lands during one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
    pub archives: StorageLocation,
    pub media: StorageLocation,
    pub saves: StorageLocation,
}

impl Destinations {
    /// Resolve the caller's chosen location.
    ///
    /// Archives go to the chosen location. Media and saves go to the default
    /// location of their type when it is usable, otherwise to the chosen one.
    /// Fails with [`SyncError::StorageUnavailable`] when the chosen location
    /// does not exist or is not a directory.
    pub fn resolve(resolver: &dyn StorageResolver, chosen: Uuid) -> Result<Self, SyncError> {
        let Some(location) = resolver.location(chosen)? else {
            return Err(SyncError::StorageUnavailable(format!(
                "no storage location with id '{chosen}'"
            )));
        };
        if !usable(&location) {
            return Err(SyncError::StorageUnavailable(format!(
                "'{}' is not a directory",
                location.path
            )));
        }

        let fallback = |location_type: StorageLocationType| -> Result<StorageLocation, SyncError> {
            Ok(resolver
                .default_location(location_type)?
                .filter(usable)
                .unwrap_or_else(|| location.clone()))
        };

        Ok(Self {
            media: fallback(StorageLocationType::Media)?,
            saves: fallback(StorageLocationType::Save)?,
            archives: location.clone(),
        })
    }

    pub fn for_type(&self, location_type: StorageLocationType) -> &StorageLocation {
        match location_type {
            StorageLocationType::Archive => &self.archives,
            StorageLocationType::Media => &self.media,
            StorageLocationType::Save => &self.saves,
        }
    }
}

fn usable(location: &StorageLocation) -> bool {
    std::path::Path::new(&location.path).is_dir()
}
