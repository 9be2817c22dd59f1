//! Per-kind conversion between stored rows and portable records.
//!
//! Converters are zero-sized types. Export-side functions read rows straight
//! from the connection; import-side functions receive an [`ImportSession`]
//! carrying the tracker, the open package, and the resolved payload
//! destinations, so one converter can call another's associated functions
//! with the same session.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use lanpack_db::{ChangeTracker, OperationError};
use lanpack_model::{
    DescriptorInfo, Entity, EntityKind, Owner, RecordKind, RootKind, StorageLocationType,
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::SyncError;
use crate::package::{Payload, PackageReader};
use crate::reconcile::Reconciler;
use crate::storage::{Destinations, StorageResolver};

/// A portable record plus the payload that travels with it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exported<R> {
    pub record: R,
    pub payload: Option<Payload>,
}

impl<R> Exported<R> {
    pub fn plain(record: R) -> Self {
        Self {
            record,
            payload: None,
        }
    }
}

/// State shared by every converter call during one import run.
pub struct ImportSession<'a> {
    pub conn: &'a Connection,
    pub tracker: &'a mut ChangeTracker,
    pub package: &'a mut PackageReader,
    pub destinations: &'a Destinations,
    pub owner: Owner,
    /// Records that arrived without an identifier and were given one.
    pub unnamed: &'a HashSet<Uuid>,
    /// Payload files created for the record being imported.
    pub extracted: Vec<PathBuf>,
}

impl ImportSession<'_> {
    pub fn reconciler(&mut self) -> Reconciler<'_> {
        Reconciler::new(self.conn, self.tracker)
    }

    /// The tracked instance of `(kind, id)`.
    pub fn tracked(&self, kind: EntityKind, id: Uuid) -> Result<Entity, SyncError> {
        self.tracker
            .find(kind, id)
            .cloned()
            .ok_or_else(|| OperationError::NotTracked { kind, id }.into())
    }

    /// Name of the archive entry holding the payload of record `id`.
    ///
    /// A record that arrived without an identifier was packaged under the
    /// nil id, not the one assigned on read.
    pub fn payload_key(&self, id: Uuid) -> String {
        if self.unnamed.contains(&id) {
            Uuid::nil().to_string()
        } else {
            id.to_string()
        }
    }

    /// Extract a payload entry into the destination for `location_type`.
    ///
    /// Returns the bytes written and the destination's id. A file that did
    /// not exist before is remembered until [`ImportSession::discard_extracted`]
    /// or the next record.
    pub fn extract_payload(
        &mut self,
        location_type: StorageLocationType,
        entry: &str,
        sha256: &str,
        file_name: &str,
    ) -> Result<(u64, Uuid), SyncError> {
        let location = self.destinations.for_type(location_type);
        let dir = Path::new(&location.path);
        let target = dir.join(file_name);
        let fresh = !target.exists();
        let size = self.package.extract_file(entry, sha256, dir, file_name)?;
        if fresh {
            self.extracted.push(target);
        }
        Ok((size, location.id))
    }

    /// Delete the payload files created for a record that failed.
    pub fn discard_extracted(&mut self) {
        for path in self.extracted.drain(..) {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }

    /// Whether `(kind, id)` is tracked or stored. A nil id never exists.
    pub fn exists_by_id(&mut self, kind: EntityKind, id: Uuid) -> Result<bool, SyncError> {
        if id.is_nil() {
            return Ok(false);
        }
        Ok(self.tracker.load(self.conn, kind, id)?.is_some())
    }

    /// The owning game's id, for game-only record kinds.
    pub fn game_id(&self, kind: RecordKind) -> Result<Uuid, SyncError> {
        self.owner_id(RootKind::Game, kind)
    }

    /// The owning server's id, for server-only record kinds.
    pub fn server_id(&self, kind: RecordKind) -> Result<Uuid, SyncError> {
        self.owner_id(RootKind::Server, kind)
    }

    fn owner_id(&self, expected: RootKind, kind: RecordKind) -> Result<Uuid, SyncError> {
        if self.owner.kind == expected {
            Ok(self.owner.id)
        } else {
            Err(SyncError::InvalidRecord(format!(
                "{kind} records belong to a {expected}, not a {}",
                self.owner.kind
            )))
        }
    }

    /// Track a new row and return the tracked instance.
    pub fn add_entity(&mut self, entity: Entity) -> Result<Entity, SyncError> {
        let (kind, id) = (entity.kind(), entity.id());
        self.tracker.add(entity)?;
        self.tracked(kind, id)
    }

    /// Merge a row through the reconciler and return the tracked result.
    pub fn merge_entity(&mut self, entity: Entity) -> Result<Entity, SyncError> {
        let merged = self.reconciler().merge(entity)?;
        self.tracked(merged.kind, merged.id)
    }
}

pub trait Converter {
    type Record;
    const KIND: RecordKind;
}

pub trait Exporter: Converter {
    /// Cheap metadata for selection lists. Never fails; missing details are
    /// left out.
    fn export_info(entity: &Entity) -> DescriptorInfo;

    /// Load the row `id` and map it to its portable record.
    ///
    /// Fails with [`SyncError::RecordNotFound`] when the row is gone.
    fn export(
        conn: &Connection,
        storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<Self::Record>, SyncError>;
}

pub trait Importer: Converter {
    fn import_info(record: &Self::Record) -> DescriptorInfo;

    /// Identity test against the tracker and the store.
    fn exists(session: &mut ImportSession<'_>, record: &Self::Record) -> Result<bool, SyncError>;

    fn add(session: &mut ImportSession<'_>, record: &Self::Record) -> Result<Entity, SyncError>;

    fn update(session: &mut ImportSession<'_>, record: &Self::Record)
    -> Result<Entity, SyncError>;

    /// `exists`, then `update` or `add`. The flag reports whether the record
    /// already existed.
    fn upsert(
        session: &mut ImportSession<'_>,
        record: &Self::Record,
    ) -> Result<(Entity, bool), SyncError> {
        if Self::exists(session, record)? {
            Ok((Self::update(session, record)?, true))
        } else {
            Ok((Self::add(session, record)?, false))
        }
    }
}

/// Load a row for export, mapping absence to [`SyncError::RecordNotFound`].
pub(crate) fn load_row(
    conn: &Connection,
    kind: RecordKind,
    id: Uuid,
) -> Result<Entity, SyncError> {
    lanpack_db::load_entity(conn, kind.entity_kind(), id)?.ok_or(SyncError::RecordNotFound {
        kind: kind.as_str(),
        id,
    })
}

/// Error for a loaded row whose variant does not match its converter.
pub(crate) fn wrong_variant(kind: RecordKind, entity: &Entity) -> SyncError {
    SyncError::InvalidRecord(format!(
        "expected a {kind} row, found {}",
        entity.kind()
    ))
}

/// Timestamp for rows whose portable record carries none.
pub(crate) fn or_now(timestamp: &str) -> String {
    if timestamp.is_empty() {
        chrono::Utc::now().to_rfc3339()
    } else {
        timestamp.to_string()
    }
}

/// Archive entry path for a payload-bearing kind.
pub(crate) fn entry_for(kind: RecordKind, name: &str) -> Result<String, SyncError> {
    crate::package::payload_entry(kind, name)
        .ok_or_else(|| SyncError::InvalidRecord(format!("{kind} records carry no payload")))
}
