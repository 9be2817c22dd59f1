//! Converters for records any root can own: actions, archives, and scripts.

use lanpack_model::manifest as portable;
use lanpack_model::{
    Action, Archive, DescriptorInfo, Entity, EntityKind, RecordKind, Script, StorageLocationType,
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::converter::{
    Converter, Exported, Exporter, ImportSession, Importer, entry_for, load_row, or_now,
    wrong_variant,
};
use crate::error::SyncError;
use crate::package::{Payload, PayloadSource};
use crate::storage::StorageResolver;

// ── Actions ─────────────────────────────────────────────────────────────────

pub struct ActionConverter;

impl Converter for ActionConverter {
    type Record = portable::Action;
    const KIND: RecordKind = RecordKind::Action;
}

impl ActionConverter {
    fn to_entity(session: &ImportSession<'_>, r: &portable::Action) -> Entity {
        Entity::Action(Action {
            id: r.id,
            owner: session.owner,
            name: r.name.clone(),
            path: r.path.clone(),
            arguments: r.arguments.clone(),
            working_directory: r.working_directory.clone(),
            is_primary: r.is_primary,
            sort_order: r.sort_order,
        })
    }
}

impl Exporter for ActionConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::Action(a) => DescriptorInfo::new(Self::KIND, a.id, &a.name),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::Action>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::Action(a) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        Ok(Exported::plain(portable::Action {
            id: a.id,
            name: a.name,
            path: a.path,
            arguments: a.arguments,
            working_directory: a.working_directory,
            is_primary: a.is_primary,
            sort_order: a.sort_order,
        }))
    }
}

impl Importer for ActionConverter {
    fn import_info(r: &portable::Action) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.name)
    }

    fn exists(session: &mut ImportSession<'_>, r: &portable::Action) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Action, r.id)
    }

    fn add(session: &mut ImportSession<'_>, r: &portable::Action) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r);
        session.add_entity(entity)
    }

    fn update(session: &mut ImportSession<'_>, r: &portable::Action) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r);
        session.merge_entity(entity)
    }
}

// ── Archives ────────────────────────────────────────────────────────────────

pub struct ArchiveConverter;

impl Converter for ArchiveConverter {
    type Record = portable::Archive;
    const KIND: RecordKind = RecordKind::Archive;
}

impl ArchiveConverter {
    /// Extract the archive file into the archive destination and build its row.
    fn to_entity(
        session: &mut ImportSession<'_>,
        r: &portable::Archive,
    ) -> Result<Entity, SyncError> {
        let entry = entry_for(Self::KIND, &r.object_key)?;
        let (size, location_id) = session.extract_payload(
            StorageLocationType::Archive,
            &entry,
            &r.sha256,
            &r.object_key,
        )?;

        Ok(Entity::Archive(Archive {
            id: r.id,
            owner: session.owner,
            version: r.version.clone(),
            changelog: r.changelog.clone(),
            object_key: r.object_key.clone(),
            compressed_size: i64::try_from(size).unwrap_or(r.compressed_size),
            uncompressed_size: r.uncompressed_size,
            storage_location_id: Some(location_id),
            created_on: or_now(&r.created_on),
        }))
    }
}

impl Exporter for ArchiveConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::Archive(a) => {
                DescriptorInfo::new(Self::KIND, a.id, &a.version).with_size(a.compressed_size)
            }
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::Archive>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::Archive(a) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        let path = storage.payload_path(
            StorageLocationType::Archive,
            a.storage_location_id,
            &a.object_key,
        )?;
        let payload = Payload {
            entry: entry_for(Self::KIND, &a.object_key)?,
            source: PayloadSource::File(path),
        };
        Ok(Exported {
            record: portable::Archive {
                id: a.id,
                version: a.version,
                changelog: a.changelog,
                object_key: a.object_key,
                compressed_size: a.compressed_size,
                uncompressed_size: a.uncompressed_size,
                created_on: a.created_on,
                sha256: String::new(),
            },
            payload: Some(payload),
        })
    }
}

impl Importer for ArchiveConverter {
    fn import_info(r: &portable::Archive) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.version).with_size(r.compressed_size)
    }

    fn exists(session: &mut ImportSession<'_>, r: &portable::Archive) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Archive, r.id)
    }

    fn add(session: &mut ImportSession<'_>, r: &portable::Archive) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(session: &mut ImportSession<'_>, r: &portable::Archive) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}

// ── Scripts ─────────────────────────────────────────────────────────────────

/// Script bodies travel as their own entries rather than inside the manifest.
pub struct ScriptConverter;

impl Converter for ScriptConverter {
    type Record = portable::Script;
    const KIND: RecordKind = RecordKind::Script;
}

impl ScriptConverter {
    fn to_entity(
        session: &mut ImportSession<'_>,
        r: &portable::Script,
    ) -> Result<Entity, SyncError> {
        let entry = entry_for(Self::KIND, &session.payload_key(r.id))?;
        let contents = session.package.read_text(&entry, &r.sha256)?;
        Ok(Entity::Script(Script {
            id: r.id,
            owner: session.owner,
            script_type: r.script_type,
            name: r.name.clone(),
            description: r.description.clone(),
            requires_admin: r.requires_admin,
            contents,
        }))
    }
}

impl Exporter for ScriptConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::Script(s) => DescriptorInfo::new(Self::KIND, s.id, &s.name)
                .with_size(i64::try_from(s.contents.len()).unwrap_or_default()),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::Script>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::Script(s) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        let payload = Payload {
            entry: entry_for(Self::KIND, &s.id.to_string())?,
            source: PayloadSource::Text(s.contents),
        };
        Ok(Exported {
            record: portable::Script {
                id: s.id,
                script_type: s.script_type,
                name: s.name,
                description: s.description,
                requires_admin: s.requires_admin,
                sha256: String::new(),
            },
            payload: Some(payload),
        })
    }
}

impl Importer for ScriptConverter {
    fn import_info(r: &portable::Script) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.name)
    }

    fn exists(session: &mut ImportSession<'_>, r: &portable::Script) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Script, r.id)
    }

    fn add(session: &mut ImportSession<'_>, r: &portable::Script) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(session: &mut ImportSession<'_>, r: &portable::Script) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}
