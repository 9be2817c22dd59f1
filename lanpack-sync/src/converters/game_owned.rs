//! Converters for records only a game owns.

use lanpack_model::manifest as portable;
use lanpack_model::{
    CustomField, DescriptorInfo, Entity, EntityKind, Key, Media, MultiplayerMode, PlaySession,
    RecordKind, Save, SavePath, StorageLocationType,
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

// ── Custom Fields ───────────────────────────────────────────────────────────

pub struct CustomFieldConverter;

impl Converter for CustomFieldConverter {
    type Record = portable::CustomField;
    const KIND: RecordKind = RecordKind::CustomField;
}

impl CustomFieldConverter {
    fn to_entity(
        session: &ImportSession<'_>,
        r: &portable::CustomField,
    ) -> Result<Entity, SyncError> {
        Ok(Entity::CustomField(CustomField {
            id: r.id,
            game_id: session.game_id(Self::KIND)?,
            name: r.name.clone(),
            value: r.value.clone(),
        }))
    }
}

impl Exporter for CustomFieldConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::CustomField(f) => DescriptorInfo::new(Self::KIND, f.id, &f.name),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::CustomField>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::CustomField(f) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        Ok(Exported::plain(portable::CustomField {
            id: f.id,
            name: f.name,
            value: f.value,
        }))
    }
}

impl Importer for CustomFieldConverter {
    fn import_info(r: &portable::CustomField) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.name)
    }

    fn exists(
        session: &mut ImportSession<'_>,
        r: &portable::CustomField,
    ) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::CustomField, r.id)
    }

    fn add(session: &mut ImportSession<'_>, r: &portable::CustomField) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(
        session: &mut ImportSession<'_>,
        r: &portable::CustomField,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}

// ── Keys ────────────────────────────────────────────────────────────────────

pub struct KeyConverter;

impl Converter for KeyConverter {
    type Record = portable::Key;
    const KIND: RecordKind = RecordKind::Key;
}

impl KeyConverter {
    fn to_entity(session: &ImportSession<'_>, r: &portable::Key) -> Result<Entity, SyncError> {
        Ok(Entity::Key(Key {
            id: r.id,
            game_id: session.game_id(Self::KIND)?,
            value: r.value.clone(),
            allocation_method: r.allocation_method,
            claimed_by_mac_address: r.claimed_by_mac_address.clone(),
            claimed_by_ip_address: r.claimed_by_ip_address.clone(),
            claimed_by_computer_name: r.claimed_by_computer_name.clone(),
            claimed_on: r.claimed_on.clone(),
        }))
    }
}

/// Keys are listed by a masked value so selection lists don't leak them.
fn masked(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{tail}")
}

impl Exporter for KeyConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::Key(k) => DescriptorInfo::new(Self::KIND, k.id, masked(&k.value)),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::Key>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::Key(k) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        Ok(Exported::plain(portable::Key {
            id: k.id,
            value: k.value,
            allocation_method: k.allocation_method,
            claimed_by_mac_address: k.claimed_by_mac_address,
            claimed_by_ip_address: k.claimed_by_ip_address,
            claimed_by_computer_name: k.claimed_by_computer_name,
            claimed_on: k.claimed_on,
        }))
    }
}

impl Importer for KeyConverter {
    fn import_info(r: &portable::Key) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, masked(&r.value))
    }

    fn exists(session: &mut ImportSession<'_>, r: &portable::Key) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Key, r.id)
    }

    fn add(session: &mut ImportSession<'_>, r: &portable::Key) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(session: &mut ImportSession<'_>, r: &portable::Key) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}

// ── Media ───────────────────────────────────────────────────────────────────

pub struct MediaConverter;

impl Converter for MediaConverter {
    type Record = portable::Media;
    const KIND: RecordKind = RecordKind::Media;
}

impl MediaConverter {
    /// Extract the media file into the media destination and build its row.
    fn to_entity(session: &mut ImportSession<'_>, r: &portable::Media) -> Result<Entity, SyncError> {
        let game_id = session.game_id(Self::KIND)?;
        let file_name = r.file_id.to_string();
        let entry = entry_for(Self::KIND, &file_name)?;
        let (size, location_id) =
            session.extract_payload(StorageLocationType::Media, &entry, &r.sha256, &file_name)?;

        Ok(Entity::Media(Media {
            id: r.id,
            game_id,
            file_id: r.file_id,
            media_type: r.media_type,
            source_url: r.source_url.clone(),
            mime_type: r.mime_type.clone(),
            size: i64::try_from(size).unwrap_or(r.size),
            storage_location_id: Some(location_id),
        }))
    }
}

fn media_label(media_type: lanpack_model::MediaType, mime_type: &str) -> String {
    format!("{} ({mime_type})", media_type.as_str())
}

impl Exporter for MediaConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::Media(m) => {
                DescriptorInfo::new(Self::KIND, m.id, media_label(m.media_type, &m.mime_type))
                    .with_size(m.size)
            }
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::Media>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::Media(m) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        let file_name = m.file_id.to_string();
        let path =
            storage.payload_path(StorageLocationType::Media, m.storage_location_id, &file_name)?;
        let payload = Payload {
            entry: entry_for(Self::KIND, &file_name)?,
            source: PayloadSource::File(path),
        };
        Ok(Exported {
            record: portable::Media {
                id: m.id,
                file_id: m.file_id,
                media_type: m.media_type,
                source_url: m.source_url,
                mime_type: m.mime_type,
                size: m.size,
                sha256: String::new(),
            },
            payload: Some(payload),
        })
    }
}

impl Importer for MediaConverter {
    fn import_info(r: &portable::Media) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, media_label(r.media_type, &r.mime_type))
            .with_size(r.size)
    }

    fn exists(session: &mut ImportSession<'_>, r: &portable::Media) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Media, r.id)
    }

    fn add(session: &mut ImportSession<'_>, r: &portable::Media) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(session: &mut ImportSession<'_>, r: &portable::Media) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}

// ── Multiplayer Modes ───────────────────────────────────────────────────────

pub struct MultiplayerModeConverter;

impl Converter for MultiplayerModeConverter {
    type Record = portable::MultiplayerMode;
    const KIND: RecordKind = RecordKind::MultiplayerMode;
}

impl MultiplayerModeConverter {
    fn to_entity(
        session: &ImportSession<'_>,
        r: &portable::MultiplayerMode,
    ) -> Result<Entity, SyncError> {
        Ok(Entity::MultiplayerMode(MultiplayerMode {
            id: r.id,
            game_id: session.game_id(Self::KIND)?,
            mode_type: r.mode_type,
            description: r.description.clone(),
            min_players: r.min_players,
            max_players: r.max_players,
            spectators: r.spectators,
        }))
    }
}

fn mode_label(mode_type: lanpack_model::MultiplayerType, min: i32, max: i32) -> String {
    format!("{} {min}-{max}", mode_type.as_str())
}

impl Exporter for MultiplayerModeConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::MultiplayerMode(m) => DescriptorInfo::new(
                Self::KIND,
                m.id,
                mode_label(m.mode_type, m.min_players, m.max_players),
            ),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::MultiplayerMode>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::MultiplayerMode(m) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        Ok(Exported::plain(portable::MultiplayerMode {
            id: m.id,
            mode_type: m.mode_type,
            description: m.description,
            min_players: m.min_players,
            max_players: m.max_players,
            spectators: m.spectators,
        }))
    }
}

impl Importer for MultiplayerModeConverter {
    fn import_info(r: &portable::MultiplayerMode) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, mode_label(r.mode_type, r.min_players, r.max_players))
    }

    fn exists(
        session: &mut ImportSession<'_>,
        r: &portable::MultiplayerMode,
    ) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::MultiplayerMode, r.id)
    }

    fn add(
        session: &mut ImportSession<'_>,
        r: &portable::MultiplayerMode,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(
        session: &mut ImportSession<'_>,
        r: &portable::MultiplayerMode,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}

// ── Play Sessions ───────────────────────────────────────────────────────────

pub struct PlaySessionConverter;

impl Converter for PlaySessionConverter {
    type Record = portable::PlaySession;
    const KIND: RecordKind = RecordKind::PlaySession;
}

impl PlaySessionConverter {
    fn to_entity(
        session: &ImportSession<'_>,
        r: &portable::PlaySession,
    ) -> Result<Entity, SyncError> {
        Ok(Entity::PlaySession(PlaySession {
            id: r.id,
            game_id: session.game_id(Self::KIND)?,
            user: r.user.clone(),
            start: r.start.clone(),
            end: r.end.clone(),
        }))
    }
}

impl Exporter for PlaySessionConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::PlaySession(p) => DescriptorInfo::new(Self::KIND, p.id, &p.user),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::PlaySession>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::PlaySession(p) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        Ok(Exported::plain(portable::PlaySession {
            id: p.id,
            user: p.user,
            start: p.start,
            end: p.end,
        }))
    }
}

impl Importer for PlaySessionConverter {
    fn import_info(r: &portable::PlaySession) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.user)
    }

    fn exists(
        session: &mut ImportSession<'_>,
        r: &portable::PlaySession,
    ) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::PlaySession, r.id)
    }

    fn add(
        session: &mut ImportSession<'_>,
        r: &portable::PlaySession,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(
        session: &mut ImportSession<'_>,
        r: &portable::PlaySession,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}

// ── Saves ───────────────────────────────────────────────────────────────────

pub struct SaveConverter;

impl Converter for SaveConverter {
    type Record = portable::Save;
    const KIND: RecordKind = RecordKind::Save;
}

impl SaveConverter {
    /// Extract the save file into the save destination and build its row.
    fn to_entity(session: &mut ImportSession<'_>, r: &portable::Save) -> Result<Entity, SyncError> {
        let game_id = session.game_id(Self::KIND)?;
        let file_name = r.id.to_string();
        let entry = entry_for(Self::KIND, &session.payload_key(r.id))?;
        let (size, location_id) =
            session.extract_payload(StorageLocationType::Save, &entry, &r.sha256, &file_name)?;

        Ok(Entity::Save(Save {
            id: r.id,
            game_id,
            user: r.user.clone(),
            size: i64::try_from(size).unwrap_or(r.size),
            storage_location_id: Some(location_id),
            created_on: or_now(&r.created_on),
        }))
    }
}

impl Exporter for SaveConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::Save(s) => DescriptorInfo::new(Self::KIND, s.id, &s.user).with_size(s.size),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::Save>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::Save(s) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        let file_name = s.id.to_string();
        let path =
            storage.payload_path(StorageLocationType::Save, s.storage_location_id, &file_name)?;
        let payload = Payload {
            entry: entry_for(Self::KIND, &file_name)?,
            source: PayloadSource::File(path),
        };
        Ok(Exported {
            record: portable::Save {
                id: s.id,
                user: s.user,
                size: s.size,
                created_on: s.created_on,
                sha256: String::new(),
            },
            payload: Some(payload),
        })
    }
}

impl Importer for SaveConverter {
    fn import_info(r: &portable::Save) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.user).with_size(r.size)
    }

    fn exists(session: &mut ImportSession<'_>, r: &portable::Save) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Save, r.id)
    }

    fn add(session: &mut ImportSession<'_>, r: &portable::Save) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(session: &mut ImportSession<'_>, r: &portable::Save) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}

// ── Save Paths ──────────────────────────────────────────────────────────────

pub struct SavePathConverter;

impl Converter for SavePathConverter {
    type Record = portable::SavePath;
    const KIND: RecordKind = RecordKind::SavePath;
}

impl SavePathConverter {
    fn to_entity(session: &ImportSession<'_>, r: &portable::SavePath) -> Result<Entity, SyncError> {
        Ok(Entity::SavePath(SavePath {
            id: r.id,
            game_id: session.game_id(Self::KIND)?,
            path_type: r.path_type,
            path: r.path.clone(),
            working_directory: r.working_directory.clone(),
            is_regex: r.is_regex,
        }))
    }
}

impl Exporter for SavePathConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::SavePath(p) => DescriptorInfo::new(Self::KIND, p.id, &p.path),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::SavePath>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::SavePath(p) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        Ok(Exported::plain(portable::SavePath {
            id: p.id,
            path_type: p.path_type,
            path: p.path,
            working_directory: p.working_directory,
            is_regex: p.is_regex,
        }))
    }
}

impl Importer for SavePathConverter {
    fn import_info(r: &portable::SavePath) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.path)
    }

    fn exists(session: &mut ImportSession<'_>, r: &portable::SavePath) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::SavePath, r.id)
    }

    fn add(session: &mut ImportSession<'_>, r: &portable::SavePath) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(session: &mut ImportSession<'_>, r: &portable::SavePath) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}
