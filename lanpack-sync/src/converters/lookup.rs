//! Name-keyed lookup converters: collection, developer, publisher, engine,
//! genre, platform, and tag.
//!
//! A lookup is matched by exact, case-sensitive name before its identifier,
//! so two libraries that created "Action" independently end up sharing one row.

use std::marker::PhantomData;

use lanpack_model::manifest as portable;
use lanpack_model::{DescriptorInfo, Entity, Lookup, RecordKind};
use rusqlite::Connection;
use uuid::Uuid;

use crate::converter::{
    Converter, Exported, Exporter, ImportSession, Importer, load_row, wrong_variant,
};
use crate::error::SyncError;
use crate::storage::StorageResolver;

/// Which lookup list a [`LookupConverter`] serves.
pub trait LookupRole {
    const KIND: RecordKind;
}

pub struct Collections;
pub struct Developers;
pub struct Publishers;
pub struct Engines;
pub struct Genres;
pub struct Platforms;
pub struct Tags;

impl LookupRole for Collections {
    const KIND: RecordKind = RecordKind::Collection;
}
impl LookupRole for Developers {
    const KIND: RecordKind = RecordKind::Developer;
}
impl LookupRole for Publishers {
    const KIND: RecordKind = RecordKind::Publisher;
}
impl LookupRole for Engines {
    const KIND: RecordKind = RecordKind::Engine;
}
impl LookupRole for Genres {
    const KIND: RecordKind = RecordKind::Genre;
}
impl LookupRole for Platforms {
    const KIND: RecordKind = RecordKind::Platform;
}
impl LookupRole for Tags {
    const KIND: RecordKind = RecordKind::Tag;
}

pub struct LookupConverter<R>(PhantomData<R>);

pub type CollectionConverter = LookupConverter<Collections>;
pub type DeveloperConverter = LookupConverter<Developers>;
pub type PublisherConverter = LookupConverter<Publishers>;
pub type EngineConverter = LookupConverter<Engines>;
pub type GenreConverter = LookupConverter<Genres>;
pub type PlatformConverter = LookupConverter<Platforms>;
pub type TagConverter = LookupConverter<Tags>;

impl<R: LookupRole> LookupConverter<R> {
    fn to_entity(record: &portable::Lookup) -> Result<Entity, SyncError> {
        let kind = R::KIND.entity_kind();
        let lookup = Lookup {
            id: if record.id.is_nil() {
                Uuid::new_v4()
            } else {
                record.id
            },
            name: record.name.clone(),
        };
        Entity::from_lookup(kind, lookup)
            .ok_or_else(|| SyncError::InvalidRecord(format!("{kind} is not a lookup kind")))
    }
}

impl<R: LookupRole> Converter for LookupConverter<R> {
    type Record = portable::Lookup;
    const KIND: RecordKind = R::KIND;
}

impl<R: LookupRole> Exporter for LookupConverter<R> {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        DescriptorInfo::new(R::KIND, entity.id(), entity.lookup_name().unwrap_or_default())
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::Lookup>, SyncError> {
        let entity = load_row(conn, R::KIND, id)?;
        let lookup = entity
            .as_lookup()
            .ok_or_else(|| wrong_variant(R::KIND, &entity))?;
        Ok(Exported::plain(portable::Lookup {
            id: lookup.id,
            name: lookup.name.clone(),
        }))
    }
}

impl<R: LookupRole> Importer for LookupConverter<R> {
    fn import_info(record: &portable::Lookup) -> DescriptorInfo {
        DescriptorInfo::new(R::KIND, record.id, &record.name)
    }

    fn exists(
        session: &mut ImportSession<'_>,
        record: &portable::Lookup,
    ) -> Result<bool, SyncError> {
        let kind = R::KIND.entity_kind();
        if session
            .tracker
            .find_by_name(session.conn, kind, &record.name)?
            .is_some()
        {
            return Ok(true);
        }
        session.exists_by_id(kind, record.id)
    }

    fn add(session: &mut ImportSession<'_>, record: &portable::Lookup) -> Result<Entity, SyncError> {
        session.add_entity(Self::to_entity(record)?)
    }

    fn update(
        session: &mut ImportSession<'_>,
        record: &portable::Lookup,
    ) -> Result<Entity, SyncError> {
        session.merge_entity(Self::to_entity(record)?)
    }
}
