//! Converters for server consoles and HTTP paths.

use lanpack_model::manifest as portable;
use lanpack_model::{
    DescriptorInfo, Entity, EntityKind, RecordKind, ServerConsole, ServerHttpPath,
};
use rusqlite::Connection;
use uuid::Uuid;

use crate::converter::{Converter, Exported, Exporter, ImportSession, Importer, load_row, wrong_variant};
use crate::error::SyncError;
use crate::storage::StorageResolver;

// ── Consoles ────────────────────────────────────────────────────────────────

pub struct ServerConsoleConverter;

impl Converter for ServerConsoleConverter {
    type Record = portable::ServerConsole;
    const KIND: RecordKind = RecordKind::ServerConsole;
}

impl ServerConsoleConverter {
    fn to_entity(
        session: &ImportSession<'_>,
        r: &portable::ServerConsole,
    ) -> Result<Entity, SyncError> {
        Ok(Entity::ServerConsole(ServerConsole {
            id: r.id,
            server_id: session.server_id(Self::KIND)?,
            name: r.name.clone(),
            console_type: r.console_type,
            path: r.path.clone(),
            host: r.host.clone(),
            port: r.port,
            password: r.password.clone(),
        }))
    }
}

impl Exporter for ServerConsoleConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::ServerConsole(c) => DescriptorInfo::new(Self::KIND, c.id, &c.name),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::ServerConsole>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::ServerConsole(c) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        Ok(Exported::plain(portable::ServerConsole {
            id: c.id,
            name: c.name,
            console_type: c.console_type,
            path: c.path,
            host: c.host,
            port: c.port,
            password: c.password,
        }))
    }
}

impl Importer for ServerConsoleConverter {
    fn import_info(r: &portable::ServerConsole) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.name)
    }

    fn exists(
        session: &mut ImportSession<'_>,
        r: &portable::ServerConsole,
    ) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::ServerConsole, r.id)
    }

    fn add(
        session: &mut ImportSession<'_>,
        r: &portable::ServerConsole,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(
        session: &mut ImportSession<'_>,
        r: &portable::ServerConsole,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}

// ── HTTP Paths ──────────────────────────────────────────────────────────────

pub struct ServerHttpPathConverter;

impl Converter for ServerHttpPathConverter {
    type Record = portable::ServerHttpPath;
    const KIND: RecordKind = RecordKind::ServerHttpPath;
}

impl ServerHttpPathConverter {
    fn to_entity(
        session: &ImportSession<'_>,
        r: &portable::ServerHttpPath,
    ) -> Result<Entity, SyncError> {
        Ok(Entity::ServerHttpPath(ServerHttpPath {
            id: r.id,
            server_id: session.server_id(Self::KIND)?,
            local_path: r.local_path.clone(),
            path: r.path.clone(),
        }))
    }
}

impl Exporter for ServerHttpPathConverter {
    fn export_info(entity: &Entity) -> DescriptorInfo {
        match entity {
            Entity::ServerHttpPath(p) => DescriptorInfo::new(Self::KIND, p.id, &p.path),
            other => DescriptorInfo::new(Self::KIND, other.id(), ""),
        }
    }

    fn export(
        conn: &Connection,
        _storage: &dyn StorageResolver,
        id: Uuid,
    ) -> Result<Exported<portable::ServerHttpPath>, SyncError> {
        let entity = load_row(conn, Self::KIND, id)?;
        let Entity::ServerHttpPath(p) = entity else {
            return Err(wrong_variant(Self::KIND, &entity));
        };
        Ok(Exported::plain(portable::ServerHttpPath {
            id: p.id,
            local_path: p.local_path,
            path: p.path,
        }))
    }
}

impl Importer for ServerHttpPathConverter {
    fn import_info(r: &portable::ServerHttpPath) -> DescriptorInfo {
        DescriptorInfo::new(Self::KIND, r.id, &r.path)
    }

    fn exists(
        session: &mut ImportSession<'_>,
        r: &portable::ServerHttpPath,
    ) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::ServerHttpPath, r.id)
    }

    fn add(
        session: &mut ImportSession<'_>,
        r: &portable::ServerHttpPath,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.add_entity(entity)
    }

    fn update(
        session: &mut ImportSession<'_>,
        r: &portable::ServerHttpPath,
    ) -> Result<Entity, SyncError> {
        let entity = Self::to_entity(session, r)?;
        session.merge_entity(entity)
    }
}
