//! CRUD operations for every stored entity kind.
//!
//! Every write is an upsert keyed on `id`, so flushing the same tracked row
//! twice is harmless. Reads come in two flavours: by identifier here, and by
//! owner in [`crate::queries`].

use lanpack_model::*;
use rusqlite::{Connection, Params, Row, params};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
    #[error("{kind} '{id}' is already tracked")]
    AlreadyTracked { kind: EntityKind, id: Uuid },
    #[error("{kind} '{id}' is not tracked")]
    NotTracked { kind: EntityKind, id: Uuid },
    #[error("Cannot copy a {incoming} onto a tracked {tracked}")]
    KindMismatch {
        tracked: EntityKind,
        incoming: EntityKind,
    },
}

/// Table backing an entity kind.
pub fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Collection => "collections",
        EntityKind::Company => "companies",
        EntityKind::Engine => "engines",
        EntityKind::Genre => "genres",
        EntityKind::Platform => "platforms",
        EntityKind::Tag => "tags",
        EntityKind::Game => "games",
        EntityKind::Redistributable => "redistributables",
        EntityKind::Server => "servers",
        EntityKind::Tool => "tools",
        EntityKind::Action => "actions",
        EntityKind::Archive => "archives",
        EntityKind::CustomField => "custom_fields",
        EntityKind::Key => "keys",
        EntityKind::Media => "media",
        EntityKind::MultiplayerMode => "multiplayer_modes",
        EntityKind::PlaySession => "play_sessions",
        EntityKind::Save => "saves",
        EntityKind::SavePath => "save_paths",
        EntityKind::Script => "scripts",
        EntityKind::ServerConsole => "server_consoles",
        EntityKind::ServerHttpPath => "server_http_paths",
    }
}

// ── Dispatch ────────────────────────────────────────────────────────────────

/// Write any entity row (insert or update by id).
pub fn save_entity(conn: &Connection, entity: &Entity) -> Result<(), OperationError> {
    match entity {
        Entity::Collection(l)
        | Entity::Company(l)
        | Entity::Engine(l)
        | Entity::Genre(l)
        | Entity::Platform(l)
        | Entity::Tag(l) => upsert_lookup(conn, entity.kind(), l),
        Entity::Game(e) => upsert_game(conn, e),
        Entity::Redistributable(e) => upsert_redistributable(conn, e),
        Entity::Server(e) => upsert_server(conn, e),
        Entity::Tool(e) => upsert_tool(conn, e),
        Entity::Action(e) => upsert_action(conn, e),
        Entity::Archive(e) => upsert_archive(conn, e),
        Entity::CustomField(e) => upsert_custom_field(conn, e),
        Entity::Key(e) => upsert_key(conn, e),
        Entity::Media(e) => upsert_media(conn, e),
        Entity::MultiplayerMode(e) => upsert_multiplayer_mode(conn, e),
        Entity::PlaySession(e) => upsert_play_session(conn, e),
        Entity::Save(e) => upsert_save(conn, e),
        Entity::SavePath(e) => upsert_save_path(conn, e),
        Entity::Script(e) => upsert_script(conn, e),
        Entity::ServerConsole(e) => upsert_server_console(conn, e),
        Entity::ServerHttpPath(e) => upsert_server_http_path(conn, e),
    }
}

/// Load any entity row by kind and id.
pub fn load_entity(
    conn: &Connection,
    kind: EntityKind,
    id: Uuid,
) -> Result<Option<Entity>, OperationError> {
    if kind.is_lookup() {
        return Ok(get_lookup(conn, kind, id)?.and_then(|l| Entity::from_lookup(kind, l)));
    }
    let entity = match kind {
        EntityKind::Game => get_game(conn, id)?.map(Entity::Game),
        EntityKind::Redistributable => get_redistributable(conn, id)?.map(Entity::Redistributable),
        EntityKind::Server => get_server(conn, id)?.map(Entity::Server),
        EntityKind::Tool => get_tool(conn, id)?.map(Entity::Tool),
        EntityKind::Action => get_action(conn, id)?.map(Entity::Action),
        EntityKind::Archive => get_archive(conn, id)?.map(Entity::Archive),
        EntityKind::CustomField => get_custom_field(conn, id)?.map(Entity::CustomField),
        EntityKind::Key => get_key(conn, id)?.map(Entity::Key),
        EntityKind::Media => get_media(conn, id)?.map(Entity::Media),
        EntityKind::MultiplayerMode => get_multiplayer_mode(conn, id)?.map(Entity::MultiplayerMode),
        EntityKind::PlaySession => get_play_session(conn, id)?.map(Entity::PlaySession),
        EntityKind::Save => get_save(conn, id)?.map(Entity::Save),
        EntityKind::SavePath => get_save_path(conn, id)?.map(Entity::SavePath),
        EntityKind::Script => get_script(conn, id)?.map(Entity::Script),
        EntityKind::ServerConsole => get_server_console(conn, id)?.map(Entity::ServerConsole),
        EntityKind::ServerHttpPath => get_server_http_path(conn, id)?.map(Entity::ServerHttpPath),
        EntityKind::Collection
        | EntityKind::Company
        | EntityKind::Engine
        | EntityKind::Genre
        | EntityKind::Platform
        | EntityKind::Tag => None,
    };
    Ok(entity)
}

/// Delete any entity row. Returns `true` if a row was removed.
pub fn delete_entity(conn: &Connection, kind: EntityKind, id: Uuid) -> Result<bool, OperationError> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table_name(kind));
    let changed = conn.execute(&sql, params![id])?;
    Ok(changed > 0)
}

// ── Lookup Operations ───────────────────────────────────────────────────────

/// Insert or update a lookup row (collection, company, engine, genre, platform, tag).
pub fn upsert_lookup(conn: &Connection, kind: EntityKind, lookup: &Lookup) -> Result<(), OperationError> {
    let sql = format!(
        "INSERT INTO {} (id, name) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        table_name(kind)
    );
    conn.execute(&sql, params![lookup.id, lookup.name])?;
    Ok(())
}

pub fn get_lookup(conn: &Connection, kind: EntityKind, id: Uuid) -> Result<Option<Lookup>, OperationError> {
    let sql = format!("SELECT id, name FROM {} WHERE id = ?1", table_name(kind));
    query_one(conn, &sql, params![id], row_to_lookup)
}

/// Find a lookup row by exact (case-sensitive) name.
pub fn find_lookup_by_name(
    conn: &Connection,
    kind: EntityKind,
    name: &str,
) -> Result<Option<Lookup>, OperationError> {
    let sql = format!(
        "SELECT id, name FROM {} WHERE name = ?1 LIMIT 1",
        table_name(kind)
    );
    query_one(conn, &sql, params![name], row_to_lookup)
}

pub(crate) fn row_to_lookup(row: &Row<'_>) -> rusqlite::Result<Lookup> {
    Ok(Lookup {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

// ── Root Operations ─────────────────────────────────────────────────────────

pub(crate) const GAME_COLUMNS: &str = "id, title, sort_title, description, notes, released_on,
    singleplayer, igdb_id, game_type, base_game_id, engine_id, created_on, updated_on";

pub fn upsert_game(conn: &Connection, game: &Game) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO games (id, title, sort_title, description, notes, released_on,
             singleplayer, igdb_id, game_type, base_game_id, engine_id, created_on, updated_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             sort_title = excluded.sort_title,
             description = excluded.description,
             notes = excluded.notes,
             released_on = excluded.released_on,
             singleplayer = excluded.singleplayer,
             igdb_id = excluded.igdb_id,
             game_type = excluded.game_type,
             base_game_id = excluded.base_game_id,
             engine_id = excluded.engine_id,
             created_on = excluded.created_on,
             updated_on = excluded.updated_on",
        params![
            game.id,
            game.title,
            game.sort_title,
            game.description,
            game.notes,
            game.released_on,
            game.singleplayer,
            game.igdb_id,
            game.game_type.as_str(),
            game.base_game_id,
            game.engine_id,
            game.created_on,
            game.updated_on,
        ],
    )?;
    Ok(())
}

pub fn get_game(conn: &Connection, id: Uuid) -> Result<Option<Game>, OperationError> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_game)
}

pub(crate) fn row_to_game(row: &Row<'_>) -> rusqlite::Result<Game> {
    let game_type: String = row.get(8)?;
    Ok(Game {
        id: row.get(0)?,
        title: row.get(1)?,
        sort_title: row.get(2)?,
        description: row.get(3)?,
        notes: row.get(4)?,
        released_on: row.get(5)?,
        singleplayer: row.get(6)?,
        igdb_id: row.get(7)?,
        game_type: GameType::from_str_loose(&game_type),
        base_game_id: row.get(9)?,
        engine_id: row.get(10)?,
        created_on: row.get(11)?,
        updated_on: row.get(12)?,
    })
}

pub(crate) const REDISTRIBUTABLE_COLUMNS: &str =
    "id, name, description, notes, created_on, updated_on";

pub fn upsert_redistributable(conn: &Connection, r: &Redistributable) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO redistributables (id, name, description, notes, created_on, updated_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             description = excluded.description,
             notes = excluded.notes,
             created_on = excluded.created_on,
             updated_on = excluded.updated_on",
        params![r.id, r.name, r.description, r.notes, r.created_on, r.updated_on],
    )?;
    Ok(())
}

pub fn get_redistributable(conn: &Connection, id: Uuid) -> Result<Option<Redistributable>, OperationError> {
    let sql = format!("SELECT {REDISTRIBUTABLE_COLUMNS} FROM redistributables WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_redistributable)
}

pub(crate) fn row_to_redistributable(row: &Row<'_>) -> rusqlite::Result<Redistributable> {
    Ok(Redistributable {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        notes: row.get(3)?,
        created_on: row.get(4)?,
        updated_on: row.get(5)?,
    })
}

pub(crate) const SERVER_COLUMNS: &str = "id, name, game_id, path, arguments, working_directory,
    host, port, use_shell_execute, autostart, autostart_delay, created_on, updated_on";

pub fn upsert_server(conn: &Connection, s: &Server) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO servers (id, name, game_id, path, arguments, working_directory,
             host, port, use_shell_execute, autostart, autostart_delay, created_on, updated_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             game_id = excluded.game_id,
             path = excluded.path,
             arguments = excluded.arguments,
             working_directory = excluded.working_directory,
             host = excluded.host,
             port = excluded.port,
             use_shell_execute = excluded.use_shell_execute,
             autostart = excluded.autostart,
             autostart_delay = excluded.autostart_delay,
             created_on = excluded.created_on,
             updated_on = excluded.updated_on",
        params![
            s.id,
            s.name,
            s.game_id,
            s.path,
            s.arguments,
            s.working_directory,
            s.host,
            s.port,
            s.use_shell_execute,
            s.autostart,
            s.autostart_delay,
            s.created_on,
            s.updated_on,
        ],
    )?;
    Ok(())
}

pub fn get_server(conn: &Connection, id: Uuid) -> Result<Option<Server>, OperationError> {
    let sql = format!("SELECT {SERVER_COLUMNS} FROM servers WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_server)
}

pub(crate) fn row_to_server(row: &Row<'_>) -> rusqlite::Result<Server> {
    Ok(Server {
        id: row.get(0)?,
        name: row.get(1)?,
        game_id: row.get(2)?,
        path: row.get(3)?,
        arguments: row.get(4)?,
        working_directory: row.get(5)?,
        host: row.get(6)?,
        port: row.get(7)?,
        use_shell_execute: row.get(8)?,
        autostart: row.get(9)?,
        autostart_delay: row.get(10)?,
        created_on: row.get(11)?,
        updated_on: row.get(12)?,
    })
}

pub(crate) const TOOL_COLUMNS: &str = "id, name, description, notes, created_on, updated_on";

pub fn upsert_tool(conn: &Connection, t: &Tool) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO tools (id, name, description, notes, created_on, updated_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             description = excluded.description,
             notes = excluded.notes,
             created_on = excluded.created_on,
             updated_on = excluded.updated_on",
        params![t.id, t.name, t.description, t.notes, t.created_on, t.updated_on],
    )?;
    Ok(())
}

pub fn get_tool(conn: &Connection, id: Uuid) -> Result<Option<Tool>, OperationError> {
    let sql = format!("SELECT {TOOL_COLUMNS} FROM tools WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_tool)
}

pub(crate) fn row_to_tool(row: &Row<'_>) -> rusqlite::Result<Tool> {
    Ok(Tool {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        notes: row.get(3)?,
        created_on: row.get(4)?,
        updated_on: row.get(5)?,
    })
}

// ── Owner-scoped Operations ─────────────────────────────────────────────────

pub(crate) const ACTION_COLUMNS: &str =
    "id, owner_kind, owner_id, name, path, arguments, working_directory, is_primary, sort_order";

pub fn upsert_action(conn: &Connection, a: &Action) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO actions (id, owner_kind, owner_id, name, path, arguments,
             working_directory, is_primary, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             owner_kind = excluded.owner_kind,
             owner_id = excluded.owner_id,
             name = excluded.name,
             path = excluded.path,
             arguments = excluded.arguments,
             working_directory = excluded.working_directory,
             is_primary = excluded.is_primary,
             sort_order = excluded.sort_order",
        params![
            a.id,
            a.owner.kind.as_str(),
            a.owner.id,
            a.name,
            a.path,
            a.arguments,
            a.working_directory,
            a.is_primary,
            a.sort_order,
        ],
    )?;
    Ok(())
}

pub fn get_action(conn: &Connection, id: Uuid) -> Result<Option<Action>, OperationError> {
    let sql = format!("SELECT {ACTION_COLUMNS} FROM actions WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_action)
}

pub(crate) fn row_to_action(row: &Row<'_>) -> rusqlite::Result<Action> {
    Ok(Action {
        id: row.get(0)?,
        owner: owner_from_row(row, 1, 2)?,
        name: row.get(3)?,
        path: row.get(4)?,
        arguments: row.get(5)?,
        working_directory: row.get(6)?,
        is_primary: row.get(7)?,
        sort_order: row.get(8)?,
    })
}

pub(crate) const ARCHIVE_COLUMNS: &str = "id, owner_kind, owner_id, version, changelog, object_key,
    compressed_size, uncompressed_size, storage_location_id, created_on";

pub fn upsert_archive(conn: &Connection, a: &Archive) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO archives (id, owner_kind, owner_id, version, changelog, object_key,
             compressed_size, uncompressed_size, storage_location_id, created_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
             owner_kind = excluded.owner_kind,
             owner_id = excluded.owner_id,
             version = excluded.version,
             changelog = excluded.changelog,
             object_key = excluded.object_key,
             compressed_size = excluded.compressed_size,
             uncompressed_size = excluded.uncompressed_size,
             storage_location_id = excluded.storage_location_id,
             created_on = excluded.created_on",
        params![
            a.id,
            a.owner.kind.as_str(),
            a.owner.id,
            a.version,
            a.changelog,
            a.object_key,
            a.compressed_size,
            a.uncompressed_size,
            a.storage_location_id,
            a.created_on,
        ],
    )?;
    Ok(())
}

pub fn get_archive(conn: &Connection, id: Uuid) -> Result<Option<Archive>, OperationError> {
    let sql = format!("SELECT {ARCHIVE_COLUMNS} FROM archives WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_archive)
}

pub(crate) fn row_to_archive(row: &Row<'_>) -> rusqlite::Result<Archive> {
    Ok(Archive {
        id: row.get(0)?,
        owner: owner_from_row(row, 1, 2)?,
        version: row.get(3)?,
        changelog: row.get(4)?,
        object_key: row.get(5)?,
        compressed_size: row.get(6)?,
        uncompressed_size: row.get(7)?,
        storage_location_id: row.get(8)?,
        created_on: row.get(9)?,
    })
}

pub(crate) const SCRIPT_COLUMNS: &str =
    "id, owner_kind, owner_id, script_type, name, description, requires_admin, contents";

pub fn upsert_script(conn: &Connection, s: &Script) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO scripts (id, owner_kind, owner_id, script_type, name, description,
             requires_admin, contents)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             owner_kind = excluded.owner_kind,
             owner_id = excluded.owner_id,
             script_type = excluded.script_type,
             name = excluded.name,
             description = excluded.description,
             requires_admin = excluded.requires_admin,
             contents = excluded.contents",
        params![
            s.id,
            s.owner.kind.as_str(),
            s.owner.id,
            s.script_type.as_str(),
            s.name,
            s.description,
            s.requires_admin,
            s.contents,
        ],
    )?;
    Ok(())
}

pub fn get_script(conn: &Connection, id: Uuid) -> Result<Option<Script>, OperationError> {
    let sql = format!("SELECT {SCRIPT_COLUMNS} FROM scripts WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_script)
}

pub(crate) fn row_to_script(row: &Row<'_>) -> rusqlite::Result<Script> {
    let script_type: String = row.get(3)?;
    Ok(Script {
        id: row.get(0)?,
        owner: owner_from_row(row, 1, 2)?,
        script_type: ScriptType::from_str_loose(&script_type),
        name: row.get(4)?,
        description: row.get(5)?,
        requires_admin: row.get(6)?,
        contents: row.get(7)?,
    })
}

// ── Game-owned Operations ───────────────────────────────────────────────────

pub(crate) const CUSTOM_FIELD_COLUMNS: &str = "id, game_id, name, value";

pub fn upsert_custom_field(conn: &Connection, f: &CustomField) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO custom_fields (id, game_id, name, value)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             game_id = excluded.game_id,
             name = excluded.name,
             value = excluded.value",
        params![f.id, f.game_id, f.name, f.value],
    )?;
    Ok(())
}

pub fn get_custom_field(conn: &Connection, id: Uuid) -> Result<Option<CustomField>, OperationError> {
    let sql = format!("SELECT {CUSTOM_FIELD_COLUMNS} FROM custom_fields WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_custom_field)
}

pub(crate) fn row_to_custom_field(row: &Row<'_>) -> rusqlite::Result<CustomField> {
    Ok(CustomField {
        id: row.get(0)?,
        game_id: row.get(1)?,
        name: row.get(2)?,
        value: row.get(3)?,
    })
}

pub(crate) const KEY_COLUMNS: &str = "id, game_id, value, allocation_method,
    claimed_by_mac_address, claimed_by_ip_address, claimed_by_computer_name, claimed_on";

pub fn upsert_key(conn: &Connection, k: &Key) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO keys (id, game_id, value, allocation_method, claimed_by_mac_address,
             claimed_by_ip_address, claimed_by_computer_name, claimed_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             game_id = excluded.game_id,
             value = excluded.value,
             allocation_method = excluded.allocation_method,
             claimed_by_mac_address = excluded.claimed_by_mac_address,
             claimed_by_ip_address = excluded.claimed_by_ip_address,
             claimed_by_computer_name = excluded.claimed_by_computer_name,
             claimed_on = excluded.claimed_on",
        params![
            k.id,
            k.game_id,
            k.value,
            k.allocation_method.as_str(),
            k.claimed_by_mac_address,
            k.claimed_by_ip_address,
            k.claimed_by_computer_name,
            k.claimed_on,
        ],
    )?;
    Ok(())
}

pub fn get_key(conn: &Connection, id: Uuid) -> Result<Option<Key>, OperationError> {
    let sql = format!("SELECT {KEY_COLUMNS} FROM keys WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_key)
}

pub(crate) fn row_to_key(row: &Row<'_>) -> rusqlite::Result<Key> {
    let method: String = row.get(3)?;
    Ok(Key {
        id: row.get(0)?,
        game_id: row.get(1)?,
        value: row.get(2)?,
        allocation_method: KeyAllocationMethod::from_str_loose(&method),
        claimed_by_mac_address: row.get(4)?,
        claimed_by_ip_address: row.get(5)?,
        claimed_by_computer_name: row.get(6)?,
        claimed_on: row.get(7)?,
    })
}

pub(crate) const MEDIA_COLUMNS: &str =
    "id, game_id, file_id, media_type, source_url, mime_type, size, storage_location_id";

pub fn upsert_media(conn: &Connection, m: &Media) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO media (id, game_id, file_id, media_type, source_url, mime_type,
             size, storage_location_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             game_id = excluded.game_id,
             file_id = excluded.file_id,
             media_type = excluded.media_type,
             source_url = excluded.source_url,
             mime_type = excluded.mime_type,
             size = excluded.size,
             storage_location_id = excluded.storage_location_id",
        params![
            m.id,
            m.game_id,
            m.file_id,
            m.media_type.as_str(),
            m.source_url,
            m.mime_type,
            m.size,
            m.storage_location_id,
        ],
    )?;
    Ok(())
}

pub fn get_media(conn: &Connection, id: Uuid) -> Result<Option<Media>, OperationError> {
    let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_media)
}

pub(crate) fn row_to_media(row: &Row<'_>) -> rusqlite::Result<Media> {
    let media_type: String = row.get(3)?;
    Ok(Media {
        id: row.get(0)?,
        game_id: row.get(1)?,
        file_id: row.get(2)?,
        media_type: MediaType::from_str_loose(&media_type),
        source_url: row.get(4)?,
        mime_type: row.get(5)?,
        size: row.get(6)?,
        storage_location_id: row.get(7)?,
    })
}

pub(crate) const MULTIPLAYER_MODE_COLUMNS: &str =
    "id, game_id, mode_type, description, min_players, max_players, spectators";

pub fn upsert_multiplayer_mode(conn: &Connection, m: &MultiplayerMode) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO multiplayer_modes (id, game_id, mode_type, description, min_players,
             max_players, spectators)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             game_id = excluded.game_id,
             mode_type = excluded.mode_type,
             description = excluded.description,
             min_players = excluded.min_players,
             max_players = excluded.max_players,
             spectators = excluded.spectators",
        params![
            m.id,
            m.game_id,
            m.mode_type.as_str(),
            m.description,
            m.min_players,
            m.max_players,
            m.spectators,
        ],
    )?;
    Ok(())
}

pub fn get_multiplayer_mode(conn: &Connection, id: Uuid) -> Result<Option<MultiplayerMode>, OperationError> {
    let sql = format!("SELECT {MULTIPLAYER_MODE_COLUMNS} FROM multiplayer_modes WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_multiplayer_mode)
}

pub(crate) fn row_to_multiplayer_mode(row: &Row<'_>) -> rusqlite::Result<MultiplayerMode> {
    let mode_type: String = row.get(2)?;
    Ok(MultiplayerMode {
        id: row.get(0)?,
        game_id: row.get(1)?,
        mode_type: MultiplayerType::from_str_loose(&mode_type),
        description: row.get(3)?,
        min_players: row.get(4)?,
        max_players: row.get(5)?,
        spectators: row.get(6)?,
    })
}

pub(crate) const PLAY_SESSION_COLUMNS: &str = "id, game_id, user, started_on, ended_on";

pub fn upsert_play_session(conn: &Connection, p: &PlaySession) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO play_sessions (id, game_id, user, started_on, ended_on)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
             game_id = excluded.game_id,
             user = excluded.user,
             started_on = excluded.started_on,
             ended_on = excluded.ended_on",
        params![p.id, p.game_id, p.user, p.start, p.end],
    )?;
    Ok(())
}

pub fn get_play_session(conn: &Connection, id: Uuid) -> Result<Option<PlaySession>, OperationError> {
    let sql = format!("SELECT {PLAY_SESSION_COLUMNS} FROM play_sessions WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_play_session)
}

pub(crate) fn row_to_play_session(row: &Row<'_>) -> rusqlite::Result<PlaySession> {
    Ok(PlaySession {
        id: row.get(0)?,
        game_id: row.get(1)?,
        user: row.get(2)?,
        start: row.get(3)?,
        end: row.get(4)?,
    })
}

pub(crate) const SAVE_COLUMNS: &str = "id, game_id, user, size, storage_location_id, created_on";

pub fn upsert_save(conn: &Connection, s: &Save) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO saves (id, game_id, user, size, storage_location_id, created_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             game_id = excluded.game_id,
             user = excluded.user,
             size = excluded.size,
             storage_location_id = excluded.storage_location_id,
             created_on = excluded.created_on",
        params![s.id, s.game_id, s.user, s.size, s.storage_location_id, s.created_on],
    )?;
    Ok(())
}

pub fn get_save(conn: &Connection, id: Uuid) -> Result<Option<Save>, OperationError> {
    let sql = format!("SELECT {SAVE_COLUMNS} FROM saves WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_save)
}

pub(crate) fn row_to_save(row: &Row<'_>) -> rusqlite::Result<Save> {
    Ok(Save {
        id: row.get(0)?,
        game_id: row.get(1)?,
        user: row.get(2)?,
        size: row.get(3)?,
        storage_location_id: row.get(4)?,
        created_on: row.get(5)?,
    })
}

pub(crate) const SAVE_PATH_COLUMNS: &str =
    "id, game_id, path_type, path, working_directory, is_regex";

pub fn upsert_save_path(conn: &Connection, s: &SavePath) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO save_paths (id, game_id, path_type, path, working_directory, is_regex)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             game_id = excluded.game_id,
             path_type = excluded.path_type,
             path = excluded.path,
             working_directory = excluded.working_directory,
             is_regex = excluded.is_regex",
        params![
            s.id,
            s.game_id,
            s.path_type.as_str(),
            s.path,
            s.working_directory,
            s.is_regex,
        ],
    )?;
    Ok(())
}

pub fn get_save_path(conn: &Connection, id: Uuid) -> Result<Option<SavePath>, OperationError> {
    let sql = format!("SELECT {SAVE_PATH_COLUMNS} FROM save_paths WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_save_path)
}

pub(crate) fn row_to_save_path(row: &Row<'_>) -> rusqlite::Result<SavePath> {
    let path_type: String = row.get(2)?;
    Ok(SavePath {
        id: row.get(0)?,
        game_id: row.get(1)?,
        path_type: SavePathType::from_str_loose(&path_type),
        path: row.get(3)?,
        working_directory: row.get(4)?,
        is_regex: row.get(5)?,
    })
}

// ── Server-owned Operations ─────────────────────────────────────────────────

pub(crate) const SERVER_CONSOLE_COLUMNS: &str =
    "id, server_id, name, console_type, path, host, port, password";

pub fn upsert_server_console(conn: &Connection, c: &ServerConsole) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO server_consoles (id, server_id, name, console_type, path, host, port, password)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             server_id = excluded.server_id,
             name = excluded.name,
             console_type = excluded.console_type,
             path = excluded.path,
             host = excluded.host,
             port = excluded.port,
             password = excluded.password",
        params![
            c.id,
            c.server_id,
            c.name,
            c.console_type.as_str(),
            c.path,
            c.host,
            c.port,
            c.password,
        ],
    )?;
    Ok(())
}

pub fn get_server_console(conn: &Connection, id: Uuid) -> Result<Option<ServerConsole>, OperationError> {
    let sql = format!("SELECT {SERVER_CONSOLE_COLUMNS} FROM server_consoles WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_server_console)
}

pub(crate) fn row_to_server_console(row: &Row<'_>) -> rusqlite::Result<ServerConsole> {
    let console_type: String = row.get(3)?;
    Ok(ServerConsole {
        id: row.get(0)?,
        server_id: row.get(1)?,
        name: row.get(2)?,
        console_type: ServerConsoleType::from_str_loose(&console_type),
        path: row.get(4)?,
        host: row.get(5)?,
        port: row.get(6)?,
        password: row.get(7)?,
    })
}

pub(crate) const SERVER_HTTP_PATH_COLUMNS: &str = "id, server_id, local_path, path";

pub fn upsert_server_http_path(conn: &Connection, p: &ServerHttpPath) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO server_http_paths (id, server_id, local_path, path)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             server_id = excluded.server_id,
             local_path = excluded.local_path,
             path = excluded.path",
        params![p.id, p.server_id, p.local_path, p.path],
    )?;
    Ok(())
}

pub fn get_server_http_path(conn: &Connection, id: Uuid) -> Result<Option<ServerHttpPath>, OperationError> {
    let sql = format!("SELECT {SERVER_HTTP_PATH_COLUMNS} FROM server_http_paths WHERE id = ?1");
    query_one(conn, &sql, params![id], row_to_server_http_path)
}

pub(crate) fn row_to_server_http_path(row: &Row<'_>) -> rusqlite::Result<ServerHttpPath> {
    Ok(ServerHttpPath {
        id: row.get(0)?,
        server_id: row.get(1)?,
        local_path: row.get(2)?,
        path: row.get(3)?,
    })
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Run a single-row query, mapping "no rows" to `None`.
pub(crate) fn query_one<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Option<T>, OperationError> {
    let mut stmt = conn.prepare(sql)?;
    match stmt.query_row(params, map) {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn owner_from_row(row: &Row<'_>, kind_idx: usize, id_idx: usize) -> rusqlite::Result<Owner> {
    let kind: String = row.get(kind_idx)?;
    let kind = RootKind::from_str_loose(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            kind_idx,
            rusqlite::types::Type::Text,
            format!("unknown owner kind '{kind}'").into(),
        )
    })?;
    Ok(Owner::new(kind, row.get(id_idx)?))
}
