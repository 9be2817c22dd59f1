//! SQLite schema creation and migration.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: expected version {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
}

/// Current schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 1;

/// Create all tables and indexes if they don't exist.
///
/// This is idempotent: safe to call on an existing database.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SCHEMA_SQL)?;
    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Open or create a library database at the given path.
pub fn open_database(path: &std::path::Path) -> Result<Connection, SchemaError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    let version = get_schema_version(&conn)?;
    if version == 0 {
        create_schema(&conn)?;
    } else if version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: version,
        });
    }

    Ok(conn)
}

/// Open an in-memory database with the full schema. Useful for testing.
pub fn open_memory() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Get the current schema version, or 0 if no schema exists.
fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Filesystem roots for binary payloads
CREATE TABLE IF NOT EXISTS storage_locations (
    id BLOB PRIMARY KEY,
    path TEXT NOT NULL,
    location_type TEXT NOT NULL,
    is_default BOOLEAN NOT NULL DEFAULT 0
);

-- Name-keyed lookups shared across roots
CREATE TABLE IF NOT EXISTS collections (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS companies (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS engines (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS genres (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS platforms (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS tags (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- Roots
CREATE TABLE IF NOT EXISTS games (
    id BLOB PRIMARY KEY,
    title TEXT NOT NULL,
    sort_title TEXT,
    description TEXT,
    notes TEXT,
    released_on TEXT,
    singleplayer BOOLEAN NOT NULL DEFAULT 0,
    igdb_id INTEGER,
    game_type TEXT NOT NULL DEFAULT 'main_game',
    base_game_id BLOB,
    engine_id BLOB REFERENCES engines(id) ON DELETE SET NULL,
    created_on TEXT NOT NULL,
    updated_on TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS redistributables (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    notes TEXT,
    created_on TEXT NOT NULL,
    updated_on TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS servers (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    game_id BLOB,
    path TEXT NOT NULL,
    arguments TEXT,
    working_directory TEXT,
    host TEXT,
    port INTEGER NOT NULL,
    use_shell_execute BOOLEAN NOT NULL DEFAULT 0,
    autostart BOOLEAN NOT NULL DEFAULT 0,
    autostart_delay INTEGER NOT NULL DEFAULT 0,
    created_on TEXT NOT NULL,
    updated_on TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tools (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    notes TEXT,
    created_on TEXT NOT NULL,
    updated_on TEXT NOT NULL
);

-- Sub-records owned by any root kind
CREATE TABLE IF NOT EXISTS actions (
    id BLOB PRIMARY KEY,
    owner_kind TEXT NOT NULL,
    owner_id BLOB NOT NULL,
    name TEXT NOT NULL,
    path TEXT NOT NULL,
    arguments TEXT,
    working_directory TEXT,
    is_primary BOOLEAN NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_actions_owner ON actions(owner_kind, owner_id);

CREATE TABLE IF NOT EXISTS archives (
    id BLOB PRIMARY KEY,
    owner_kind TEXT NOT NULL,
    owner_id BLOB NOT NULL,
    version TEXT NOT NULL,
    changelog TEXT,
    object_key TEXT NOT NULL,
    compressed_size INTEGER NOT NULL DEFAULT 0,
    uncompressed_size INTEGER NOT NULL DEFAULT 0,
    storage_location_id BLOB REFERENCES storage_locations(id),
    created_on TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_archives_owner ON archives(owner_kind, owner_id);

CREATE TABLE IF NOT EXISTS scripts (
    id BLOB PRIMARY KEY,
    owner_kind TEXT NOT NULL,
    owner_id BLOB NOT NULL,
    script_type TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    requires_admin BOOLEAN NOT NULL DEFAULT 0,
    contents TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_scripts_owner ON scripts(owner_kind, owner_id);

-- Sub-records owned by a game
CREATE TABLE IF NOT EXISTS custom_fields (
    id BLOB PRIMARY KEY,
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_custom_fields_game ON custom_fields(game_id);

CREATE TABLE IF NOT EXISTS keys (
    id BLOB PRIMARY KEY,
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    value TEXT NOT NULL,
    allocation_method TEXT NOT NULL,
    claimed_by_mac_address TEXT,
    claimed_by_ip_address TEXT,
    claimed_by_computer_name TEXT,
    claimed_on TEXT
);
CREATE INDEX IF NOT EXISTS idx_keys_game ON keys(game_id);

CREATE TABLE IF NOT EXISTS media (
    id BLOB PRIMARY KEY,
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    file_id BLOB NOT NULL,
    media_type TEXT NOT NULL,
    source_url TEXT,
    mime_type TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0,
    storage_location_id BLOB REFERENCES storage_locations(id)
);
CREATE INDEX IF NOT EXISTS idx_media_game ON media(game_id);

CREATE TABLE IF NOT EXISTS multiplayer_modes (
    id BLOB PRIMARY KEY,
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    mode_type TEXT NOT NULL,
    description TEXT,
    min_players INTEGER NOT NULL DEFAULT 0,
    max_players INTEGER NOT NULL DEFAULT 0,
    spectators INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_multiplayer_modes_game ON multiplayer_modes(game_id);

CREATE TABLE IF NOT EXISTS play_sessions (
    id BLOB PRIMARY KEY,
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    user TEXT NOT NULL,
    started_on TEXT,
    ended_on TEXT
);
CREATE INDEX IF NOT EXISTS idx_play_sessions_game ON play_sessions(game_id);

CREATE TABLE IF NOT EXISTS saves (
    id BLOB PRIMARY KEY,
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    user TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0,
    storage_location_id BLOB REFERENCES storage_locations(id),
    created_on TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_saves_game ON saves(game_id);

CREATE TABLE IF NOT EXISTS save_paths (
    id BLOB PRIMARY KEY,
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    path_type TEXT NOT NULL,
    path TEXT NOT NULL,
    working_directory TEXT,
    is_regex BOOLEAN NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_save_paths_game ON save_paths(game_id);

-- Sub-records owned by a server
CREATE TABLE IF NOT EXISTS server_consoles (
    id BLOB PRIMARY KEY,
    server_id BLOB NOT NULL REFERENCES servers(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    console_type TEXT NOT NULL,
    path TEXT,
    host TEXT,
    port INTEGER,
    password TEXT
);
CREATE INDEX IF NOT EXISTS idx_server_consoles_server ON server_consoles(server_id);

CREATE TABLE IF NOT EXISTS server_http_paths (
    id BLOB PRIMARY KEY,
    server_id BLOB NOT NULL REFERENCES servers(id) ON DELETE CASCADE,
    local_path TEXT NOT NULL,
    path TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_server_http_paths_server ON server_http_paths(server_id);

-- Link tables (rowid order is attachment order)
CREATE TABLE IF NOT EXISTS game_collections (
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    collection_id BLOB NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    PRIMARY KEY (game_id, collection_id)
);
CREATE TABLE IF NOT EXISTS game_developers (
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    company_id BLOB NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    PRIMARY KEY (game_id, company_id)
);
CREATE TABLE IF NOT EXISTS game_publishers (
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    company_id BLOB NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    PRIMARY KEY (game_id, company_id)
);
CREATE TABLE IF NOT EXISTS game_genres (
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    genre_id BLOB NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (game_id, genre_id)
);
CREATE TABLE IF NOT EXISTS game_platforms (
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    platform_id BLOB NOT NULL REFERENCES platforms(id) ON DELETE CASCADE,
    PRIMARY KEY (game_id, platform_id)
);
CREATE TABLE IF NOT EXISTS game_tags (
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    tag_id BLOB NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (game_id, tag_id)
);
CREATE TABLE IF NOT EXISTS tool_games (
    tool_id BLOB NOT NULL REFERENCES tools(id) ON DELETE CASCADE,
    game_id BLOB NOT NULL REFERENCES games(id) ON DELETE CASCADE,
    PRIMARY KEY (tool_id, game_id)
);
"#;
