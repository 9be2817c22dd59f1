//! Read queries for the library database.
//!
//! Root graphs are loaded eagerly: every dependent collection of a root is
//! materialized before the graph is returned. Rows within a collection come
//! back in insertion order, so repeated loads of an unchanged root agree.

use lanpack_model::*;
use rusqlite::{Connection, Params, Row, params};
use serde::Serialize;
use uuid::Uuid;

use crate::operations::{self, OperationError};
use crate::relation::{Relation, linked_ids};

/// One line of a root listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootSummary {
    pub kind: RootKind,
    pub id: Uuid,
    pub name: String,
}

// ── Root Graphs ─────────────────────────────────────────────────────────────

/// Load any root kind with its dependents.
pub fn load_root_graph(
    conn: &Connection,
    kind: RootKind,
    id: Uuid,
) -> Result<Option<RootGraph>, OperationError> {
    let graph = match kind {
        RootKind::Game => load_game_graph(conn, id)?.map(RootGraph::Game),
        RootKind::Redistributable => {
            load_redistributable_graph(conn, id)?.map(RootGraph::Redistributable)
        }
        RootKind::Server => load_server_graph(conn, id)?.map(RootGraph::Server),
        RootKind::Tool => load_tool_graph(conn, id)?.map(RootGraph::Tool),
    };
    Ok(graph)
}

pub fn load_game_graph(conn: &Connection, id: Uuid) -> Result<Option<GameGraph>, OperationError> {
    let Some(game) = operations::get_game(conn, id)? else {
        return Ok(None);
    };
    let owner = Owner::new(RootKind::Game, id);

    let engine = match game.engine_id {
        Some(engine_id) => operations::get_lookup(conn, EntityKind::Engine, engine_id)?,
        None => None,
    };

    Ok(Some(GameGraph {
        engine,
        actions: actions_for(conn, owner)?,
        archives: archives_for(conn, owner)?,
        collections: linked_lookups(conn, Relation::GameCollections, id)?,
        custom_fields: game_rows(
            conn,
            "custom_fields",
            operations::CUSTOM_FIELD_COLUMNS,
            id,
            operations::row_to_custom_field,
        )?,
        developers: linked_lookups(conn, Relation::GameDevelopers, id)?,
        publishers: linked_lookups(conn, Relation::GamePublishers, id)?,
        genres: linked_lookups(conn, Relation::GameGenres, id)?,
        keys: game_rows(conn, "keys", operations::KEY_COLUMNS, id, operations::row_to_key)?,
        media: game_rows(conn, "media", operations::MEDIA_COLUMNS, id, operations::row_to_media)?,
        multiplayer_modes: game_rows(
            conn,
            "multiplayer_modes",
            operations::MULTIPLAYER_MODE_COLUMNS,
            id,
            operations::row_to_multiplayer_mode,
        )?,
        platforms: linked_lookups(conn, Relation::GamePlatforms, id)?,
        play_sessions: game_rows(
            conn,
            "play_sessions",
            operations::PLAY_SESSION_COLUMNS,
            id,
            operations::row_to_play_session,
        )?,
        saves: game_rows(conn, "saves", operations::SAVE_COLUMNS, id, operations::row_to_save)?,
        save_paths: game_rows(
            conn,
            "save_paths",
            operations::SAVE_PATH_COLUMNS,
            id,
            operations::row_to_save_path,
        )?,
        scripts: scripts_for(conn, owner)?,
        tags: linked_lookups(conn, Relation::GameTags, id)?,
        game,
    }))
}

pub fn load_redistributable_graph(
    conn: &Connection,
    id: Uuid,
) -> Result<Option<RedistributableGraph>, OperationError> {
    let Some(redistributable) = operations::get_redistributable(conn, id)? else {
        return Ok(None);
    };
    let owner = Owner::new(RootKind::Redistributable, id);
    Ok(Some(RedistributableGraph {
        redistributable,
        actions: actions_for(conn, owner)?,
        archives: archives_for(conn, owner)?,
        scripts: scripts_for(conn, owner)?,
    }))
}

pub fn load_server_graph(conn: &Connection, id: Uuid) -> Result<Option<ServerGraph>, OperationError> {
    let Some(server) = operations::get_server(conn, id)? else {
        return Ok(None);
    };
    let owner = Owner::new(RootKind::Server, id);
    Ok(Some(ServerGraph {
        server,
        actions: actions_for(conn, owner)?,
        scripts: scripts_for(conn, owner)?,
        consoles: collect_rows(
            conn,
            &format!(
                "SELECT {} FROM server_consoles WHERE server_id = ?1 ORDER BY rowid",
                operations::SERVER_CONSOLE_COLUMNS
            ),
            params![id],
            operations::row_to_server_console,
        )?,
        http_paths: collect_rows(
            conn,
            &format!(
                "SELECT {} FROM server_http_paths WHERE server_id = ?1 ORDER BY rowid",
                operations::SERVER_HTTP_PATH_COLUMNS
            ),
            params![id],
            operations::row_to_server_http_path,
        )?,
    }))
}

pub fn load_tool_graph(conn: &Connection, id: Uuid) -> Result<Option<ToolGraph>, OperationError> {
    let Some(tool) = operations::get_tool(conn, id)? else {
        return Ok(None);
    };
    let owner = Owner::new(RootKind::Tool, id);
    Ok(Some(ToolGraph {
        tool,
        games: linked_ids(conn, Relation::ToolGames, id)?,
        actions: actions_for(conn, owner)?,
        archives: archives_for(conn, owner)?,
        scripts: scripts_for(conn, owner)?,
    }))
}

// ── Owner-scoped Lists ──────────────────────────────────────────────────────

/// Actions of a root, primary first, then by sort order.
pub fn actions_for(conn: &Connection, owner: Owner) -> Result<Vec<Action>, OperationError> {
    collect_rows(
        conn,
        &format!(
            "SELECT {} FROM actions WHERE owner_kind = ?1 AND owner_id = ?2
             ORDER BY is_primary DESC, sort_order, rowid",
            operations::ACTION_COLUMNS
        ),
        params![owner.kind.as_str(), owner.id],
        operations::row_to_action,
    )
}

pub fn archives_for(conn: &Connection, owner: Owner) -> Result<Vec<Archive>, OperationError> {
    collect_rows(
        conn,
        &format!(
            "SELECT {} FROM archives WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY rowid",
            operations::ARCHIVE_COLUMNS
        ),
        params![owner.kind.as_str(), owner.id],
        operations::row_to_archive,
    )
}

pub fn scripts_for(conn: &Connection, owner: Owner) -> Result<Vec<Script>, OperationError> {
    collect_rows(
        conn,
        &format!(
            "SELECT {} FROM scripts WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY rowid",
            operations::SCRIPT_COLUMNS
        ),
        params![owner.kind.as_str(), owner.id],
        operations::row_to_script,
    )
}

fn game_rows<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    game_id: Uuid,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, OperationError> {
    collect_rows(
        conn,
        &format!("SELECT {columns} FROM {table} WHERE game_id = ?1 ORDER BY rowid"),
        params![game_id],
        map,
    )
}

/// Lookup rows linked to `owner_id`, in attachment order.
fn linked_lookups(
    conn: &Connection,
    relation: Relation,
    owner_id: Uuid,
) -> Result<Vec<Lookup>, OperationError> {
    let mut lookups = Vec::new();
    for id in linked_ids(conn, relation, owner_id)? {
        if let Some(lookup) = operations::get_lookup(conn, relation.target_kind(), id)? {
            lookups.push(lookup);
        }
    }
    Ok(lookups)
}

// ── Listing & Stats ─────────────────────────────────────────────────────────

/// List roots, optionally restricted to one kind, ordered by kind then name.
pub fn list_roots(
    conn: &Connection,
    kind: Option<RootKind>,
) -> Result<Vec<RootSummary>, OperationError> {
    let kinds: Vec<RootKind> = match kind {
        Some(k) => vec![k],
        None => RootKind::ALL.to_vec(),
    };

    let mut out = Vec::new();
    for kind in kinds {
        let (table, name_column) = match kind {
            RootKind::Game => ("games", "title"),
            RootKind::Redistributable => ("redistributables", "name"),
            RootKind::Server => ("servers", "name"),
            RootKind::Tool => ("tools", "name"),
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT id, {name_column} FROM {table} ORDER BY {name_column} COLLATE NOCASE"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(RootSummary {
                kind,
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        for row in rows {
            out.push(row?);
        }
    }
    Ok(out)
}

/// Count rows of one entity kind.
pub fn count_rows(conn: &Connection, kind: EntityKind) -> Result<i64, OperationError> {
    let sql = format!("SELECT COUNT(*) FROM {}", operations::table_name(kind));
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}

fn collect_rows<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, OperationError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}
