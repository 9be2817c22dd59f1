//! Root converters: game, redistributable, server, and tool.
//!
//! A root is never queued. Export maps it straight to a manifest whose
//! sub-record lists start empty; import fetches or creates it once, before
//! the queue is drained.

use lanpack_model::manifest::{
    GameManifest, RedistributableManifest, ServerManifest, ToolManifest,
};
use lanpack_model::{
    Entity, EntityKind, Game, GameGraph, MANIFEST_VERSION, Manifest, Redistributable,
    RedistributableGraph, RootKind, Server, ServerGraph, Tool, ToolGraph,
};

use crate::converter::{ImportSession, Importer, or_now};
use crate::converters::lookup::EngineConverter;
use crate::error::SyncError;

pub trait RootExporter {
    type Graph;
    const KIND: RootKind;

    /// The root's own fields as a manifest with empty sub-record lists.
    fn export_root(graph: &Self::Graph) -> Manifest;
}

pub trait RootImporter {
    type Manifest;
    const KIND: RootKind;

    fn exists(session: &mut ImportSession<'_>, manifest: &Self::Manifest)
    -> Result<bool, SyncError>;

    /// Fetch or create the root and copy the manifest's fields onto it.
    ///
    /// Returns the tracked root and whether it already existed.
    fn upsert_root(
        session: &mut ImportSession<'_>,
        manifest: &Self::Manifest,
    ) -> Result<(Entity, bool), SyncError>;
}

/// Shared fetch-or-create for every root kind: `C::exists`, then merge or add.
fn upsert<C: RootImporter>(
    session: &mut ImportSession<'_>,
    manifest: &C::Manifest,
    entity: Entity,
) -> Result<(Entity, bool), SyncError> {
    if C::exists(session, manifest)? {
        Ok((session.merge_entity(entity)?, true))
    } else {
        Ok((session.add_entity(entity)?, false))
    }
}

// ── Games ───────────────────────────────────────────────────────────────────

pub struct GameConverter;

impl RootExporter for GameConverter {
    type Graph = GameGraph;
    const KIND: RootKind = RootKind::Game;

    fn export_root(graph: &GameGraph) -> Manifest {
        let g = &graph.game;
        Manifest::Game(GameManifest {
            manifest_version: MANIFEST_VERSION.to_string(),
            id: g.id,
            title: g.title.clone(),
            sort_title: g.sort_title.clone(),
            description: g.description.clone(),
            notes: g.notes.clone(),
            released_on: g.released_on.clone(),
            singleplayer: g.singleplayer,
            igdb_id: g.igdb_id,
            game_type: g.game_type,
            base_game_id: g.base_game_id,
            engine: None,
            created_on: g.created_on.clone(),
            updated_on: g.updated_on.clone(),
            actions: Vec::new(),
            archives: Vec::new(),
            collections: Vec::new(),
            custom_fields: Vec::new(),
            developers: Vec::new(),
            publishers: Vec::new(),
            genres: Vec::new(),
            keys: Vec::new(),
            media: Vec::new(),
            multiplayer_modes: Vec::new(),
            platforms: Vec::new(),
            play_sessions: Vec::new(),
            saves: Vec::new(),
            save_paths: Vec::new(),
            scripts: Vec::new(),
            tags: Vec::new(),
        })
    }
}

impl RootImporter for GameConverter {
    type Manifest = GameManifest;
    const KIND: RootKind = RootKind::Game;

    fn exists(session: &mut ImportSession<'_>, m: &GameManifest) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Game, m.id)
    }

    /// The engine is resolved through [`EngineConverter`] so it dedups by
    /// name like every other lookup. A manifest without an engine keeps the
    /// stored game's engine.
    fn upsert_root(
        session: &mut ImportSession<'_>,
        m: &GameManifest,
    ) -> Result<(Entity, bool), SyncError> {
        let current_engine = match session.tracker.load(session.conn, EntityKind::Game, m.id)? {
            Some(Entity::Game(existing)) => existing.engine_id,
            _ => None,
        };

        let game = Entity::Game(Game {
            id: m.id,
            title: m.title.clone(),
            sort_title: m.sort_title.clone(),
            description: m.description.clone(),
            notes: m.notes.clone(),
            released_on: m.released_on.clone(),
            singleplayer: m.singleplayer,
            igdb_id: m.igdb_id,
            game_type: m.game_type,
            base_game_id: m.base_game_id,
            engine_id: current_engine,
            created_on: or_now(&m.created_on),
            updated_on: or_now(&m.updated_on),
        });
        let (root, existed) = upsert::<Self>(session, m, game)?;

        let Some(engine) = &m.engine else {
            return Ok((root, existed));
        };
        let (engine, _) = EngineConverter::upsert(session, engine)?;
        session.reconciler().merge_reference(
            EntityKind::Game,
            m.id,
            Some(engine),
            |owner, engine_id| {
                if let Entity::Game(game) = owner {
                    game.engine_id = engine_id;
                }
            },
        )?;
        Ok((session.tracked(EntityKind::Game, m.id)?, existed))
    }
}

// ── Redistributables ────────────────────────────────────────────────────────

pub struct RedistributableConverter;

impl RootExporter for RedistributableConverter {
    type Graph = RedistributableGraph;
    const KIND: RootKind = RootKind::Redistributable;

    fn export_root(graph: &RedistributableGraph) -> Manifest {
        let r = &graph.redistributable;
        Manifest::Redistributable(RedistributableManifest {
            manifest_version: MANIFEST_VERSION.to_string(),
            id: r.id,
            name: r.name.clone(),
            description: r.description.clone(),
            notes: r.notes.clone(),
            created_on: r.created_on.clone(),
            updated_on: r.updated_on.clone(),
            actions: Vec::new(),
            archives: Vec::new(),
            scripts: Vec::new(),
        })
    }
}

impl RootImporter for RedistributableConverter {
    type Manifest = RedistributableManifest;
    const KIND: RootKind = RootKind::Redistributable;

    fn exists(
        session: &mut ImportSession<'_>,
        m: &RedistributableManifest,
    ) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Redistributable, m.id)
    }

    fn upsert_root(
        session: &mut ImportSession<'_>,
        m: &RedistributableManifest,
    ) -> Result<(Entity, bool), SyncError> {
        let redistributable = Entity::Redistributable(Redistributable {
            id: m.id,
            name: m.name.clone(),
            description: m.description.clone(),
            notes: m.notes.clone(),
            created_on: or_now(&m.created_on),
            updated_on: or_now(&m.updated_on),
        });
        upsert::<Self>(session, m, redistributable)
    }
}

// ── Servers ─────────────────────────────────────────────────────────────────

pub struct ServerConverter;

impl RootExporter for ServerConverter {
    type Graph = ServerGraph;
    const KIND: RootKind = RootKind::Server;

    fn export_root(graph: &ServerGraph) -> Manifest {
        let s = &graph.server;
        Manifest::Server(ServerManifest {
            manifest_version: MANIFEST_VERSION.to_string(),
            id: s.id,
            name: s.name.clone(),
            game_id: s.game_id,
            path: s.path.clone(),
            arguments: s.arguments.clone(),
            working_directory: s.working_directory.clone(),
            host: s.host.clone(),
            port: s.port,
            use_shell_execute: s.use_shell_execute,
            autostart: s.autostart,
            autostart_delay: s.autostart_delay,
            created_on: s.created_on.clone(),
            updated_on: s.updated_on.clone(),
            actions: Vec::new(),
            scripts: Vec::new(),
            server_consoles: Vec::new(),
            server_http_paths: Vec::new(),
        })
    }
}

impl RootImporter for ServerConverter {
    type Manifest = ServerManifest;
    const KIND: RootKind = RootKind::Server;

    fn exists(session: &mut ImportSession<'_>, m: &ServerManifest) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Server, m.id)
    }

    fn upsert_root(
        session: &mut ImportSession<'_>,
        m: &ServerManifest,
    ) -> Result<(Entity, bool), SyncError> {
        let server = Entity::Server(Server {
            id: m.id,
            name: m.name.clone(),
            game_id: m.game_id,
            path: m.path.clone(),
            arguments: m.arguments.clone(),
            working_directory: m.working_directory.clone(),
            host: m.host.clone(),
            port: m.port,
            use_shell_execute: m.use_shell_execute,
            autostart: m.autostart,
            autostart_delay: m.autostart_delay,
            created_on: or_now(&m.created_on),
            updated_on: or_now(&m.updated_on),
        });
        upsert::<Self>(session, m, server)
    }
}

// ── Tools ───────────────────────────────────────────────────────────────────

pub struct ToolConverter;

impl RootExporter for ToolConverter {
    type Graph = ToolGraph;
    const KIND: RootKind = RootKind::Tool;

    /// Associated games travel with the root rather than as queued records.
    fn export_root(graph: &ToolGraph) -> Manifest {
        let t = &graph.tool;
        Manifest::Tool(ToolManifest {
            manifest_version: MANIFEST_VERSION.to_string(),
            id: t.id,
            name: t.name.clone(),
            description: t.description.clone(),
            notes: t.notes.clone(),
            created_on: t.created_on.clone(),
            updated_on: t.updated_on.clone(),
            games: graph.games.clone(),
            actions: Vec::new(),
            archives: Vec::new(),
            scripts: Vec::new(),
        })
    }
}

impl RootImporter for ToolConverter {
    type Manifest = ToolManifest;
    const KIND: RootKind = RootKind::Tool;

    fn exists(session: &mut ImportSession<'_>, m: &ToolManifest) -> Result<bool, SyncError> {
        session.exists_by_id(EntityKind::Tool, m.id)
    }

    fn upsert_root(
        session: &mut ImportSession<'_>,
        m: &ToolManifest,
    ) -> Result<(Entity, bool), SyncError> {
        let tool = Entity::Tool(Tool {
            id: m.id,
            name: m.name.clone(),
            description: m.description.clone(),
            notes: m.notes.clone(),
            created_on: or_now(&m.created_on),
            updated_on: or_now(&m.updated_on),
        });
        upsert::<Self>(session, m, tool)
    }
}
