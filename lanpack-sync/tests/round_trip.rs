mod common;

use std::fs;
use std::path::Path;

use common::*;
use lanpack_db::*;
use lanpack_model::*;
use lanpack_sync::*;
use uuid::Uuid;

#[test]
fn game_survives_export_and_import_into_empty_library() {
    let source = Library::new();
    let seeded = seed_game(&source, "Quake III Arena");
    let package = source.package_path("quake3.zip");

    let exported = export_all(&source.conn, RootKind::Game, seeded.game.id, &package);
    assert_eq!(exported.failed, 0);
    assert_eq!(exported.exported, 17);

    let target = Library::new();
    let imported = import_all(&target, &package);
    assert_eq!(imported.failed, 0, "{:?}", imported.errors);
    assert!(!imported.root_existed);
    assert_eq!(imported.added + imported.updated, exported.exported);

    let before = source.game_graph(seeded.game.id);
    let after = target.game_graph(seeded.game.id);
    assert_eq!(after.game.title, before.game.title);
    assert_eq!(after.game.igdb_id, before.game.igdb_id);
    assert_eq!(after.engine.as_ref().map(|e| &e.name), Some(&"id Tech 3".to_string()));
    assert_eq!(after.genres, before.genres);
    assert_eq!(after.developers, before.developers);
    assert_eq!(after.publishers, before.publishers);
    assert_eq!(after.platforms, before.platforms);
    assert_eq!(after.tags, before.tags);
    assert_eq!(after.collections, before.collections);
    assert_eq!(after.actions, before.actions);
    assert_eq!(after.custom_fields, before.custom_fields);
    assert_eq!(after.keys, before.keys);
    assert_eq!(after.multiplayer_modes, before.multiplayer_modes);
    assert_eq!(after.play_sessions, before.play_sessions);
    assert_eq!(after.save_paths, before.save_paths);
    assert_eq!(after.scripts.len(), 1);
    assert_eq!(after.scripts[0].contents, INSTALL_SCRIPT);

    // Payloads land in the target library's own locations.
    assert_eq!(after.archives.len(), 1);
    assert_eq!(after.archives[0].storage_location_id, Some(target.archives.id));
    let archive_file = Path::new(&target.archives.path).join("quake3-1.32.zip");
    assert_eq!(fs::read(archive_file).unwrap(), ARCHIVE_BYTES);

    assert_eq!(after.media.len(), 1);
    assert_eq!(after.media[0].storage_location_id, Some(target.media.id));
    let cover = Path::new(&target.media.path).join(seeded.media.file_id.to_string());
    assert_eq!(fs::read(cover).unwrap(), COVER_BYTES);

    assert_eq!(after.saves.len(), 1);
    let save = Path::new(&target.saves.path).join(seeded.save.id.to_string());
    assert_eq!(fs::read(save).unwrap(), SAVE_BYTES);
}

#[test]
fn reimport_into_source_library_changes_nothing() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");
    let package = lib.package_path("quake3.zip");
    let exported = export_all(&lib.conn, RootKind::Game, seeded.game.id, &package);
    let before = lib.game_graph(seeded.game.id);

    let mut ctx = ImportContext::open(&lib.conn, &package).unwrap();
    ctx.initialize().unwrap();
    ctx.prepare_queue(&Selection::All, lib.archives.id).unwrap();
    let summary = ctx.import_queue().unwrap();
    ctx.save_changes().unwrap();

    assert!(summary.root_existed);
    assert_eq!(summary.added, 0);
    assert_eq!(summary.updated, exported.exported);
    assert_eq!(lib.game_graph(seeded.game.id), before);
    assert_eq!(lib.count(EntityKind::Genre), 1);
    assert_eq!(lib.count(EntityKind::Company), 1);
}

#[test]
fn importing_twice_is_idempotent() {
    let source = Library::new();
    let seeded = seed_game(&source, "Quake III Arena");
    let package = source.package_path("quake3.zip");
    export_all(&source.conn, RootKind::Game, seeded.game.id, &package);

    let target = Library::new();
    import_all(&target, &package);
    let first = target.game_graph(seeded.game.id);
    let second_summary = import_all(&target, &package);

    assert_eq!(second_summary.added, 0);
    assert_eq!(target.game_graph(seeded.game.id), first);
    for kind in [
        EntityKind::Game,
        EntityKind::Engine,
        EntityKind::Genre,
        EntityKind::Action,
        EntityKind::Archive,
        EntityKind::Script,
        EntityKind::Media,
        EntityKind::Save,
    ] {
        assert_eq!(target.count(kind), 1, "{kind}");
    }
}

#[test]
fn repeated_exports_write_identical_manifests() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");
    let first = lib.package_path("first.zip");
    let second = lib.package_path("second.zip");

    export_all(&lib.conn, RootKind::Game, seeded.game.id, &first);
    export_all(&lib.conn, RootKind::Game, seeded.game.id, &second);

    assert_eq!(manifest_text(&first), manifest_text(&second));
}

#[test]
fn server_package_round_trips() {
    let source = Library::new();
    let server = Server {
        id: Uuid::new_v4(),
        name: "Quake Dedicated".to_string(),
        game_id: Some(Uuid::new_v4()),
        path: "q3ded.exe".to_string(),
        arguments: Some("+map q3dm17".to_string()),
        working_directory: None,
        host: Some("0.0.0.0".to_string()),
        port: 27960,
        use_shell_execute: false,
        autostart: true,
        autostart_delay: 5,
        created_on: "2024-01-01T00:00:00+00:00".to_string(),
        updated_on: "2024-01-01T00:00:00+00:00".to_string(),
    };
    let owner = Owner::new(RootKind::Server, server.id);
    source.save(Entity::Server(server.clone()));
    source.save(Entity::Action(action(owner, "Start")));
    source.save(Entity::Script(script(owner, "Rotate logs", "Remove-Item *.log")));
    source.save(Entity::ServerConsole(ServerConsole {
        id: Uuid::new_v4(),
        server_id: server.id,
        name: "RCON".to_string(),
        console_type: ServerConsoleType::Rcon,
        path: None,
        host: Some("127.0.0.1".to_string()),
        port: Some(27960),
        password: Some("secret".to_string()),
    }));
    source.save(Entity::ServerHttpPath(ServerHttpPath {
        id: Uuid::new_v4(),
        server_id: server.id,
        local_path: "C:/maps".to_string(),
        path: "/maps".to_string(),
    }));

    let package = source.package_path("server.zip");
    let exported = export_all(&source.conn, RootKind::Server, server.id, &package);
    assert_eq!(exported.exported, 4);

    let target = Library::new();
    let mut ctx = ImportContext::open(&target.conn, &package).unwrap();
    ctx.initialize().unwrap();
    assert_eq!(ctx.manifest().map(Manifest::kind), Some(RootKind::Server));
    ctx.prepare_queue(&Selection::All, target.archives.id).unwrap();
    let summary = ctx.import_queue().unwrap();
    ctx.save_changes().unwrap();
    assert_eq!(summary.failed, 0);

    let graph = load_server_graph(&target.conn, server.id).unwrap().unwrap();
    assert_eq!(graph.server, server);
    assert_eq!(graph.actions.len(), 1);
    assert_eq!(graph.scripts[0].contents, "Remove-Item *.log");
    assert_eq!(graph.consoles[0].password.as_deref(), Some("secret"));
    assert_eq!(graph.http_paths[0].path, "/maps");
}

#[test]
fn tool_links_only_games_present_in_target() {
    let source = Library::new();
    let seeded = seed_game(&source, "Quake III Arena");
    let tool = Tool {
        id: Uuid::new_v4(),
        name: "Q3Config".to_string(),
        description: None,
        notes: None,
        created_on: "2024-01-01T00:00:00+00:00".to_string(),
        updated_on: "2024-01-01T00:00:00+00:00".to_string(),
    };
    source.save(Entity::Tool(tool.clone()));
    source.link(Relation::ToolGames, tool.id, &[seeded.game.id]);

    let tool_package = source.package_path("tool.zip");
    export_all(&source.conn, RootKind::Tool, tool.id, &tool_package);

    let target = Library::new();
    import_all(&target, &tool_package);
    let graph = load_tool_graph(&target.conn, tool.id).unwrap().unwrap();
    assert!(graph.games.is_empty());

    let game_package = source.package_path("quake3.zip");
    export_all(&source.conn, RootKind::Game, seeded.game.id, &game_package);
    import_all(&target, &game_package);
    import_all(&target, &tool_package);
    let graph = load_tool_graph(&target.conn, tool.id).unwrap().unwrap();
    assert_eq!(graph.games, vec![seeded.game.id]);
}
