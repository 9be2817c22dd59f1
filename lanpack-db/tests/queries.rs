use lanpack_db::operations::*;
use lanpack_db::*;
use lanpack_model::*;
use uuid::Uuid;

fn seed_game(conn: &rusqlite::Connection) -> Game {
    let engine = Lookup {
        id: Uuid::new_v4(),
        name: "Unreal Engine 1".to_string(),
    };
    upsert_lookup(conn, EntityKind::Engine, &engine).unwrap();

    let game = Game {
        id: Uuid::new_v4(),
        title: "Deus Ex".to_string(),
        sort_title: None,
        description: None,
        notes: None,
        released_on: None,
        singleplayer: true,
        igdb_id: None,
        game_type: GameType::MainGame,
        base_game_id: None,
        engine_id: Some(engine.id),
        created_on: "2024-01-01T00:00:00Z".to_string(),
        updated_on: "2024-01-01T00:00:00Z".to_string(),
    };
    upsert_game(conn, &game).unwrap();
    game
}

fn action(owner: Owner, name: &str, is_primary: bool, sort_order: i32) -> Action {
    Action {
        id: Uuid::new_v4(),
        owner,
        name: name.to_string(),
        path: "System\\DeusEx.exe".to_string(),
        arguments: None,
        working_directory: None,
        is_primary,
        sort_order,
    }
}

#[test]
fn game_graph_loads_every_collection() {
    let conn = open_memory().unwrap();
    let game = seed_game(&conn);
    let owner = Owner::new(RootKind::Game, game.id);

    upsert_action(&conn, &action(owner, "Settings", false, 1)).unwrap();
    upsert_action(&conn, &action(owner, "Play", true, 0)).unwrap();

    let genre = Lookup {
        id: Uuid::new_v4(),
        name: "RPG".to_string(),
    };
    upsert_lookup(&conn, EntityKind::Genre, &genre).unwrap();
    replace_links(&conn, Relation::GameGenres, game.id, &[genre.id]).unwrap();

    let dev = Lookup {
        id: Uuid::new_v4(),
        name: "Ion Storm".to_string(),
    };
    upsert_lookup(&conn, EntityKind::Company, &dev).unwrap();
    replace_links(&conn, Relation::GameDevelopers, game.id, &[dev.id]).unwrap();

    let graph = load_game_graph(&conn, game.id).unwrap().unwrap();
    assert_eq!(graph.game, game);
    assert_eq!(graph.engine.as_ref().unwrap().name, "Unreal Engine 1");
    assert_eq!(graph.actions.len(), 2);
    assert_eq!(graph.actions[0].name, "Play");
    assert_eq!(graph.genres, vec![genre]);
    assert_eq!(graph.developers, vec![dev]);
    assert!(graph.publishers.is_empty());
}

#[test]
fn missing_root_is_none() {
    let conn = open_memory().unwrap();
    for kind in RootKind::ALL {
        assert!(load_root_graph(&conn, kind, Uuid::new_v4()).unwrap().is_none());
    }
}

#[test]
fn owner_scoping_separates_root_kinds() {
    let conn = open_memory().unwrap();
    let id = Uuid::new_v4();
    upsert_server(
        &conn,
        &Server {
            id,
            name: "UT Server".to_string(),
            game_id: None,
            path: "ucc.exe".to_string(),
            arguments: None,
            working_directory: None,
            host: None,
            port: 7777,
            use_shell_execute: false,
            autostart: false,
            autostart_delay: 0,
            created_on: String::new(),
            updated_on: String::new(),
        },
    )
    .unwrap();
    upsert_action(&conn, &action(Owner::new(RootKind::Server, id), "Start", true, 0)).unwrap();

    let graph = load_server_graph(&conn, id).unwrap().unwrap();
    assert_eq!(graph.actions.len(), 1);
    assert!(actions_for(&conn, Owner::new(RootKind::Tool, id)).unwrap().is_empty());
}

#[test]
fn graph_records_are_stable_across_loads() {
    let conn = open_memory().unwrap();
    let game = seed_game(&conn);
    let owner = Owner::new(RootKind::Game, game.id);
    for i in 0..5 {
        upsert_action(&conn, &action(owner, &format!("Action {i}"), false, 0)).unwrap();
    }

    let first = load_root_graph(&conn, RootKind::Game, game.id).unwrap().unwrap();
    let second = load_root_graph(&conn, RootKind::Game, game.id).unwrap().unwrap();
    assert_eq!(first.records(), second.records());
}

#[test]
fn list_roots_by_kind() {
    let conn = open_memory().unwrap();
    let game = seed_game(&conn);
    upsert_tool(
        &conn,
        &Tool {
            id: Uuid::new_v4(),
            name: "UnrealEd".to_string(),
            description: None,
            notes: None,
            created_on: String::new(),
            updated_on: String::new(),
        },
    )
    .unwrap();

    let all = list_roots(&conn, None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].kind, RootKind::Game);
    assert_eq!(all[0].id, game.id);

    let tools = list_roots(&conn, Some(RootKind::Tool)).unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "UnrealEd");
}
