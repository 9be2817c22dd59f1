use lanpack_db::operations::*;
use lanpack_db::*;
use lanpack_model::*;
use uuid::Uuid;

fn test_game() -> Game {
    Game {
        id: Uuid::new_v4(),
        title: "Unreal Tournament".to_string(),
        sort_title: None,
        description: Some("Arena shooter".to_string()),
        notes: None,
        released_on: Some("1999-11-22".to_string()),
        singleplayer: true,
        igdb_id: Some(1043),
        game_type: GameType::MainGame,
        base_game_id: None,
        engine_id: None,
        created_on: "2024-01-01T00:00:00Z".to_string(),
        updated_on: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn lookup(name: &str) -> Lookup {
    Lookup {
        id: Uuid::new_v4(),
        name: name.to_string(),
    }
}

#[test]
fn upsert_and_get_game() {
    let conn = open_memory().unwrap();
    let game = test_game();
    upsert_game(&conn, &game).unwrap();

    let loaded = get_game(&conn, game.id).unwrap().unwrap();
    assert_eq!(loaded, game);
}

#[test]
fn upsert_game_is_idempotent() {
    let conn = open_memory().unwrap();
    let mut game = test_game();
    upsert_game(&conn, &game).unwrap();
    game.title = "Unreal Tournament GOTY".to_string();
    upsert_game(&conn, &game).unwrap();

    assert_eq!(count_rows(&conn, EntityKind::Game).unwrap(), 1);
    assert_eq!(
        get_game(&conn, game.id).unwrap().unwrap().title,
        "Unreal Tournament GOTY"
    );
}

#[test]
fn missing_row_is_none() {
    let conn = open_memory().unwrap();
    assert!(get_game(&conn, Uuid::new_v4()).unwrap().is_none());
    assert!(
        load_entity(&conn, EntityKind::Genre, Uuid::new_v4())
            .unwrap()
            .is_none()
    );
}

#[test]
fn lookup_name_match_is_case_sensitive() {
    let conn = open_memory().unwrap();
    let genre = lookup("Shooter");
    upsert_lookup(&conn, EntityKind::Genre, &genre).unwrap();

    let found = find_lookup_by_name(&conn, EntityKind::Genre, "Shooter")
        .unwrap()
        .unwrap();
    assert_eq!(found.id, genre.id);
    assert!(
        find_lookup_by_name(&conn, EntityKind::Genre, "shooter")
            .unwrap()
            .is_none()
    );
    // Same name in another lookup table is unrelated.
    assert!(
        find_lookup_by_name(&conn, EntityKind::Tag, "Shooter")
            .unwrap()
            .is_none()
    );
}

#[test]
fn save_and_load_entity_dispatch() {
    let conn = open_memory().unwrap();
    let game = test_game();
    save_entity(&conn, &Entity::Game(game.clone())).unwrap();

    let script = Script {
        id: Uuid::new_v4(),
        owner: Owner::new(RootKind::Game, game.id),
        script_type: ScriptType::BeforeStart,
        name: "Set player name".to_string(),
        description: None,
        requires_admin: false,
        contents: "echo hello".to_string(),
    };
    save_entity(&conn, &Entity::Script(script.clone())).unwrap();

    let session = PlaySession {
        id: Uuid::new_v4(),
        game_id: game.id,
        user: "alice".to_string(),
        start: Some("2024-02-01T18:00:00Z".to_string()),
        end: None,
    };
    save_entity(&conn, &Entity::PlaySession(session.clone())).unwrap();

    assert_eq!(
        load_entity(&conn, EntityKind::Script, script.id).unwrap(),
        Some(Entity::Script(script))
    );
    assert_eq!(
        load_entity(&conn, EntityKind::PlaySession, session.id).unwrap(),
        Some(Entity::PlaySession(session))
    );
}

#[test]
fn deleting_a_game_cascades_to_owned_rows() {
    let conn = open_memory().unwrap();
    let game = test_game();
    upsert_game(&conn, &game).unwrap();
    upsert_custom_field(
        &conn,
        &CustomField {
            id: Uuid::new_v4(),
            game_id: game.id,
            name: "Region".to_string(),
            value: "EU".to_string(),
        },
    )
    .unwrap();

    assert!(delete_entity(&conn, EntityKind::Game, game.id).unwrap());
    assert_eq!(count_rows(&conn, EntityKind::CustomField).unwrap(), 0);
    assert!(!delete_entity(&conn, EntityKind::Game, game.id).unwrap());
}

#[test]
fn owned_row_requires_its_game() {
    let conn = open_memory().unwrap();
    let result = upsert_key(
        &conn,
        &Key {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            value: "AAAA-BBBB".to_string(),
            allocation_method: KeyAllocationMethod::UserAccount,
            claimed_by_mac_address: None,
            claimed_by_ip_address: None,
            claimed_by_computer_name: None,
            claimed_on: None,
        },
    );
    assert!(matches!(result, Err(OperationError::Sqlite(_))));
}

#[test]
fn links_keep_attachment_order() {
    let conn = open_memory().unwrap();
    let game = test_game();
    upsert_game(&conn, &game).unwrap();
    let (a, b, c) = (lookup("Zeta"), lookup("Alpha"), lookup("Mid"));
    for tag in [&a, &b, &c] {
        upsert_lookup(&conn, EntityKind::Tag, tag).unwrap();
    }

    replace_links(&conn, Relation::GameTags, game.id, &[a.id, b.id, c.id]).unwrap();
    assert_eq!(
        linked_ids(&conn, Relation::GameTags, game.id).unwrap(),
        vec![a.id, b.id, c.id]
    );

    replace_links(&conn, Relation::GameTags, game.id, &[c.id]).unwrap();
    assert_eq!(
        linked_ids(&conn, Relation::GameTags, game.id).unwrap(),
        vec![c.id]
    );
}

#[test]
fn storage_default_is_unique_per_type() {
    let conn = open_memory().unwrap();
    let first = StorageLocation {
        id: Uuid::new_v4(),
        path: "/srv/archives".to_string(),
        location_type: StorageLocationType::Archive,
        is_default: true,
    };
    let second = StorageLocation {
        id: Uuid::new_v4(),
        path: "/mnt/archives".to_string(),
        location_type: StorageLocationType::Archive,
        is_default: true,
    };
    let media = StorageLocation {
        id: Uuid::new_v4(),
        path: "/srv/media".to_string(),
        location_type: StorageLocationType::Media,
        is_default: true,
    };
    insert_storage_location(&conn, &first).unwrap();
    insert_storage_location(&conn, &media).unwrap();
    insert_storage_location(&conn, &second).unwrap();

    let default = default_storage_location(&conn, StorageLocationType::Archive)
        .unwrap()
        .unwrap();
    assert_eq!(default.id, second.id);
    assert!(!get_storage_location(&conn, first.id).unwrap().unwrap().is_default);
    assert!(get_storage_location(&conn, media.id).unwrap().unwrap().is_default);

    let archives = list_storage_locations(&conn, Some(StorageLocationType::Archive)).unwrap();
    assert_eq!(archives.len(), 2);
    assert_eq!(list_storage_locations(&conn, None).unwrap().len(), 3);

    assert!(delete_storage_location(&conn, first.id).unwrap());
    assert!(get_storage_location(&conn, first.id).unwrap().is_none());
}
