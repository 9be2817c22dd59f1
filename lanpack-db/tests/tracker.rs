use lanpack_db::operations::upsert_lookup;
use lanpack_db::*;
use lanpack_model::*;
use uuid::Uuid;

fn genre(name: &str) -> Entity {
    Entity::Genre(Lookup {
        id: Uuid::new_v4(),
        name: name.to_string(),
    })
}

fn game(title: &str) -> Game {
    Game {
        id: Uuid::new_v4(),
        title: title.to_string(),
        sort_title: None,
        description: None,
        notes: None,
        released_on: None,
        singleplayer: false,
        igdb_id: None,
        game_type: GameType::MainGame,
        base_game_id: None,
        engine_id: None,
        created_on: String::new(),
        updated_on: String::new(),
    }
}

#[test]
fn added_rows_are_written_on_save() {
    let conn = open_memory().unwrap();
    let mut tracker = ChangeTracker::new();
    let shooter = genre("Shooter");
    tracker.add(shooter.clone()).unwrap();

    assert_eq!(count_rows(&conn, EntityKind::Genre).unwrap(), 0);
    assert_eq!(
        tracker.state(EntityKind::Genre, shooter.id()),
        Some(EntryState::Added)
    );

    let summary = tracker.save_changes(&conn).unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(count_rows(&conn, EntityKind::Genre).unwrap(), 1);
    assert_eq!(
        tracker.state(EntityKind::Genre, shooter.id()),
        Some(EntryState::Unchanged)
    );
    assert!(!tracker.has_changes());
}

#[test]
fn identity_map_rejects_second_instance() {
    let mut tracker = ChangeTracker::new();
    let shooter = genre("Shooter");
    tracker.add(shooter.clone()).unwrap();
    let err = tracker.add(shooter).unwrap_err();
    assert!(matches!(err, OperationError::AlreadyTracked { .. }));
}

#[test]
fn load_attaches_persisted_row_once() {
    let conn = open_memory().unwrap();
    let g = game("Quake");
    save_entity(&conn, &Entity::Game(g.clone())).unwrap();

    let mut tracker = ChangeTracker::new();
    let first = tracker.load(&conn, EntityKind::Game, g.id).unwrap().unwrap();
    let second = tracker.load(&conn, EntityKind::Game, g.id).unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(tracker.len(), 1);
    assert_eq!(
        tracker.state(EntityKind::Game, g.id),
        Some(EntryState::Unchanged)
    );
}

#[test]
fn find_by_name_prefers_tracked_rows() {
    let conn = open_memory().unwrap();
    let mut tracker = ChangeTracker::new();
    let pending = genre("Shooter");
    tracker.add(pending.clone()).unwrap();

    let found = tracker
        .find_by_name(&conn, EntityKind::Genre, "Shooter")
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), pending.id());
    assert!(
        tracker
            .find_by_name(&conn, EntityKind::Genre, "SHOOTER")
            .unwrap()
            .is_none()
    );
}

#[test]
fn find_by_name_falls_back_to_database() {
    let conn = open_memory().unwrap();
    let stored = Lookup {
        id: Uuid::new_v4(),
        name: "Strategy".to_string(),
    };
    upsert_lookup(&conn, EntityKind::Genre, &stored).unwrap();

    let mut tracker = ChangeTracker::new();
    let found = tracker
        .find_by_name(&conn, EntityKind::Genre, "Strategy")
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), stored.id);
    assert!(tracker.contains(EntityKind::Genre, stored.id));
}

#[test]
fn renamed_row_no_longer_matches_its_stored_name() {
    let conn = open_memory().unwrap();
    let stored = Lookup {
        id: Uuid::new_v4(),
        name: "Strategy".to_string(),
    };
    upsert_lookup(&conn, EntityKind::Genre, &stored).unwrap();

    let mut tracker = ChangeTracker::new();
    tracker.load(&conn, EntityKind::Genre, stored.id).unwrap();
    tracker
        .update(Entity::Genre(Lookup {
            id: stored.id,
            name: "Tactics".to_string(),
        }))
        .unwrap();

    assert!(
        tracker
            .find_by_name(&conn, EntityKind::Genre, "Strategy")
            .unwrap()
            .is_none()
    );
    let found = tracker
        .find_by_name(&conn, EntityKind::Genre, "Tactics")
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), stored.id);
}

#[test]
fn copy_values_reports_changed_properties() {
    let conn = open_memory().unwrap();
    let g = game("Quake");
    save_entity(&conn, &Entity::Game(g.clone())).unwrap();

    let mut tracker = ChangeTracker::new();
    tracker.load(&conn, EntityKind::Game, g.id).unwrap();

    let mut incoming = g.clone();
    incoming.id = Uuid::new_v4();
    incoming.title = "Quake II".to_string();
    let changed = tracker
        .copy_values(EntityKind::Game, g.id, &Entity::Game(incoming))
        .unwrap();
    assert!(changed);
    assert_eq!(
        tracker.state(EntityKind::Game, g.id),
        Some(EntryState::Modified)
    );
    assert_eq!(tracker.changed_properties(EntityKind::Game, g.id), vec!["title"]);

    let tracked = tracker.find(EntityKind::Game, g.id).unwrap();
    assert_eq!(tracked.id(), g.id);

    let summary = tracker.save_changes(&conn).unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(
        operations::get_game(&conn, g.id).unwrap().unwrap().title,
        "Quake II"
    );
}

#[test]
fn copying_identical_values_is_not_a_change() {
    let conn = open_memory().unwrap();
    let g = game("Quake");
    save_entity(&conn, &Entity::Game(g.clone())).unwrap();

    let mut tracker = ChangeTracker::new();
    tracker.load(&conn, EntityKind::Game, g.id).unwrap();
    let changed = tracker
        .copy_values(EntityKind::Game, g.id, &Entity::Game(g.clone()))
        .unwrap();
    assert!(!changed);
    assert!(!tracker.has_changes());
}

#[test]
fn copy_values_rejects_kind_mismatch() {
    let mut tracker = ChangeTracker::new();
    let g = game("Quake");
    tracker.add(Entity::Game(g.clone())).unwrap();
    let err = tracker
        .copy_values(EntityKind::Game, g.id, &genre("Shooter"))
        .unwrap_err();
    assert!(matches!(err, OperationError::KindMismatch { .. }));
}

#[test]
fn restore_discards_changes_since_checkpoint() {
    let conn = open_memory().unwrap();
    let mut tracker = ChangeTracker::new();
    let kept = genre("Shooter");
    tracker.add(kept.clone()).unwrap();

    let checkpoint = tracker.checkpoint();
    let dropped = genre("Puzzle");
    tracker.add(dropped.clone()).unwrap();
    tracker.set_links(Relation::GameGenres, Uuid::new_v4(), vec![dropped.id()]);
    tracker.restore(checkpoint);

    assert!(tracker.contains(EntityKind::Genre, kept.id()));
    assert!(!tracker.contains(EntityKind::Genre, dropped.id()));

    let summary = tracker.save_changes(&conn).unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.links_replaced, 0);
}

#[test]
fn links_and_deletes_are_flushed_in_order() {
    let conn = open_memory().unwrap();
    let g = game("Quake");
    let mut tracker = ChangeTracker::new();
    let shooter = genre("Shooter");

    // Owned rows and links are staged before their parents exist in the
    // database; flush order must still satisfy every foreign key.
    tracker.set_links(Relation::GameGenres, g.id, vec![shooter.id()]);
    tracker
        .add(Entity::CustomField(CustomField {
            id: Uuid::new_v4(),
            game_id: g.id,
            name: "Mod".to_string(),
            value: "Classic".to_string(),
        }))
        .unwrap();
    tracker.add(Entity::Game(g.clone())).unwrap();
    tracker.add(shooter.clone()).unwrap();
    tracker.save_changes(&conn).unwrap();

    assert_eq!(
        linked_ids(&conn, Relation::GameGenres, g.id).unwrap(),
        vec![shooter.id()]
    );

    tracker.remove(EntityKind::Game, g.id).unwrap();
    assert_eq!(tracker.state(EntityKind::Game, g.id), Some(EntryState::Deleted));
    let summary = tracker.save_changes(&conn).unwrap();
    assert_eq!(summary.deleted, 1);
    assert_eq!(count_rows(&conn, EntityKind::Game).unwrap(), 0);
    assert_eq!(count_rows(&conn, EntityKind::CustomField).unwrap(), 0);
    assert!(tracker.state(EntityKind::Game, g.id).is_none());
}

#[test]
fn removing_an_added_row_forgets_it() {
    let conn = open_memory().unwrap();
    let mut tracker = ChangeTracker::new();
    let shooter = genre("Shooter");
    tracker.add(shooter.clone()).unwrap();
    tracker.remove(EntityKind::Genre, shooter.id()).unwrap();

    assert!(tracker.is_empty());
    assert!(tracker.save_changes(&conn).unwrap().is_empty());
}
