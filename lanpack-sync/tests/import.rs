mod common;

use std::fs;
use std::path::Path;

use common::*;
use lanpack_db::*;
use lanpack_model::*;
use lanpack_sync::*;
use uuid::Uuid;

fn exported_game(source: &Library) -> (SeededGame, std::path::PathBuf) {
    let seeded = seed_game(source, "Quake III Arena");
    let package = source.package_path("quake3.zip");
    export_all(&source.conn, RootKind::Game, seeded.game.id, &package);
    (seeded, package)
}

#[test]
fn lookups_are_deduplicated_by_name() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);

    let target = Library::new();
    let local_shooter = lookup("Shooter");
    assert_ne!(local_shooter.id, seeded.genre.id);
    target.save(Entity::Genre(local_shooter.clone()));

    let summary = import_all(&target, &package);
    assert_eq!(summary.failed, 0);

    assert_eq!(target.count(EntityKind::Genre), 1);
    let graph = target.game_graph(seeded.game.id);
    assert_eq!(graph.genres, vec![local_shooter]);
}

#[test]
fn lookup_names_match_case_sensitively() {
    let source = Library::new();
    let (_, package) = exported_game(&source);

    let target = Library::new();
    target.save(Entity::Genre(lookup("shooter")));
    import_all(&target, &package);

    assert_eq!(target.count(EntityKind::Genre), 2);
}

#[test]
fn developer_and_publisher_share_one_company_row() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);

    let target = Library::new();
    import_all(&target, &package);

    assert_eq!(target.count(EntityKind::Company), 1);
    let graph = target.game_graph(seeded.game.id);
    assert_eq!(graph.developers, vec![seeded.company.clone()]);
    assert_eq!(graph.publishers, vec![seeded.company]);
}

#[test]
fn corrupt_payload_fails_only_its_record() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);
    let corrupt = source.package_path("corrupt.zip");
    let entry = format!("Scripts/{}", seeded.script.id);
    tamper(&package, &corrupt, &entry, b"Remove-Item -Recurse C:/");

    let target = Library::new();
    let summary = import_all(&target, &corrupt);

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors[0].item.kind, RecordKind::Script);
    assert_eq!(summary.errors[0].item.id, seeded.script.id);
    assert!(summary.errors[0].message.contains("corrupt"));

    let graph = target.game_graph(seeded.game.id);
    assert!(graph.scripts.is_empty());
    assert_eq!(graph.actions.len(), 1);
    assert_eq!(graph.archives.len(), 1);
    assert_eq!(target.count(EntityKind::Script), 0);
}

#[test]
fn corrupt_file_payload_leaves_nothing_on_disk() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);
    let corrupt = source.package_path("corrupt.zip");
    tamper(&package, &corrupt, "Archives/quake3-1.32.zip", b"truncated");

    let target = Library::new();
    let summary = import_all(&target, &corrupt);

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors[0].item.id, seeded.archive.id);
    let entries: Vec<_> = fs::read_dir(&target.archives.path).unwrap().collect();
    assert!(entries.is_empty());
    assert_eq!(target.count(EntityKind::Archive), 0);
}

#[test]
fn missing_payload_entry_is_reported() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);

    let mut manifest = read_manifest(&manifest_text(&package)).unwrap();
    if let Some(game) = manifest.as_game_mut() {
        game.media[0].file_id = Uuid::new_v4();
    }
    let edited = source.package_path("edited.zip");
    rewrite_manifest(&package, &edited, &manifest);

    let target = Library::new();
    let summary = import_all(&target, &edited);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors[0].item.id, seeded.media.id);
    assert!(summary.errors[0].message.contains("missing"));
}

#[test]
fn selection_limits_imported_records() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);

    let target = Library::new();
    let mut ctx = ImportContext::open(&target.conn, &package).unwrap();
    ctx.initialize().unwrap();
    let queued = ctx
        .prepare_queue(&Selection::only([seeded.script.id]), target.archives.id)
        .unwrap();
    assert_eq!(queued, 1);
    let summary = ctx.import_queue().unwrap();
    ctx.save_changes().unwrap();

    assert_eq!(summary.added, 1);
    let graph = target.game_graph(seeded.game.id);
    assert_eq!(graph.scripts.len(), 1);
    assert!(graph.actions.is_empty());
    assert!(graph.genres.is_empty());
    assert!(fs::read_dir(&target.archives.path).unwrap().next().is_none());
}

#[test]
fn additive_import_keeps_unlisted_records() {
    let lib = Library::new();
    let (seeded, package) = exported_game(&lib);
    let owner = Owner::new(RootKind::Game, seeded.game.id);
    lib.save(Entity::Action(action(owner, "Local only")));
    let extra_genre = lookup("Roguelike");
    lib.save(Entity::Genre(extra_genre.clone()));
    lib.link(Relation::GameGenres, seeded.game.id, &[seeded.genre.id, extra_genre.id]);

    import_all(&lib, &package);

    let graph = lib.game_graph(seeded.game.id);
    assert_eq!(graph.actions.len(), 2);
    assert_eq!(graph.genres.len(), 2);
}

#[test]
fn prune_removes_records_missing_from_package() {
    let lib = Library::new();
    let (seeded, package) = exported_game(&lib);
    let owner = Owner::new(RootKind::Game, seeded.game.id);
    lib.save(Entity::Action(action(owner, "Local only")));
    let extra_genre = lookup("Roguelike");
    lib.save(Entity::Genre(extra_genre.clone()));
    lib.link(Relation::GameGenres, seeded.game.id, &[seeded.genre.id, extra_genre.id]);

    import_with(&lib, &package, ImportOptions { prune: true });

    let graph = lib.game_graph(seeded.game.id);
    assert_eq!(graph.actions.len(), 1);
    assert_eq!(graph.genres, vec![seeded.genre.clone()]);
    // Unlinked lookups stay in the library.
    assert_eq!(lib.count(EntityKind::Genre), 2);
}

#[test]
fn prune_keeps_deselected_records_the_package_lists() {
    let lib = Library::new();
    let (seeded, package) = exported_game(&lib);

    let mut ctx = ImportContext::open(&lib.conn, &package)
        .unwrap()
        .with_options(ImportOptions { prune: true });
    let descriptors = ctx.initialize().unwrap().to_vec();
    let keep: Vec<Uuid> = descriptors
        .iter()
        .filter(|d| d.kind != RecordKind::Script)
        .map(|d| d.id)
        .collect();
    ctx.prepare_queue(&Selection::only(keep), lib.archives.id)
        .unwrap();
    ctx.import_queue().unwrap();
    ctx.save_changes().unwrap();

    let graph = lib.game_graph(seeded.game.id);
    assert_eq!(graph.scripts, vec![seeded.script]);
}

#[test]
fn manifest_without_ids_gets_fresh_ones() {
    let source = Library::new();
    let (_, package) = exported_game(&source);

    let mut manifest = read_manifest(&manifest_text(&package)).unwrap();
    if let Some(game) = manifest.as_game_mut() {
        game.custom_fields[0].id = Uuid::nil();
    }
    let edited = source.package_path("edited.zip");
    rewrite_manifest(&package, &edited, &manifest);

    let target = Library::new();
    let mut ctx = ImportContext::open(&target.conn, &edited).unwrap();
    let descriptors = ctx.initialize().unwrap();
    assert!(descriptors.iter().all(|d| !d.id.is_nil()));
    ctx.prepare_queue(&Selection::All, target.archives.id).unwrap();
    let summary = ctx.import_queue().unwrap();
    ctx.save_changes().unwrap();
    assert_eq!(summary.failed, 0);
    assert_eq!(target.count(EntityKind::CustomField), 1);
}

#[test]
fn nothing_is_written_before_save_changes() {
    let source = Library::new();
    let (_, package) = exported_game(&source);

    let target = Library::new();
    let mut ctx = ImportContext::open(&target.conn, &package).unwrap();
    ctx.initialize().unwrap();
    ctx.prepare_queue(&Selection::All, target.archives.id).unwrap();
    ctx.import_queue().unwrap();
    assert!(ctx.tracker().has_changes());
    assert_eq!(target.count(EntityKind::Game), 0);
    assert_eq!(target.count(EntityKind::Genre), 0);

    ctx.save_changes().unwrap();
    assert_eq!(target.count(EntityKind::Game), 1);
}

#[test]
fn unknown_storage_location_is_rejected() {
    let source = Library::new();
    let (_, package) = exported_game(&source);

    let target = Library::new();
    let mut ctx = ImportContext::open(&target.conn, &package).unwrap();
    ctx.initialize().unwrap();
    let err = ctx
        .prepare_queue(&Selection::All, Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, SyncError::StorageUnavailable(_)));
    assert_eq!(ctx.phase(), ImportPhase::ManifestRead);
}

#[test]
fn storage_location_without_directory_is_rejected() {
    let source = Library::new();
    let (_, package) = exported_game(&source);

    let target = Library::new();
    let gone = StorageLocation {
        id: Uuid::new_v4(),
        path: target.dir.path().join("unmounted").to_string_lossy().into_owned(),
        location_type: StorageLocationType::Archive,
        is_default: false,
    };
    insert_storage_location(&target.conn, &gone).unwrap();

    let mut ctx = ImportContext::open(&target.conn, &package).unwrap();
    ctx.initialize().unwrap();
    let err = ctx.prepare_queue(&Selection::All, gone.id).unwrap_err();
    assert!(matches!(err, SyncError::StorageUnavailable(_)));
}

#[test]
fn phases_must_run_in_order() {
    let source = Library::new();
    let (_, package) = exported_game(&source);
    let target = Library::new();

    let mut ctx = ImportContext::open(&target.conn, &package).unwrap();
    assert!(matches!(
        ctx.import_queue(),
        Err(SyncError::OutOfOrder { .. })
    ));
    assert!(matches!(
        ctx.save_changes(),
        Err(SyncError::OutOfOrder { .. })
    ));
    ctx.initialize().unwrap();
    assert!(matches!(
        ctx.initialize(),
        Err(SyncError::OutOfOrder { .. })
    ));
}

#[test]
fn package_without_manifest_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.zip");
    let mut writer = zip::ZipWriter::new(fs::File::create(&path).unwrap());
    writer
        .start_file("readme.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.finish().unwrap();

    let lib = Library::new();
    let mut ctx = ImportContext::open(&lib.conn, Path::new(&path)).unwrap();
    assert!(matches!(
        ctx.initialize(),
        Err(SyncError::UnknownManifest(_))
    ));
}

#[test]
fn observer_sees_every_item() {
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        added: RefCell<usize>,
        processed: RefCell<Vec<(usize, usize)>>,
    }

    impl SyncObserver for Recorder {
        fn on_record_added(&self, _item: &QueueItem) {
            *self.added.borrow_mut() += 1;
        }
        fn on_record_processed(&self, _item: &QueueItem, current: usize, total: usize) {
            self.processed.borrow_mut().push((current, total));
        }
        fn on_record_error(&self, _item: &QueueItem, _message: &str) {}
    }

    let source = Library::new();
    let (_, package) = exported_game(&source);
    let target = Library::new();
    let recorder = Recorder::default();

    let mut ctx = ImportContext::open(&target.conn, &package)
        .unwrap()
        .with_observer(&recorder);
    ctx.initialize().unwrap();
    let queued = ctx.prepare_queue(&Selection::All, target.archives.id).unwrap();
    ctx.import_queue().unwrap();

    assert_eq!(*recorder.added.borrow(), queued);
    let processed = recorder.processed.borrow();
    assert_eq!(processed.len(), queued);
    assert_eq!(processed.last(), Some(&(queued, queued)));
}

#[test]
fn renamed_lookup_frees_its_stored_name() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);

    let mut manifest = read_manifest(&manifest_text(&package)).unwrap();
    if let Some(game) = manifest.as_game_mut() {
        game.genres = vec![
            lanpack_model::manifest::Lookup {
                id: seeded.genre.id,
                name: "RPG".to_string(),
            },
            lanpack_model::manifest::Lookup {
                id: Uuid::new_v4(),
                name: "Shooter".to_string(),
            },
        ];
    }
    let edited = source.package_path("edited.zip");
    rewrite_manifest(&package, &edited, &manifest);

    let target = Library::new();
    target.save(Entity::Genre(seeded.genre.clone()));
    let summary = import_all(&target, &edited);
    assert_eq!(summary.failed, 0);

    assert_eq!(target.count(EntityKind::Genre), 2);
    let graph = target.game_graph(seeded.game.id);
    let mut names: Vec<_> = graph.genres.iter().map(|g| g.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["RPG", "Shooter"]);
    let renamed = graph.genres.iter().find(|g| g.id == seeded.genre.id).unwrap();
    assert_eq!(renamed.name, "RPG");
}

#[test]
fn reimported_redistributable_is_updated_in_place() {
    let lib = Library::new();
    let redist = Redistributable {
        id: Uuid::new_v4(),
        name: "DirectX 9.0c".to_string(),
        description: Some("June 2010 runtime".to_string()),
        notes: None,
        created_on: "2024-01-01T00:00:00+00:00".to_string(),
        updated_on: "2024-01-01T00:00:00+00:00".to_string(),
    };
    lib.save(Entity::Redistributable(redist.clone()));
    let package = lib.package_path("directx.zip");
    export_all(&lib.conn, RootKind::Redistributable, redist.id, &package);

    let mut renamed = redist.clone();
    renamed.name = "DirectX (old)".to_string();
    lib.save(Entity::Redistributable(renamed));

    let summary = import_all(&lib, &package);
    assert!(summary.root_existed);
    assert_eq!(summary.failed, 0);
    assert_eq!(lib.count(EntityKind::Redistributable), 1);
    let stored = load_entity(&lib.conn, EntityKind::Redistributable, redist.id)
        .unwrap()
        .unwrap();
    let Entity::Redistributable(stored) = stored else {
        panic!("expected a redistributable, got {stored:?}");
    };
    assert_eq!(stored.name, "DirectX 9.0c");
}

#[test]
fn payload_records_without_ids_read_the_nil_entry() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);

    let mut manifest = read_manifest(&manifest_text(&package)).unwrap();
    if let Some(game) = manifest.as_game_mut() {
        game.scripts[0].id = Uuid::nil();
        game.saves[0].id = Uuid::nil();
    }
    let nil = Uuid::nil().to_string();
    let edited = source.package_path("edited.zip");
    rewrite_manifest(&package, &edited, &manifest);
    let scripts_moved = source.package_path("scripts-moved.zip");
    rename_entry(
        &edited,
        &scripts_moved,
        &payload_entry(RecordKind::Script, &seeded.script.id.to_string()).unwrap(),
        &payload_entry(RecordKind::Script, &nil).unwrap(),
    );
    let unnamed = source.package_path("unnamed.zip");
    rename_entry(
        &scripts_moved,
        &unnamed,
        &payload_entry(RecordKind::Save, &seeded.save.id.to_string()).unwrap(),
        &payload_entry(RecordKind::Save, &nil).unwrap(),
    );

    let target = Library::new();
    let summary = import_all(&target, &unnamed);
    assert_eq!(summary.failed, 0, "{:?}", summary.errors);

    let graph = target.game_graph(seeded.game.id);
    assert_eq!(graph.scripts.len(), 1);
    assert!(!graph.scripts[0].id.is_nil());
    assert_ne!(graph.scripts[0].id, seeded.script.id);
    assert_eq!(graph.scripts[0].contents, INSTALL_SCRIPT);

    assert_eq!(graph.saves.len(), 1);
    let save_id = graph.saves[0].id;
    assert!(!save_id.is_nil());
    let on_disk = Path::new(&target.saves.path).join(save_id.to_string());
    assert_eq!(fs::read(on_disk).unwrap(), SAVE_BYTES);
}

#[test]
fn discarded_payloads_leave_existing_files_alone() {
    let source = Library::new();
    let (seeded, package) = exported_game(&source);

    let target = Library::new();
    let preexisting = Path::new(&target.archives.path).join(&seeded.archive.object_key);
    fs::write(&preexisting, ARCHIVE_BYTES).unwrap();

    let manifest = read_manifest(&manifest_text(&package)).unwrap();
    let recorded = manifest.as_game().unwrap();
    let save_sha = recorded.saves[0].sha256.clone();
    let archive_sha = recorded.archives[0].sha256.clone();

    let mut reader = PackageReader::open(&package).unwrap();
    let destinations = Destinations {
        archives: target.archives.clone(),
        media: target.media.clone(),
        saves: target.saves.clone(),
    };
    let mut tracker = ChangeTracker::new();
    let unnamed = std::collections::HashSet::new();
    let mut session = lanpack_sync::converter::ImportSession {
        conn: &target.conn,
        tracker: &mut tracker,
        package: &mut reader,
        destinations: &destinations,
        owner: Owner::new(RootKind::Game, seeded.game.id),
        unnamed: &unnamed,
        extracted: Vec::new(),
    };

    let save_name = seeded.save.id.to_string();
    let (size, location) = session
        .extract_payload(
            StorageLocationType::Save,
            &payload_entry(RecordKind::Save, &save_name).unwrap(),
            &save_sha,
            &save_name,
        )
        .unwrap();
    assert_eq!(size, SAVE_BYTES.len() as u64);
    assert_eq!(location, target.saves.id);
    let (_, location) = session
        .extract_payload(
            StorageLocationType::Archive,
            &payload_entry(RecordKind::Archive, &seeded.archive.object_key).unwrap(),
            &archive_sha,
            &seeded.archive.object_key,
        )
        .unwrap();
    assert_eq!(location, target.archives.id);

    let extracted_save = Path::new(&target.saves.path).join(&save_name);
    assert!(extracted_save.exists());
    assert_eq!(session.extracted, vec![extracted_save.clone()]);

    session.discard_extracted();
    assert!(!extracted_save.exists());
    assert!(preexisting.exists());
    assert!(session.extracted.is_empty());
}
