mod common;

use std::fs;
use std::io::Cursor;
use std::path::Path;

use common::*;
use lanpack_model::*;
use lanpack_sync::*;
use uuid::Uuid;

#[test]
fn initialize_describes_records_in_manifest_order() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");

    let mut ctx = ExportContext::new(&lib.conn);
    let descriptors = ctx.initialize(RootKind::Game, seeded.game.id).unwrap();
    let kinds: Vec<RecordKind> = descriptors.iter().map(|d| d.kind).collect();

    let order = RootKind::Game.record_kinds();
    let positions: Vec<usize> = kinds
        .iter()
        .map(|k| order.iter().position(|o| o == k).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));

    let archive = descriptors
        .iter()
        .find(|d| d.kind == RecordKind::Archive)
        .unwrap();
    assert_eq!(archive.id, seeded.archive.id);
    assert_eq!(archive.size, Some(ARCHIVE_BYTES.len() as u64));
}

#[test]
fn unknown_root_is_not_found() {
    let lib = Library::new();
    let mut ctx = ExportContext::new(&lib.conn);
    let err = ctx.initialize(RootKind::Tool, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, SyncError::RecordNotFound { kind: "tool", .. }));
    assert_eq!(ctx.phase(), ExportPhase::Uninitialized);
}

#[test]
fn package_holds_manifest_and_payloads() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");
    let package = lib.package_path("quake3.zip");
    export_all(&lib.conn, RootKind::Game, seeded.game.id, &package);

    let mut reader = PackageReader::open(&package).unwrap();
    let names = reader.entry_names();
    assert!(names.contains(&MANIFEST_ENTRY.to_string()));
    assert!(names.contains(&"Archives/quake3-1.32.zip".to_string()));
    assert!(names.contains(&format!("Media/{}", seeded.media.file_id)));
    assert!(names.contains(&format!("Saves/{}", seeded.save.id)));
    assert!(names.contains(&format!("Scripts/{}", seeded.script.id)));

    let manifest = reader.read_manifest().unwrap();
    assert_eq!(manifest.kind(), RootKind::Game);
    assert_eq!(manifest.name(), "Quake III Arena");
    assert_eq!(manifest.manifest_version(), MANIFEST_VERSION);
    let game = manifest.as_game().unwrap();
    assert_eq!(game.engine.as_ref().map(|e| e.name.as_str()), Some("id Tech 3"));
    assert_eq!(game.archives[0].sha256.len(), 64);
    assert_eq!(game.scripts[0].sha256.len(), 64);
}

#[test]
fn script_bodies_stay_out_of_the_manifest() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");
    let package = lib.package_path("quake3.zip");
    export_all(&lib.conn, RootKind::Game, seeded.game.id, &package);

    let text = manifest_text(&package);
    assert!(!text.contains("Copy-Item"));

    let mut reader = PackageReader::open(&package).unwrap();
    let manifest = reader.read_manifest().unwrap();
    let sha = &manifest.scripts()[0].sha256;
    let entry = format!("Scripts/{}", seeded.script.id);
    assert_eq!(reader.read_text(&entry, sha).unwrap(), INSTALL_SCRIPT);
}

#[test]
fn missing_payload_file_fails_only_its_record() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");
    fs::remove_file(Path::new(&lib.archives.path).join("quake3-1.32.zip")).unwrap();

    let mut ctx = ExportContext::new(&lib.conn);
    ctx.initialize(RootKind::Game, seeded.game.id).unwrap();
    let queued = ctx.prepare_queue(&Selection::All).unwrap();
    let mut out = Cursor::new(Vec::new());
    let summary = ctx.export_queue(&mut out).unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.exported, queued - 1);
    assert_eq!(summary.errors[0].item.kind, RecordKind::Archive);
    assert!(ctx.queue().error(RecordKind::Archive, seeded.archive.id).is_some());

    let package = lib.package_path("partial.zip");
    fs::write(&package, out.into_inner()).unwrap();
    let mut reader = PackageReader::open(&package).unwrap();
    let manifest = reader.read_manifest().unwrap();
    assert!(manifest.archives().is_empty());
    assert!(!reader.entry_names().iter().any(|n| n.starts_with("Archives/")));
}

#[test]
fn selection_exports_only_chosen_records() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");

    let mut ctx = ExportContext::new(&lib.conn);
    ctx.initialize(RootKind::Game, seeded.game.id).unwrap();
    // Reselecting replaces the earlier queue.
    ctx.prepare_queue(&Selection::All).unwrap();
    let queued = ctx
        .prepare_queue(&Selection::only([seeded.genre.id, seeded.script.id]))
        .unwrap();
    assert_eq!(queued, 2);

    let mut out = Cursor::new(Vec::new());
    let summary = ctx.export_queue(&mut out).unwrap();
    assert_eq!(summary.exported, 2);

    let package = lib.package_path("partial.zip");
    fs::write(&package, out.into_inner()).unwrap();
    let manifest = PackageReader::open(&package).unwrap().read_manifest().unwrap();
    let game = manifest.as_game().unwrap();
    assert_eq!(game.genres.len(), 1);
    assert_eq!(game.scripts.len(), 1);
    assert!(game.engine.is_none());
    assert!(game.actions.is_empty());
}

#[test]
fn export_phases_must_run_in_order() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");

    let mut ctx = ExportContext::new(&lib.conn);
    assert!(matches!(
        ctx.prepare_queue(&Selection::All),
        Err(SyncError::OutOfOrder { .. })
    ));
    assert!(matches!(
        ctx.export_queue(Cursor::new(Vec::new())),
        Err(SyncError::OutOfOrder { .. })
    ));

    ctx.initialize(RootKind::Game, seeded.game.id).unwrap();
    ctx.prepare_queue(&Selection::All).unwrap();
    ctx.export_queue(Cursor::new(Vec::new())).unwrap();
    assert_eq!(ctx.phase(), ExportPhase::Done);
    assert!(matches!(
        ctx.export_queue(Cursor::new(Vec::new())),
        Err(SyncError::OutOfOrder { .. })
    ));
}

#[test]
fn redistributable_exports_actions_archives_and_scripts() {
    let lib = Library::new();
    let redist = Redistributable {
        id: Uuid::new_v4(),
        name: "DirectX 9.0c".to_string(),
        description: None,
        notes: None,
        created_on: "2024-01-01T00:00:00+00:00".to_string(),
        updated_on: "2024-01-01T00:00:00+00:00".to_string(),
    };
    let owner = Owner::new(RootKind::Redistributable, redist.id);
    lib.save(Entity::Redistributable(redist.clone()));
    lib.save(Entity::Action(action(owner, "Install")));
    lib.save(Entity::Archive(archive(owner, &lib.archives, "dxsetup.zip")));
    lib.save(Entity::Script(script(owner, "Silent", "dxsetup.exe /silent")));

    let package = lib.package_path("dx.zip");
    let summary = export_all(&lib.conn, RootKind::Redistributable, redist.id, &package);
    assert_eq!(summary.exported, 3);
    assert_eq!(summary.name, "DirectX 9.0c");

    let manifest = PackageReader::open(&package).unwrap().read_manifest().unwrap();
    assert_eq!(manifest.kind(), RootKind::Redistributable);
    assert_eq!(manifest.actions().len(), 1);
    assert_eq!(manifest.archives().len(), 1);
    assert_eq!(manifest.scripts().len(), 1);
}

#[test]
fn row_deleted_after_queueing_fails_only_its_record() {
    let lib = Library::new();
    let seeded = seed_game(&lib, "Quake III Arena");
    let action_id = lib.game_graph(seeded.game.id).actions[0].id;

    let mut ctx = ExportContext::new(&lib.conn);
    let total = ctx.initialize(RootKind::Game, seeded.game.id).unwrap().len();
    ctx.prepare_queue(&Selection::All).unwrap();
    assert!(lanpack_db::delete_entity(&lib.conn, EntityKind::Action, action_id).unwrap());

    let package = lib.package_path("quake3.zip");
    let summary = ctx
        .export_queue(fs::File::create(&package).unwrap())
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.exported, total - 1);
    assert_eq!(summary.errors[0].item.kind, RecordKind::Action);
    assert_eq!(summary.errors[0].item.id, action_id);
    assert!(summary.errors[0].message.contains("not found"));
    assert!(ctx.queue().error(RecordKind::Action, action_id).is_some());

    let mut reader = PackageReader::open(&package).unwrap();
    assert!(reader.entry_names().contains(&"Archives/quake3-1.32.zip".to_string()));
    let manifest = reader.read_manifest().unwrap();
    let game = manifest.as_game().unwrap();
    assert!(game.actions.is_empty());
    assert_eq!(game.archives.len(), 1);
    assert_eq!(game.scripts.len(), 1);
    assert_eq!(game.genres.len(), 1);
}
