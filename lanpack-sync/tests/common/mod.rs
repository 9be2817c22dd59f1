#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use lanpack_db::*;
use lanpack_model::*;
use lanpack_sync::*;
use rusqlite::Connection;
use tempfile::TempDir;
use uuid::Uuid;

pub const ARCHIVE_BYTES: &[u8] = b"PK fake quake3 installer bytes";
pub const COVER_BYTES: &[u8] = b"\x89PNG cover art";
pub const SAVE_BYTES: &[u8] = b"q3 save slot 1";
pub const INSTALL_SCRIPT: &str = "Copy-Item baseq3 $InstallDirectory\n";

/// A library database with one directory per payload type, each registered
/// as the default storage location of its type.
pub struct Library {
    pub conn: Connection,
    pub dir: TempDir,
    pub archives: StorageLocation,
    pub media: StorageLocation,
    pub saves: StorageLocation,
}

impl Library {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_memory().unwrap();
        let location = |sub: &str, location_type: StorageLocationType| {
            let path = dir.path().join(sub);
            fs::create_dir_all(&path).unwrap();
            let location = StorageLocation {
                id: Uuid::new_v4(),
                path: path.to_string_lossy().into_owned(),
                location_type,
                is_default: true,
            };
            insert_storage_location(&conn, &location).unwrap();
            location
        };
        let archives = location("archives", StorageLocationType::Archive);
        let media = location("media", StorageLocationType::Media);
        let saves = location("saves", StorageLocationType::Save);
        Self {
            conn,
            dir,
            archives,
            media,
            saves,
        }
    }

    pub fn package_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn save(&self, entity: Entity) {
        save_entity(&self.conn, &entity).unwrap();
    }

    pub fn link(&self, relation: Relation, owner: Uuid, targets: &[Uuid]) {
        replace_links(&self.conn, relation, owner, targets).unwrap();
    }

    pub fn count(&self, kind: EntityKind) -> i64 {
        count_rows(&self.conn, kind).unwrap()
    }

    pub fn game_graph(&self, id: Uuid) -> GameGraph {
        load_game_graph(&self.conn, id).unwrap().unwrap()
    }
}

// ── Rows ────────────────────────────────────────────────────────────────────

pub fn lookup(name: &str) -> Lookup {
    Lookup {
        id: Uuid::new_v4(),
        name: name.to_string(),
    }
}

pub fn game(title: &str) -> Game {
    Game {
        id: Uuid::new_v4(),
        title: title.to_string(),
        sort_title: None,
        description: Some("Arena shooter".to_string()),
        notes: None,
        released_on: Some("1999-12-02".to_string()),
        singleplayer: true,
        igdb_id: Some(355),
        game_type: GameType::MainGame,
        base_game_id: None,
        engine_id: None,
        created_on: "2024-01-01T00:00:00+00:00".to_string(),
        updated_on: "2024-01-01T00:00:00+00:00".to_string(),
    }
}

pub fn action(owner: Owner, name: &str) -> Action {
    Action {
        id: Uuid::new_v4(),
        owner,
        name: name.to_string(),
        path: "quake3.exe".to_string(),
        arguments: Some("+set fs_game baseq3".to_string()),
        working_directory: None,
        is_primary: true,
        sort_order: 0,
    }
}

pub fn script(owner: Owner, name: &str, contents: &str) -> Script {
    Script {
        id: Uuid::new_v4(),
        owner,
        script_type: ScriptType::Install,
        name: name.to_string(),
        description: None,
        requires_admin: false,
        contents: contents.to_string(),
    }
}

/// An archive row plus its payload file in `location`.
pub fn archive(owner: Owner, location: &StorageLocation, object_key: &str) -> Archive {
    fs::write(Path::new(&location.path).join(object_key), ARCHIVE_BYTES).unwrap();
    Archive {
        id: Uuid::new_v4(),
        owner,
        version: "1.32".to_string(),
        changelog: Some("Point release".to_string()),
        object_key: object_key.to_string(),
        compressed_size: ARCHIVE_BYTES.len() as i64,
        uncompressed_size: 4096,
        storage_location_id: Some(location.id),
        created_on: "2024-01-02T00:00:00+00:00".to_string(),
    }
}

/// Handles to everything [`seed_game`] stored.
pub struct SeededGame {
    pub game: Game,
    pub engine: Lookup,
    pub genre: Lookup,
    pub company: Lookup,
    pub script: Script,
    pub archive: Archive,
    pub media: Media,
    pub save: Save,
}

/// A game with one record of every kind, payload files included.
pub fn seed_game(lib: &Library, title: &str) -> SeededGame {
    let engine = lookup("id Tech 3");
    let genre = lookup("Shooter");
    let company = lookup("id Software");
    let collection = lookup("Classics");
    let platform = lookup("Windows");
    let tag = lookup("Arena");

    let mut g = game(title);
    g.engine_id = Some(engine.id);
    let owner = Owner::new(RootKind::Game, g.id);

    lib.save(Entity::Engine(engine.clone()));
    lib.save(Entity::Game(g.clone()));
    lib.save(Entity::Genre(genre.clone()));
    lib.save(Entity::Company(company.clone()));
    lib.save(Entity::Collection(collection.clone()));
    lib.save(Entity::Platform(platform.clone()));
    lib.save(Entity::Tag(tag.clone()));
    lib.link(Relation::GameGenres, g.id, &[genre.id]);
    lib.link(Relation::GameDevelopers, g.id, &[company.id]);
    lib.link(Relation::GamePublishers, g.id, &[company.id]);
    lib.link(Relation::GameCollections, g.id, &[collection.id]);
    lib.link(Relation::GamePlatforms, g.id, &[platform.id]);
    lib.link(Relation::GameTags, g.id, &[tag.id]);

    lib.save(Entity::Action(action(owner, "Play")));
    let archive = archive(owner, &lib.archives, "quake3-1.32.zip");
    lib.save(Entity::Archive(archive.clone()));
    let script = script(owner, "Install", INSTALL_SCRIPT);
    lib.save(Entity::Script(script.clone()));

    lib.save(Entity::CustomField(CustomField {
        id: Uuid::new_v4(),
        game_id: g.id,
        name: "Protocol".to_string(),
        value: "68".to_string(),
    }));
    lib.save(Entity::Key(Key {
        id: Uuid::new_v4(),
        game_id: g.id,
        value: "AAAA-BBBB-CCCC-1234".to_string(),
        allocation_method: KeyAllocationMethod::UserAccount,
        claimed_by_mac_address: None,
        claimed_by_ip_address: None,
        claimed_by_computer_name: None,
        claimed_on: None,
    }));

    let media = Media {
        id: Uuid::new_v4(),
        game_id: g.id,
        file_id: Uuid::new_v4(),
        media_type: MediaType::Cover,
        source_url: None,
        mime_type: "image/png".to_string(),
        size: COVER_BYTES.len() as i64,
        storage_location_id: Some(lib.media.id),
    };
    fs::write(
        Path::new(&lib.media.path).join(media.file_id.to_string()),
        COVER_BYTES,
    )
    .unwrap();
    lib.save(Entity::Media(media.clone()));

    lib.save(Entity::MultiplayerMode(MultiplayerMode {
        id: Uuid::new_v4(),
        game_id: g.id,
        mode_type: MultiplayerType::Lan,
        description: Some("Deathmatch".to_string()),
        min_players: 2,
        max_players: 16,
        spectators: 4,
    }));
    lib.save(Entity::PlaySession(PlaySession {
        id: Uuid::new_v4(),
        game_id: g.id,
        user: "doomguy".to_string(),
        start: Some("2024-03-01T20:00:00+00:00".to_string()),
        end: Some("2024-03-01T22:30:00+00:00".to_string()),
    }));

    let save = Save {
        id: Uuid::new_v4(),
        game_id: g.id,
        user: "doomguy".to_string(),
        size: SAVE_BYTES.len() as i64,
        storage_location_id: Some(lib.saves.id),
        created_on: "2024-03-01T22:30:00+00:00".to_string(),
    };
    fs::write(Path::new(&lib.saves.path).join(save.id.to_string()), SAVE_BYTES).unwrap();
    lib.save(Entity::Save(save.clone()));

    lib.save(Entity::SavePath(SavePath {
        id: Uuid::new_v4(),
        game_id: g.id,
        path_type: SavePathType::File,
        path: "baseq3/*.cfg".to_string(),
        working_directory: None,
        is_regex: false,
    }));

    SeededGame {
        game: g,
        engine,
        genre,
        company,
        script,
        archive,
        media,
        save,
    }
}

// ── Drivers ─────────────────────────────────────────────────────────────────

/// Export everything under `kind`/`id` to `path`.
pub fn export_all(conn: &Connection, kind: RootKind, id: Uuid, path: &Path) -> ExportSummary {
    let mut ctx = ExportContext::new(conn);
    ctx.initialize(kind, id).unwrap();
    ctx.prepare_queue(&Selection::All).unwrap();
    let file = fs::File::create(path).unwrap();
    ctx.export_queue(file).unwrap()
}

/// Import everything in the package at `path` and save.
pub fn import_all(lib: &Library, path: &Path) -> ImportSummary {
    import_with(lib, path, ImportOptions::default())
}

pub fn import_with(lib: &Library, path: &Path, options: ImportOptions) -> ImportSummary {
    let mut ctx = ImportContext::open(&lib.conn, path)
        .unwrap()
        .with_options(options);
    ctx.initialize().unwrap();
    ctx.prepare_queue(&Selection::All, lib.archives.id).unwrap();
    let summary = ctx.import_queue().unwrap();
    ctx.save_changes().unwrap();
    summary
}

/// Copy the package at `from` to `to`, replacing the bytes of `entry`.
pub fn tamper(from: &Path, to: &Path, entry: &str, bytes: &[u8]) {
    let mut reader = zip::ZipArchive::new(fs::File::open(from).unwrap()).unwrap();
    let mut writer = zip::ZipWriter::new(fs::File::create(to).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for i in 0..reader.len() {
        let mut file = reader.by_index(i).unwrap();
        let name = file.name().to_string();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        writer.start_file(name.as_str(), options).unwrap();
        if name == entry {
            writer.write_all(bytes).unwrap();
        } else {
            writer.write_all(&contents).unwrap();
        }
    }
    writer.finish().unwrap();
}

/// Copy the package at `from` to `to`, moving entry `old` to `new`.
pub fn rename_entry(from: &Path, to: &Path, old: &str, new: &str) {
    let mut reader = zip::ZipArchive::new(fs::File::open(from).unwrap()).unwrap();
    let mut writer = zip::ZipWriter::new(fs::File::create(to).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for i in 0..reader.len() {
        let mut file = reader.by_index(i).unwrap();
        let name = file.name().to_string();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        let name = if name == old { new.to_string() } else { name };
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(&contents).unwrap();
    }
    writer.finish().unwrap();
}

/// The manifest text inside a package.
pub fn manifest_text(path: &Path) -> String {
    let mut reader = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    let mut entry = reader.by_name(MANIFEST_ENTRY).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

/// Rewrite a package with a new manifest and the same payloads.
pub fn rewrite_manifest(from: &Path, to: &Path, manifest: &Manifest) {
    let text = write_manifest(manifest).unwrap();
    tamper(from, to, MANIFEST_ENTRY, text.as_bytes());
}
