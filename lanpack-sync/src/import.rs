//! Import driver: package archive into the database.
//!
//! ```text
//! Unopened --initialize--> ManifestRead --prepare_queue--> QueuePrepared
//!     --import_queue--> Draining --> Done --save_changes
//! ```
//!
//! The root is upserted once, in `prepare_queue`. Queued records are then
//! imported one at a time; each failure is rolled back to a tracker
//! checkpoint, recorded, and skipped. After the drain the root's collections
//! and links are wired through the [`Reconciler`]. Nothing is written to the
//! database until the caller calls [`ImportContext::save_changes`].

use std::collections::HashSet;
use std::path::Path;

use lanpack_db::{ChangeTracker, SaveSummary, load_root_graph};
use lanpack_model::manifest::GameManifest;
use lanpack_model::{
    DescriptorInfo, Entity, EntityKind, Manifest, Owner, RecordKind, RootGraph, RootKind,
};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::converter::{ImportSession, Importer};
use crate::converters::*;
use crate::error::SyncError;
use crate::package::PackageReader;
use crate::progress::{SilentObserver, SyncObserver};
use crate::queue::{ItemError, QueueItem, Selection, WorkQueue};
use crate::reconcile::Reconciler;
use crate::storage::{DbStorageResolver, Destinations, StorageResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Unopened,
    ManifestRead,
    QueuePrepared,
    Draining,
    Done,
}

impl ImportPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::ManifestRead => "manifest read",
            Self::QueuePrepared => "queue prepared",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

/// Caller-controlled import behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Drop stored sub-records and links that the package does not list.
    ///
    /// Off by default: an import only adds and updates.
    pub prune: bool,
}

/// Outcome of [`ImportContext::import_queue`].
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub kind: RootKind,
    pub root_id: Uuid,
    pub name: String,
    pub root_existed: bool,
    pub added: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<ItemError>,
}

pub struct ImportContext<'a> {
    conn: &'a Connection,
    storage: Box<dyn StorageResolver + 'a>,
    observer: &'a dyn SyncObserver,
    options: ImportOptions,
    phase: ImportPhase,
    package: PackageReader,
    manifest: Option<Manifest>,
    descriptors: Vec<DescriptorInfo>,
    destinations: Option<Destinations>,
    tracker: ChangeTracker,
    queue: WorkQueue,
    root_existed: bool,
    unnamed: HashSet<Uuid>,
}

impl<'a> ImportContext<'a> {
    /// Open a package. The manifest is not read until [`ImportContext::initialize`].
    pub fn open(conn: &'a Connection, path: &Path) -> Result<Self, SyncError> {
        Ok(Self {
            conn,
            storage: Box::new(DbStorageResolver::new(conn)),
            observer: &SilentObserver,
            options: ImportOptions::default(),
            phase: ImportPhase::Unopened,
            package: PackageReader::open(path)?,
            manifest: None,
            descriptors: Vec::new(),
            destinations: None,
            tracker: ChangeTracker::new(),
            queue: WorkQueue::new(),
            root_existed: false,
            unnamed: HashSet::new(),
        })
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn SyncObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_storage(mut self, storage: impl StorageResolver + 'a) -> Self {
        self.storage = Box::new(storage);
        self
    }

    pub fn phase(&self) -> ImportPhase {
        self.phase
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn descriptors(&self) -> &[DescriptorInfo] {
        &self.descriptors
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn destinations(&self) -> Option<&Destinations> {
        self.destinations.as_ref()
    }

    fn expect_phase(&self, operation: &'static str, expected: ImportPhase) -> Result<(), SyncError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SyncError::OutOfOrder {
                operation,
                phase: self.phase.as_str(),
            })
        }
    }

    fn out_of_order(&self, operation: &'static str) -> SyncError {
        SyncError::OutOfOrder {
            operation,
            phase: self.phase.as_str(),
        }
    }

    // ── Phases ──────────────────────────────────────────────────────────────

    /// Read and kind-detect the manifest, then describe every sub-record.
    ///
    /// Records without an identifier are given one here so that selection
    /// and error reporting can address them.
    pub fn initialize(&mut self) -> Result<&[DescriptorInfo], SyncError> {
        self.expect_phase("initialize", ImportPhase::Unopened)?;

        let mut manifest = self.package.read_manifest()?;
        self.unnamed = manifest.assign_missing_ids().into_iter().collect();
        if !self.unnamed.is_empty() {
            log::debug!("Assigned {} missing identifiers", self.unnamed.len());
        }
        log::info!(
            "Read {} manifest for '{}' (version {})",
            manifest.kind(),
            manifest.name(),
            manifest.manifest_version()
        );

        self.descriptors = describe_manifest(&manifest);
        self.manifest = Some(manifest);
        self.phase = ImportPhase::ManifestRead;
        Ok(&self.descriptors)
    }

    /// Resolve payload destinations, upsert the root, and queue the selected
    /// sub-records.
    ///
    /// Fails with [`SyncError::StorageUnavailable`] before touching anything
    /// if `storage_location` cannot take payloads.
    pub fn prepare_queue(
        &mut self,
        selection: &Selection,
        storage_location: Uuid,
    ) -> Result<usize, SyncError> {
        self.expect_phase("prepare_queue", ImportPhase::ManifestRead)?;
        let Some(manifest) = self.manifest.as_ref() else {
            return Err(self.out_of_order("prepare_queue"));
        };

        let destinations = Destinations::resolve(self.storage.as_ref(), storage_location)?;
        log::debug!(
            "Payload destinations: archives={} media={} saves={}",
            destinations.archives.path,
            destinations.media.path,
            destinations.saves.path
        );

        let mut session = ImportSession {
            conn: self.conn,
            tracker: &mut self.tracker,
            package: &mut self.package,
            destinations: &destinations,
            owner: Owner::new(manifest.kind(), manifest.id()),
            unnamed: &self.unnamed,
            extracted: Vec::new(),
        };
        let (_, existed) = upsert_root(&mut session, manifest)?;
        self.root_existed = existed;

        self.queue = WorkQueue::new();
        for info in self.descriptors.iter().filter(|d| selection.includes(d.id)) {
            let item = QueueItem::new(info);
            if self.queue.push(item.clone()) {
                self.observer.on_record_added(&item);
            }
        }

        self.destinations = Some(destinations);
        self.phase = ImportPhase::QueuePrepared;
        Ok(self.queue.len())
    }

    /// Import every queued record, then wire the root's relationships.
    ///
    /// Per-record failures are recorded and skipped. Call
    /// [`ImportContext::save_changes`] afterwards to write the result.
    pub fn import_queue(&mut self) -> Result<ImportSummary, SyncError> {
        self.expect_phase("import_queue", ImportPhase::QueuePrepared)?;
        let (Some(manifest), Some(destinations)) =
            (self.manifest.as_ref(), self.destinations.as_ref())
        else {
            return Err(self.out_of_order("import_queue"));
        };
        self.phase = ImportPhase::Draining;

        let root_kind = manifest.kind();
        let root_id = manifest.id();
        let mut session = ImportSession {
            conn: self.conn,
            tracker: &mut self.tracker,
            package: &mut self.package,
            destinations,
            owner: Owner::new(root_kind, root_id),
            unnamed: &self.unnamed,
            extracted: Vec::new(),
        };

        let total = self.queue.len();
        let mut imported = Vec::with_capacity(total);
        let (mut added, mut updated) = (0, 0);

        for index in 0..total {
            let Some(item) = self.queue.get(index).cloned() else {
                break;
            };
            let checkpoint = session.tracker.checkpoint();
            session.extracted.clear();
            match import_item(&mut session, manifest, &item) {
                Ok((entity, existed)) => {
                    if existed {
                        updated += 1;
                    } else {
                        added += 1;
                    }
                    imported.push((item.kind, entity));
                    self.queue.mark_processed(index);
                    self.observer.on_record_processed(&item, index + 1, total);
                }
                Err(e) => {
                    session.tracker.restore(checkpoint);
                    session.discard_extracted();
                    let message = e.to_string();
                    self.queue.record_error(index, message.clone());
                    self.observer.on_record_error(&item, &message);
                }
            }
        }

        let root = session.tracked(root_kind.entity_kind(), root_id)?;
        let listed: HashSet<(RecordKind, Uuid)> =
            self.descriptors.iter().map(|d| (d.kind, d.id)).collect();
        let graph = wiring_graph(
            self.conn,
            session.tracker,
            root,
            manifest,
            imported,
            &listed,
            self.options.prune,
        )?;
        let stats = Reconciler::new(self.conn, session.tracker).merge_graph(&graph)?;
        log::debug!(
            "Wired {} '{}': {} removed, {} link sets replaced",
            root_kind,
            manifest.name(),
            stats.removed,
            stats.links_replaced
        );

        self.phase = ImportPhase::Done;
        let summary = ImportSummary {
            kind: root_kind,
            root_id,
            name: manifest.name().to_string(),
            root_existed: self.root_existed,
            added,
            updated,
            failed: self.queue.error_count(),
            errors: self.queue.item_errors(),
        };
        log::info!(
            "Imported {} '{}': {} added, {} updated, {} failed",
            summary.kind,
            summary.name,
            summary.added,
            summary.updated,
            summary.failed
        );
        Ok(summary)
    }

    /// Write every pending change in one transaction.
    pub fn save_changes(&mut self) -> Result<SaveSummary, SyncError> {
        self.expect_phase("save_changes", ImportPhase::Done)?;
        let summary = self.tracker.save_changes(self.conn)?;
        log::debug!(
            "Saved: {} inserted, {} updated, {} deleted, {} link sets",
            summary.inserted,
            summary.updated,
            summary.deleted,
            summary.links_replaced
        );
        Ok(summary)
    }
}

// ── Wiring ──────────────────────────────────────────────────────────────────

/// The root graph the reconciler should leave behind.
///
/// Imported rows replace their stored counterparts in place and new ones are
/// appended. Stored rows the run did not import are kept, unless pruning, in
/// which case only those the package still lists (deselected or failed) stay.
fn wiring_graph(
    conn: &Connection,
    tracker: &ChangeTracker,
    root: Entity,
    manifest: &Manifest,
    imported: Vec<(RecordKind, Entity)>,
    listed: &HashSet<(RecordKind, Uuid)>,
    prune: bool,
) -> Result<RootGraph, SyncError> {
    let root_kind = manifest.kind();
    let stored = load_root_graph(conn, root_kind, manifest.id())?;
    let stored_records = stored.as_ref().map(RootGraph::records).unwrap_or_default();

    let mut records = Vec::new();
    for &kind in root_kind.record_kinds() {
        let incoming: Vec<Entity> = of_kind(&imported, kind);
        if kind == RecordKind::Engine {
            // The root upsert already settled which engine the game points at.
            let engine_id = match &root {
                Entity::Game(game) => game.engine_id,
                _ => None,
            };
            let engine = incoming.into_iter().next().or_else(|| {
                let id = engine_id?;
                tracker.find(EntityKind::Engine, id).cloned().or_else(|| {
                    of_kind(&stored_records, kind)
                        .into_iter()
                        .find(|e| e.id() == id)
                })
            });
            records.extend(engine.map(|e| (kind, e)));
            continue;
        }

        let mut wired: Vec<Entity> = Vec::new();
        for entity in of_kind(&stored_records, kind) {
            if let Some(fresh) = incoming.iter().find(|e| e.id() == entity.id()) {
                wired.push(fresh.clone());
            } else if !prune || listed.contains(&(kind, entity.id())) {
                wired.push(entity);
            }
        }
        for entity in incoming {
            if !wired.iter().any(|e| e.id() == entity.id()) {
                wired.push(entity);
            }
        }
        records.extend(wired.into_iter().map(|e| (kind, e)));
    }

    let games = match (manifest, &stored) {
        (Manifest::Tool(m), Some(RootGraph::Tool(t))) if !prune => {
            let mut games = t.games.clone();
            games.extend(m.games.iter().filter(|id| !t.games.contains(id)));
            games
        }
        (Manifest::Tool(m), _) => m.games.clone(),
        _ => Vec::new(),
    };

    RootGraph::assemble(root, records, games).ok_or_else(|| {
        SyncError::InvalidRecord(format!("'{}' is not a {root_kind} row", manifest.name()))
    })
}

fn of_kind(records: &[(RecordKind, Entity)], kind: RecordKind) -> Vec<Entity> {
    records
        .iter()
        .filter(|(k, _)| *k == kind)
        .map(|(_, e)| e.clone())
        .collect()
}

// ── Dispatch ────────────────────────────────────────────────────────────────

fn upsert_root(
    session: &mut ImportSession<'_>,
    manifest: &Manifest,
) -> Result<(Entity, bool), SyncError> {
    match manifest {
        Manifest::Game(m) => GameConverter::upsert_root(session, m),
        Manifest::Redistributable(m) => RedistributableConverter::upsert_root(session, m),
        Manifest::Server(m) => ServerConverter::upsert_root(session, m),
        Manifest::Tool(m) => ToolConverter::upsert_root(session, m),
    }
}

/// Describe every sub-record in the manifest, in manifest order.
pub fn describe_manifest(manifest: &Manifest) -> Vec<DescriptorInfo> {
    let game = manifest.as_game();
    let mut out = Vec::new();
    for &kind in manifest.kind().record_kinds() {
        match kind {
            RecordKind::Action => {
                out.extend(manifest.actions().iter().map(ActionConverter::import_info));
            }
            RecordKind::Archive => {
                out.extend(manifest.archives().iter().map(ArchiveConverter::import_info));
            }
            RecordKind::Script => {
                out.extend(manifest.scripts().iter().map(ScriptConverter::import_info));
            }
            RecordKind::ServerConsole => out.extend(
                manifest
                    .server_consoles()
                    .iter()
                    .map(ServerConsoleConverter::import_info),
            ),
            RecordKind::ServerHttpPath => out.extend(
                manifest
                    .server_http_paths()
                    .iter()
                    .map(ServerHttpPathConverter::import_info),
            ),
            _ => {
                if let Some(game) = game {
                    out.extend(describe_game_records(game, kind));
                }
            }
        }
    }
    out
}

fn describe_game_records(game: &GameManifest, kind: RecordKind) -> Vec<DescriptorInfo> {
    match kind {
        RecordKind::Collection => game.collections.iter().map(CollectionConverter::import_info).collect(),
        RecordKind::CustomField => game.custom_fields.iter().map(CustomFieldConverter::import_info).collect(),
        RecordKind::Developer => game.developers.iter().map(DeveloperConverter::import_info).collect(),
        RecordKind::Publisher => game.publishers.iter().map(PublisherConverter::import_info).collect(),
        RecordKind::Engine => game.engine.iter().map(EngineConverter::import_info).collect(),
        RecordKind::Genre => game.genres.iter().map(GenreConverter::import_info).collect(),
        RecordKind::Key => game.keys.iter().map(KeyConverter::import_info).collect(),
        RecordKind::Media => game.media.iter().map(MediaConverter::import_info).collect(),
        RecordKind::MultiplayerMode => game
            .multiplayer_modes
            .iter()
            .map(MultiplayerModeConverter::import_info)
            .collect(),
        RecordKind::Platform => game.platforms.iter().map(PlatformConverter::import_info).collect(),
        RecordKind::PlaySession => game.play_sessions.iter().map(PlaySessionConverter::import_info).collect(),
        RecordKind::Save => game.saves.iter().map(SaveConverter::import_info).collect(),
        RecordKind::SavePath => game.save_paths.iter().map(SavePathConverter::import_info).collect(),
        RecordKind::Tag => game.tags.iter().map(TagConverter::import_info).collect(),
        RecordKind::Action
        | RecordKind::Archive
        | RecordKind::Script
        | RecordKind::ServerConsole
        | RecordKind::ServerHttpPath => Vec::new(),
    }
}

/// Import one queued record through its kind's converter.
fn import_item(
    session: &mut ImportSession<'_>,
    manifest: &Manifest,
    item: &QueueItem,
) -> Result<(Entity, bool), SyncError> {
    match item.kind {
        RecordKind::Action => ActionConverter::upsert(session, pick(manifest.actions(), item, |r| r.id)?),
        RecordKind::Archive => {
            ArchiveConverter::upsert(session, pick(manifest.archives(), item, |r| r.id)?)
        }
        RecordKind::Script => ScriptConverter::upsert(session, pick(manifest.scripts(), item, |r| r.id)?),
        RecordKind::ServerConsole => ServerConsoleConverter::upsert(
            session,
            pick(manifest.server_consoles(), item, |r| r.id)?,
        ),
        RecordKind::ServerHttpPath => ServerHttpPathConverter::upsert(
            session,
            pick(manifest.server_http_paths(), item, |r| r.id)?,
        ),
        kind => {
            let Some(game) = manifest.as_game() else {
                return Err(SyncError::InvalidRecord(format!(
                    "a {} manifest has no {kind} records",
                    manifest.kind()
                )));
            };
            import_game_item(session, game, item)
        }
    }
}

fn import_game_item(
    session: &mut ImportSession<'_>,
    game: &GameManifest,
    item: &QueueItem,
) -> Result<(Entity, bool), SyncError> {
    match item.kind {
        RecordKind::Collection => CollectionConverter::upsert(session, pick(&game.collections, item, |r| r.id)?),
        RecordKind::CustomField => {
            CustomFieldConverter::upsert(session, pick(&game.custom_fields, item, |r| r.id)?)
        }
        RecordKind::Developer => DeveloperConverter::upsert(session, pick(&game.developers, item, |r| r.id)?),
        RecordKind::Publisher => PublisherConverter::upsert(session, pick(&game.publishers, item, |r| r.id)?),
        RecordKind::Engine => EngineConverter::upsert(session, pick(game.engine.as_slice(), item, |r| r.id)?),
        RecordKind::Genre => GenreConverter::upsert(session, pick(&game.genres, item, |r| r.id)?),
        RecordKind::Key => KeyConverter::upsert(session, pick(&game.keys, item, |r| r.id)?),
        RecordKind::Media => MediaConverter::upsert(session, pick(&game.media, item, |r| r.id)?),
        RecordKind::MultiplayerMode => MultiplayerModeConverter::upsert(
            session,
            pick(&game.multiplayer_modes, item, |r| r.id)?,
        ),
        RecordKind::Platform => PlatformConverter::upsert(session, pick(&game.platforms, item, |r| r.id)?),
        RecordKind::PlaySession => {
            PlaySessionConverter::upsert(session, pick(&game.play_sessions, item, |r| r.id)?)
        }
        RecordKind::Save => SaveConverter::upsert(session, pick(&game.saves, item, |r| r.id)?),
        RecordKind::SavePath => SavePathConverter::upsert(session, pick(&game.save_paths, item, |r| r.id)?),
        RecordKind::Tag => TagConverter::upsert(session, pick(&game.tags, item, |r| r.id)?),
        RecordKind::Action
        | RecordKind::Archive
        | RecordKind::Script
        | RecordKind::ServerConsole
        | RecordKind::ServerHttpPath => Err(SyncError::InvalidRecord(format!(
            "{} is not a game-only record kind",
            item.kind
        ))),
    }
}

/// The manifest record a queue item refers to.
fn pick<'m, R>(
    records: &'m [R],
    item: &QueueItem,
    id: impl Fn(&R) -> Uuid,
) -> Result<&'m R, SyncError> {
    records
        .iter()
        .find(|r| id(r) == item.id)
        .ok_or(SyncError::RecordNotFound {
            kind: item.kind.as_str(),
            id: item.id,
        })
}
