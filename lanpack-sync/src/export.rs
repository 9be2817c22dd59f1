//! Export driver: root graph in the database to a package archive.
//!
//! ```text
//! Uninitialized --initialize--> Initialized --prepare_queue--> QueuePrepared
//!     --export_queue--> Draining --> Done
//! ```
//!
//! Each queued sub-record is exported on its own. A record that fails is
//! noted in the error map and the run moves on; only a failure to write the
//! manifest or close the archive aborts the export.

use std::io::{Seek, Write};

use lanpack_db::load_root_graph;
use lanpack_model::{DescriptorInfo, Entity, Manifest, RecordKind, RootGraph, RootKind};
use lanpack_model::manifest::{GameManifest, ServerManifest};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::converter::Exporter;
use crate::converters::*;
use crate::error::SyncError;
use crate::package::{PackageWriter, Payload};
use crate::progress::{SilentObserver, SyncObserver};
use crate::queue::{ItemError, QueueItem, Selection, WorkQueue};
use crate::storage::{DbStorageResolver, StorageResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Uninitialized,
    Initialized,
    QueuePrepared,
    Draining,
    Done,
}

impl ExportPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::QueuePrepared => "queue prepared",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

/// Outcome of [`ExportContext::export_queue`].
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub kind: RootKind,
    pub root_id: Uuid,
    pub name: String,
    pub exported: usize,
    pub failed: usize,
    pub errors: Vec<ItemError>,
}

pub struct ExportContext<'a> {
    conn: &'a Connection,
    storage: Box<dyn StorageResolver + 'a>,
    observer: &'a dyn SyncObserver,
    phase: ExportPhase,
    graph: Option<RootGraph>,
    descriptors: Vec<DescriptorInfo>,
    queue: WorkQueue,
}

impl<'a> ExportContext<'a> {
    /// A context resolving payload files through the database's storage locations.
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            storage: Box::new(DbStorageResolver::new(conn)),
            observer: &SilentObserver,
            phase: ExportPhase::Uninitialized,
            graph: None,
            descriptors: Vec::new(),
            queue: WorkQueue::new(),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn SyncObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_storage(mut self, storage: impl StorageResolver + 'a) -> Self {
        self.storage = Box::new(storage);
        self
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    pub fn graph(&self) -> Option<&RootGraph> {
        self.graph.as_ref()
    }

    pub fn descriptors(&self) -> &[DescriptorInfo] {
        &self.descriptors
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    fn expect_phase(
        &self,
        operation: &'static str,
        allowed: &[ExportPhase],
    ) -> Result<(), SyncError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(SyncError::OutOfOrder {
                operation,
                phase: self.phase.as_str(),
            })
        }
    }

    // ── Phases ──────────────────────────────────────────────────────────────

    /// Load the root with every dependent collection and describe each
    /// sub-record, in manifest order.
    pub fn initialize(&mut self, kind: RootKind, id: Uuid) -> Result<&[DescriptorInfo], SyncError> {
        self.expect_phase("initialize", &[ExportPhase::Uninitialized])?;

        let graph = load_root_graph(self.conn, kind, id)?.ok_or(SyncError::RecordNotFound {
            kind: kind.as_str(),
            id,
        })?;
        self.descriptors = graph
            .records()
            .iter()
            .map(|(record_kind, entity)| describe(*record_kind, entity))
            .collect();
        log::info!(
            "Exporting {} '{}' ({} sub-records)",
            kind,
            graph.name(),
            self.descriptors.len()
        );

        self.graph = Some(graph);
        self.phase = ExportPhase::Initialized;
        Ok(&self.descriptors)
    }

    /// Queue the selected sub-records. May be called again to reselect.
    pub fn prepare_queue(&mut self, selection: &Selection) -> Result<usize, SyncError> {
        self.expect_phase(
            "prepare_queue",
            &[ExportPhase::Initialized, ExportPhase::QueuePrepared],
        )?;

        self.queue = WorkQueue::new();
        for info in self.descriptors.iter().filter(|d| selection.includes(d.id)) {
            let item = QueueItem::new(info);
            if self.queue.push(item.clone()) {
                self.observer.on_record_added(&item);
            }
        }

        self.phase = ExportPhase::QueuePrepared;
        Ok(self.queue.len())
    }

    /// Write the package: every queued payload, then the manifest last.
    pub fn export_queue<W: Write + Seek>(&mut self, out: W) -> Result<ExportSummary, SyncError> {
        self.expect_phase("export_queue", &[ExportPhase::QueuePrepared])?;
        let Some(graph) = self.graph.as_ref() else {
            return Err(SyncError::OutOfOrder {
                operation: "export_queue",
                phase: self.phase.as_str(),
            });
        };
        self.phase = ExportPhase::Draining;

        let mut manifest = export_root(graph);
        let mut writer = PackageWriter::new(out);
        let total = self.queue.len();

        for index in 0..total {
            let Some(item) = self.queue.get(index).cloned() else {
                break;
            };
            let result = export_item(
                self.conn,
                self.storage.as_ref(),
                &mut writer,
                &mut manifest,
                &item,
            );
            match result {
                Ok(()) => {
                    self.queue.mark_processed(index);
                    self.observer.on_record_processed(&item, index + 1, total);
                }
                Err(e) => {
                    let message = e.to_string();
                    self.queue.record_error(index, message.clone());
                    self.observer.on_record_error(&item, &message);
                }
            }
        }

        writer.write_manifest(&manifest)?;
        writer.finish()?.flush()?;
        self.phase = ExportPhase::Done;

        let summary = ExportSummary {
            kind: graph.kind(),
            root_id: graph.id(),
            name: graph.name().to_string(),
            exported: self.queue.processed_count(),
            failed: self.queue.error_count(),
            errors: self.queue.item_errors(),
        };
        log::info!(
            "Exported {} of {} sub-records ({} failed)",
            summary.exported,
            total,
            summary.failed
        );
        Ok(summary)
    }
}

// ── Dispatch ────────────────────────────────────────────────────────────────

fn export_root(graph: &RootGraph) -> Manifest {
    match graph {
        RootGraph::Game(g) => GameConverter::export_root(g),
        RootGraph::Redistributable(g) => RedistributableConverter::export_root(g),
        RootGraph::Server(g) => ServerConverter::export_root(g),
        RootGraph::Tool(g) => ToolConverter::export_root(g),
    }
}

fn describe(kind: RecordKind, entity: &Entity) -> DescriptorInfo {
    match kind {
        RecordKind::Action => ActionConverter::export_info(entity),
        RecordKind::Archive => ArchiveConverter::export_info(entity),
        RecordKind::Collection => CollectionConverter::export_info(entity),
        RecordKind::CustomField => CustomFieldConverter::export_info(entity),
        RecordKind::Developer => DeveloperConverter::export_info(entity),
        RecordKind::Publisher => PublisherConverter::export_info(entity),
        RecordKind::Engine => EngineConverter::export_info(entity),
        RecordKind::Genre => GenreConverter::export_info(entity),
        RecordKind::Key => KeyConverter::export_info(entity),
        RecordKind::Media => MediaConverter::export_info(entity),
        RecordKind::MultiplayerMode => MultiplayerModeConverter::export_info(entity),
        RecordKind::Platform => PlatformConverter::export_info(entity),
        RecordKind::PlaySession => PlaySessionConverter::export_info(entity),
        RecordKind::Save => SaveConverter::export_info(entity),
        RecordKind::SavePath => SavePathConverter::export_info(entity),
        RecordKind::Script => ScriptConverter::export_info(entity),
        RecordKind::ServerConsole => ServerConsoleConverter::export_info(entity),
        RecordKind::ServerHttpPath => ServerHttpPathConverter::export_info(entity),
        RecordKind::Tag => TagConverter::export_info(entity),
    }
}

/// Export one queued record into `manifest`, copying its payload first.
fn export_item<W: Write + Seek>(
    conn: &Connection,
    storage: &dyn StorageResolver,
    writer: &mut PackageWriter<W>,
    manifest: &mut Manifest,
    item: &QueueItem,
) -> Result<(), SyncError> {
    let id = item.id;
    match item.kind {
        RecordKind::Action => {
            let e = ActionConverter::export(conn, storage, id)?;
            manifest.actions_mut().push(e.record);
        }
        RecordKind::Archive => {
            let kind = manifest.kind();
            let list = manifest.archives_mut().ok_or_else(|| misplaced(kind, item))?;
            let mut e = ArchiveConverter::export(conn, storage, id)?;
            e.record.sha256 = write_payload(writer, e.payload.as_ref())?;
            list.push(e.record);
        }
        RecordKind::Script => {
            let mut e = ScriptConverter::export(conn, storage, id)?;
            e.record.sha256 = write_payload(writer, e.payload.as_ref())?;
            manifest.scripts_mut().push(e.record);
        }
        RecordKind::Collection => {
            let e = CollectionConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.collections.push(e.record);
        }
        RecordKind::CustomField => {
            let e = CustomFieldConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.custom_fields.push(e.record);
        }
        RecordKind::Developer => {
            let e = DeveloperConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.developers.push(e.record);
        }
        RecordKind::Publisher => {
            let e = PublisherConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.publishers.push(e.record);
        }
        RecordKind::Engine => {
            let e = EngineConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.engine = Some(e.record);
        }
        RecordKind::Genre => {
            let e = GenreConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.genres.push(e.record);
        }
        RecordKind::Key => {
            let e = KeyConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.keys.push(e.record);
        }
        RecordKind::Media => {
            let game = game_of(manifest, item)?;
            let mut e = MediaConverter::export(conn, storage, id)?;
            e.record.sha256 = write_payload(writer, e.payload.as_ref())?;
            game.media.push(e.record);
        }
        RecordKind::MultiplayerMode => {
            let e = MultiplayerModeConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.multiplayer_modes.push(e.record);
        }
        RecordKind::Platform => {
            let e = PlatformConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.platforms.push(e.record);
        }
        RecordKind::PlaySession => {
            let e = PlaySessionConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.play_sessions.push(e.record);
        }
        RecordKind::Save => {
            let game = game_of(manifest, item)?;
            let mut e = SaveConverter::export(conn, storage, id)?;
            e.record.sha256 = write_payload(writer, e.payload.as_ref())?;
            game.saves.push(e.record);
        }
        RecordKind::SavePath => {
            let e = SavePathConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.save_paths.push(e.record);
        }
        RecordKind::Tag => {
            let e = TagConverter::export(conn, storage, id)?;
            game_of(manifest, item)?.tags.push(e.record);
        }
        RecordKind::ServerConsole => {
            let e = ServerConsoleConverter::export(conn, storage, id)?;
            server_of(manifest, item)?.server_consoles.push(e.record);
        }
        RecordKind::ServerHttpPath => {
            let e = ServerHttpPathConverter::export(conn, storage, id)?;
            server_of(manifest, item)?.server_http_paths.push(e.record);
        }
    }
    Ok(())
}

fn write_payload<W: Write + Seek>(
    writer: &mut PackageWriter<W>,
    payload: Option<&Payload>,
) -> Result<String, SyncError> {
    match payload {
        Some(payload) => writer.write_payload(payload),
        None => Ok(String::new()),
    }
}

fn misplaced(kind: RootKind, item: &QueueItem) -> SyncError {
    SyncError::InvalidRecord(format!(
        "a {kind} manifest has no place for {} '{}'",
        item.kind, item.name
    ))
}

fn game_of<'m>(
    manifest: &'m mut Manifest,
    item: &QueueItem,
) -> Result<&'m mut GameManifest, SyncError> {
    let kind = manifest.kind();
    manifest.as_game_mut().ok_or_else(|| misplaced(kind, item))
}

fn server_of<'m>(
    manifest: &'m mut Manifest,
    item: &QueueItem,
) -> Result<&'m mut ServerManifest, SyncError> {
    let kind = manifest.kind();
    manifest.as_server_mut().ok_or_else(|| misplaced(kind, item))
}
