//! Export and import of game-library packages.
//!
//! A package is a zip archive holding a YAML manifest for one root record
//! (game, redistributable, server, or tool) and the payload files its
//! sub-records refer to. [`ExportContext`] writes packages from the library
//! database; [`ImportContext`] reads them back, deduplicating shared lookups
//! by name and everything else by identifier.

pub mod converter;
pub mod converters;
pub mod error;
pub mod export;
pub mod import;
pub mod package;
pub mod progress;
pub mod queue;
pub mod reconcile;
pub mod storage;

pub use error::SyncError;
pub use export::{ExportContext, ExportPhase, ExportSummary};
pub use import::{ImportContext, ImportOptions, ImportPhase, ImportSummary, describe_manifest};
pub use package::{PackageReader, PackageWriter, Payload, PayloadSource, payload_entry};
pub use progress::{LogObserver, SilentObserver, SyncObserver};
pub use queue::{ItemError, QueueItem, Selection, WorkQueue};
pub use reconcile::{MergeOutcome, MergeStats, Merged, Reconciler};
pub use storage::{DbStorageResolver, Destinations, StorageResolver};
