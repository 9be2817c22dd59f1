//! SQLite persistence layer for game-library packages.
//!
//! Provides schema creation, per-kind CRUD, eager root-graph loading, storage
//! locations, and the [`ChangeTracker`] that accumulates pending changes
//! until a caller flushes them.

pub mod operations;
pub mod queries;
pub mod relation;
pub mod schema;
pub mod storage;
pub mod tracker;

pub use operations::{
    OperationError, delete_entity, find_lookup_by_name, get_lookup, load_entity, save_entity,
    table_name, upsert_lookup,
};
pub use queries::{
    RootSummary, actions_for, archives_for, count_rows, list_roots, load_game_graph,
    load_redistributable_graph, load_root_graph, load_server_graph, load_tool_graph,
    scripts_for,
};
pub use relation::{Relation, linked_ids, replace_links};
pub use schema::{SchemaError, open_database, open_memory};
pub use storage::{
    default_storage_location, delete_storage_location, get_storage_location,
    insert_storage_location, list_storage_locations,
};
pub use tracker::{ChangeTracker, Checkpoint, EntryState, SaveSummary};
