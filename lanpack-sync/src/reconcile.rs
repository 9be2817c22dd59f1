//! Safe-attach merge of externally sourced entities into the change tracker.
//!
//! An incoming entity never becomes a second tracked instance of a row the
//! store already knows. If its identifier is tracked or persisted, the tracked
//! instance absorbs the incoming scalar values; otherwise the entity is added.
//! Lookup rows are matched by exact name before identifier, since two
//! libraries may have created the same genre or tag independently.
//!
//! Collections are merged by a three-way diff on identifier: members in both
//! the persisted and incoming sets are updated in place, incoming-only members
//! are merged in, and persisted-only members are dropped.

use std::collections::HashSet;

use lanpack_db::{ChangeTracker, OperationError, Relation, load_root_graph};
use lanpack_model::{Entity, EntityKind, RecordKind, RootGraph};
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::SyncError;

/// What a single merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Added,
    Updated,
    Unchanged,
}

/// The tracked row an incoming entity was merged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merged {
    pub kind: EntityKind,
    pub id: Uuid,
    pub outcome: MergeOutcome,
}

/// Running totals for one reconciler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub links_replaced: usize,
}

pub struct Reconciler<'a> {
    conn: &'a Connection,
    tracker: &'a mut ChangeTracker,
    stats: MergeStats,
}

impl<'a> Reconciler<'a> {
    pub fn new(conn: &'a Connection, tracker: &'a mut ChangeTracker) -> Self {
        Self {
            conn,
            tracker,
            stats: MergeStats::default(),
        }
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    // ── Single Entities ─────────────────────────────────────────────────────

    /// Merge one entity. Lookup kinds are matched by name first.
    pub fn merge(&mut self, entity: Entity) -> Result<Merged, SyncError> {
        if entity.kind().is_lookup() {
            self.merge_lookup(entity)
        } else {
            self.merge_by_id(entity)
        }
    }

    /// Merge a lookup row: an existing row with the same exact name wins over
    /// the incoming identifier.
    pub fn merge_lookup(&mut self, entity: Entity) -> Result<Merged, SyncError> {
        let kind = entity.kind();
        let Some(name) = entity.lookup_name() else {
            return Err(SyncError::InvalidRecord(format!("{kind} is not a lookup kind")));
        };
        if let Some(existing) = self.tracker.find_by_name(self.conn, kind, name)? {
            self.stats.unchanged += 1;
            return Ok(Merged {
                kind,
                id: existing.id(),
                outcome: MergeOutcome::Unchanged,
            });
        }
        self.merge_by_id(entity)
    }

    fn merge_by_id(&mut self, mut entity: Entity) -> Result<Merged, SyncError> {
        let kind = entity.kind();
        if entity.id().is_nil() {
            entity.set_id(Uuid::new_v4());
        }
        let id = entity.id();

        let outcome = if self.tracker.load(self.conn, kind, id)?.is_some() {
            if self.tracker.copy_values(kind, id, &entity)? {
                self.stats.updated += 1;
                MergeOutcome::Updated
            } else {
                self.stats.unchanged += 1;
                MergeOutcome::Unchanged
            }
        } else {
            self.tracker.add(entity)?;
            self.stats.added += 1;
            MergeOutcome::Added
        };

        Ok(Merged { kind, id, outcome })
    }

    // ── Relationships ───────────────────────────────────────────────────────

    /// Replace a to-one reference on a tracked owner.
    ///
    /// The target (if any) is merged first; `assign` then writes the resolved
    /// identifier onto the owner. Returns the resolved identifier.
    pub fn merge_reference(
        &mut self,
        owner_kind: EntityKind,
        owner_id: Uuid,
        target: Option<Entity>,
        assign: impl FnOnce(&mut Entity, Option<Uuid>),
    ) -> Result<Option<Uuid>, SyncError> {
        let target_id = match target {
            Some(entity) => Some(self.merge(entity)?.id),
            None => None,
        };
        let Some(mut owner) = self.tracker.load(self.conn, owner_kind, owner_id)? else {
            return Err(SyncError::RecordNotFound {
                kind: owner_kind.as_str(),
                id: owner_id,
            });
        };
        assign(&mut owner, target_id);
        self.tracker.update(owner)?;
        Ok(target_id)
    }

    /// Three-way merge of an owned collection.
    ///
    /// Returns the identifiers of the resulting collection in incoming order.
    /// Persisted members missing from `incoming` are marked for deletion.
    pub fn merge_collection(
        &mut self,
        persisted: Vec<Entity>,
        incoming: Vec<Entity>,
    ) -> Result<Vec<Uuid>, SyncError> {
        let mut result = Vec::with_capacity(incoming.len());
        let mut kept = HashSet::new();

        for entity in incoming {
            let merged = self.merge(entity)?;
            if kept.insert(merged.id) {
                result.push(merged.id);
            }
        }

        for entity in persisted {
            let (kind, id) = (entity.kind(), entity.id());
            if kept.contains(&id) {
                continue;
            }
            if self.tracker.load(self.conn, kind, id)?.is_some() {
                self.tracker.remove(kind, id)?;
                self.stats.removed += 1;
            }
        }

        Ok(result)
    }

    /// Resolve lookup rows and make them the full link set of `owner_id`.
    pub fn merge_links(
        &mut self,
        relation: Relation,
        owner_id: Uuid,
        incoming: Vec<Entity>,
    ) -> Result<Vec<Uuid>, SyncError> {
        let mut ids = Vec::with_capacity(incoming.len());
        for entity in incoming {
            let id = self.merge_lookup(entity)?.id;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.replace_links(relation, owner_id, ids)
    }

    /// Link `owner_id` to existing rows only; unknown targets are skipped.
    pub fn link_existing(
        &mut self,
        relation: Relation,
        owner_id: Uuid,
        targets: &[Uuid],
    ) -> Result<Vec<Uuid>, SyncError> {
        let target_kind = relation.target_kind();
        let mut ids = Vec::with_capacity(targets.len());
        for &id in targets {
            if self.tracker.load(self.conn, target_kind, id)?.is_none() {
                log::warn!("Skipping link to unknown {target_kind} '{id}'");
                continue;
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.replace_links(relation, owner_id, ids)
    }

    fn replace_links(
        &mut self,
        relation: Relation,
        owner_id: Uuid,
        ids: Vec<Uuid>,
    ) -> Result<Vec<Uuid>, SyncError> {
        let current = self.tracker.links(self.conn, relation, owner_id)?;
        if current != ids {
            self.tracker.set_links(relation, owner_id, ids.clone());
            self.stats.links_replaced += 1;
        }
        Ok(ids)
    }

    // ── Whole Graphs ────────────────────────────────────────────────────────

    /// Merge a root and every dependent collection.
    ///
    /// Each collection of `graph` becomes the collection's new state: owned
    /// rows absent from it are deleted and links absent from it are removed.
    /// Callers wanting additive behaviour include the persisted members.
    pub fn merge_graph(&mut self, graph: &RootGraph) -> Result<MergeStats, SyncError> {
        let root_kind = graph.kind();
        let root_id = graph.id();
        if root_id.is_nil() {
            return Err(SyncError::InvalidRecord(format!(
                "{root_kind} '{}' has no identifier",
                graph.name()
            )));
        }

        let persisted = load_root_graph(self.conn, root_kind, root_id)?
            .map(|g| g.records())
            .unwrap_or_default();
        let incoming = graph.records();

        self.merge(graph.root_entity())?;

        for &kind in root_kind.record_kinds() {
            let incoming_of_kind = of_kind(&incoming, kind);
            match kind {
                RecordKind::Engine => {
                    self.merge_reference(
                        EntityKind::Game,
                        root_id,
                        incoming_of_kind.into_iter().next(),
                        |owner, engine_id| {
                            if let Entity::Game(game) = owner {
                                game.engine_id = engine_id;
                            }
                        },
                    )?;
                }
                k if k.is_lookup() => {
                    let relation = Relation::from_record_kind(k).ok_or_else(|| {
                        OperationError::NotFound {
                            entity_type: "relation".to_string(),
                            id: k.to_string(),
                        }
                    })?;
                    self.merge_links(relation, root_id, incoming_of_kind)?;
                }
                _ => {
                    self.merge_collection(of_kind(&persisted, kind), incoming_of_kind)?;
                }
            }
        }

        if let RootGraph::Tool(tool) = graph {
            self.link_existing(Relation::ToolGames, root_id, &tool.games)?;
        }

        Ok(self.stats)
    }
}

fn of_kind(records: &[(RecordKind, Entity)], kind: RecordKind) -> Vec<Entity> {
    records
        .iter()
        .filter(|(k, _)| *k == kind)
        .map(|(_, e)| e.clone())
        .collect()
}
