//! Identity-mapped change tracker.
//!
//! The tracker holds at most one [`Entity`] per `(kind, id)`. Rows loaded from
//! the database are attached with a snapshot of their persisted values, so
//! later edits can be detected per property. New rows are added without a
//! snapshot. Nothing reaches the database until [`ChangeTracker::save_changes`]
//! writes every pending insert, update, link replacement, and delete in one
//! transaction.

use std::collections::HashMap;

use lanpack_model::{Entity, EntityKind};
use rusqlite::Connection;
use uuid::Uuid;

use crate::operations::{self, OperationError};
use crate::relation::{self, Relation};

/// Pending state of a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Unchanged,
    Added,
    Modified,
    Deleted,
}

/// Counts of rows written by [`ChangeTracker::save_changes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub links_replaced: usize,
}

impl SaveSummary {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0 && self.links_replaced == 0
    }
}

#[derive(Debug, Clone)]
struct Entry {
    entity: Entity,
    /// Persisted values; `None` for rows added in this session.
    original: Option<Entity>,
    deleted: bool,
    seq: u64,
}

impl Entry {
    fn state(&self) -> EntryState {
        if self.deleted {
            EntryState::Deleted
        } else {
            match &self.original {
                None => EntryState::Added,
                Some(original) if *original != self.entity => EntryState::Modified,
                Some(_) => EntryState::Unchanged,
            }
        }
    }
}

type Key = (EntityKind, Uuid);

/// A saved copy of the tracker's pending state.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    entries: HashMap<Key, Entry>,
    links: HashMap<(Relation, Uuid), Vec<Uuid>>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: HashMap<Key, Entry>,
    links: HashMap<(Relation, Uuid), Vec<Uuid>>,
    next_seq: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Tracking ────────────────────────────────────────────────────────────

    /// Track a row that already exists in the database.
    pub fn attach(&mut self, entity: Entity) -> Result<(), OperationError> {
        self.insert_entry(entity, true)
    }

    /// Track a new row to be inserted on save.
    pub fn add(&mut self, entity: Entity) -> Result<(), OperationError> {
        self.insert_entry(entity, false)
    }

    fn insert_entry(&mut self, entity: Entity, persisted: bool) -> Result<(), OperationError> {
        let key = (entity.kind(), entity.id());
        if self.entries.contains_key(&key) {
            return Err(OperationError::AlreadyTracked {
                kind: key.0,
                id: key.1,
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let original = persisted.then(|| entity.clone());
        self.entries.insert(
            key,
            Entry {
                entity,
                original,
                deleted: false,
                seq,
            },
        );
        Ok(())
    }

    /// Whether `(kind, id)` is tracked and not marked for deletion.
    pub fn contains(&self, kind: EntityKind, id: Uuid) -> bool {
        self.find(kind, id).is_some()
    }

    /// A tracked row, ignoring rows marked for deletion.
    pub fn find(&self, kind: EntityKind, id: Uuid) -> Option<&Entity> {
        self.entries
            .get(&(kind, id))
            .filter(|e| !e.deleted)
            .map(|e| &e.entity)
    }

    pub fn find_mut(&mut self, kind: EntityKind, id: Uuid) -> Option<&mut Entity> {
        self.entries
            .get_mut(&(kind, id))
            .filter(|e| !e.deleted)
            .map(|e| &mut e.entity)
    }

    /// Resolve `(kind, id)` from the tracker, falling back to the database.
    ///
    /// A row found in the database is attached, so later lookups and edits
    /// share the one tracked instance.
    pub fn load(
        &mut self,
        conn: &Connection,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<Entity>, OperationError> {
        if let Some(entry) = self.entries.get(&(kind, id)) {
            return Ok((!entry.deleted).then(|| entry.entity.clone()));
        }
        match operations::load_entity(conn, kind, id)? {
            Some(entity) => {
                self.attach(entity.clone())?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Find a lookup row by exact name, checking tracked rows first.
    pub fn find_by_name(
        &mut self,
        conn: &Connection,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<Entity>, OperationError> {
        let tracked = self
            .entries
            .iter()
            .filter(|((k, _), e)| *k == kind && !e.deleted)
            .filter(|(_, e)| e.entity.lookup_name() == Some(name))
            .min_by_key(|(_, e)| e.seq)
            .map(|(_, e)| e.entity.clone());
        if tracked.is_some() {
            return Ok(tracked);
        }

        let Some(lookup) = operations::find_lookup_by_name(conn, kind, name)? else {
            return Ok(None);
        };
        if self.entries.contains_key(&(kind, lookup.id)) {
            // Renamed or deleted in this session; the stored name is free.
            return Ok(None);
        }
        let Some(entity) = Entity::from_lookup(kind, lookup) else {
            return Ok(None);
        };
        self.attach(entity.clone())?;
        Ok(Some(entity))
    }

    /// Replace the values of a tracked row.
    pub fn update(&mut self, entity: Entity) -> Result<(), OperationError> {
        let key = (entity.kind(), entity.id());
        match self.entries.get_mut(&key) {
            Some(entry) if !entry.deleted => {
                entry.entity = entity;
                Ok(())
            }
            _ => Err(OperationError::NotTracked {
                kind: key.0,
                id: key.1,
            }),
        }
    }

    /// Copy every non-key value of `incoming` onto the tracked row `(kind, id)`.
    ///
    /// Returns whether any value differed.
    pub fn copy_values(
        &mut self,
        kind: EntityKind,
        id: Uuid,
        incoming: &Entity,
    ) -> Result<bool, OperationError> {
        let Some(target) = self.find_mut(kind, id) else {
            return Err(OperationError::NotTracked { kind, id });
        };
        let before = target.clone();
        if !target.copy_scalars_from(incoming) {
            return Err(OperationError::KindMismatch {
                tracked: kind,
                incoming: incoming.kind(),
            });
        }
        Ok(*target != before)
    }

    /// Mark a row for deletion. A row added in this session is simply dropped.
    pub fn remove(&mut self, kind: EntityKind, id: Uuid) -> Result<(), OperationError> {
        let Some(entry) = self.entries.get_mut(&(kind, id)) else {
            return Err(OperationError::NotTracked { kind, id });
        };
        if entry.original.is_none() {
            self.entries.remove(&(kind, id));
        } else {
            entry.deleted = true;
        }
        Ok(())
    }

    pub fn state(&self, kind: EntityKind, id: Uuid) -> Option<EntryState> {
        self.entries.get(&(kind, id)).map(Entry::state)
    }

    /// Names of the properties whose values differ from the persisted row.
    ///
    /// Every property is reported for an added row.
    pub fn changed_properties(&self, kind: EntityKind, id: Uuid) -> Vec<String> {
        let Some(entry) = self.entries.get(&(kind, id)) else {
            return Vec::new();
        };
        let Ok(serde_json::Value::Object(current)) = serde_json::to_value(&entry.entity) else {
            return Vec::new();
        };
        let original = match &entry.original {
            Some(o) => match serde_json::to_value(o) {
                Ok(serde_json::Value::Object(map)) => map,
                _ => return Vec::new(),
            },
            None => return current.keys().cloned().collect(),
        };
        current
            .iter()
            .filter(|(name, value)| original.get(*name) != Some(*value))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Tracked, non-deleted rows of one kind, in tracking order.
    pub fn entities(&self, kind: EntityKind) -> Vec<&Entity> {
        let mut rows: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|((k, _), e)| *k == kind && !e.deleted)
            .map(|(_, e)| e)
            .collect();
        rows.sort_by_key(|e| e.seq);
        rows.into_iter().map(|e| &e.entity).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Links ───────────────────────────────────────────────────────────────

    /// Stage a full replacement of the links of `owner_id` through `relation`.
    pub fn set_links(&mut self, relation: Relation, owner_id: Uuid, targets: Vec<Uuid>) {
        self.links.insert((relation, owner_id), targets);
    }

    /// Current links: the staged replacement if any, otherwise the persisted set.
    pub fn links(
        &self,
        conn: &Connection,
        relation: Relation,
        owner_id: Uuid,
    ) -> Result<Vec<Uuid>, OperationError> {
        match self.links.get(&(relation, owner_id)) {
            Some(targets) => Ok(targets.clone()),
            None => relation::linked_ids(conn, relation, owner_id),
        }
    }

    pub fn pending_links(&self, relation: Relation, owner_id: Uuid) -> Option<&[Uuid]> {
        self.links.get(&(relation, owner_id)).map(Vec::as_slice)
    }

    // ── Checkpoints ─────────────────────────────────────────────────────────

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            entries: self.entries.clone(),
            links: self.links.clone(),
            next_seq: self.next_seq,
        }
    }

    /// Discard everything tracked since `checkpoint` was taken.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.entries = checkpoint.entries;
        self.links = checkpoint.links;
        self.next_seq = checkpoint.next_seq;
    }

    // ── Flushing ────────────────────────────────────────────────────────────

    pub fn has_changes(&self) -> bool {
        !self.links.is_empty()
            || self
                .entries
                .values()
                .any(|e| e.state() != EntryState::Unchanged)
    }

    /// Write every pending change in one transaction.
    ///
    /// Inserts and updates run lookups first, then roots, then owned rows;
    /// link replacements follow; deletes run last in the reverse order. On
    /// success every tracked row becomes unchanged. On failure the
    /// transaction rolls back and the pending state is kept.
    pub fn save_changes(&mut self, conn: &Connection) -> Result<SaveSummary, OperationError> {
        let mut pending: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| e.state() != EntryState::Unchanged)
            .collect();
        pending.sort_by_key(|e| (e.entity.kind().flush_rank(), e.seq));

        let mut summary = SaveSummary::default();
        let tx = conn.unchecked_transaction()?;

        for entry in pending.iter().filter(|e| !e.deleted) {
            operations::save_entity(&tx, &entry.entity)?;
            match entry.state() {
                EntryState::Added => summary.inserted += 1,
                _ => summary.updated += 1,
            }
        }

        let mut links: Vec<_> = self.links.iter().collect();
        links.sort_by_key(|((relation, owner), _)| (*relation, *owner));
        for ((relation, owner_id), targets) in links {
            relation::replace_links(&tx, *relation, *owner_id, targets)?;
            summary.links_replaced += 1;
        }

        for entry in pending.iter().rev().filter(|e| e.deleted) {
            operations::delete_entity(&tx, entry.entity.kind(), entry.entity.id())?;
            summary.deleted += 1;
        }

        tx.commit()?;

        self.entries.retain(|_, e| !e.deleted);
        for entry in self.entries.values_mut() {
            entry.original = Some(entry.entity.clone());
        }
        self.links.clear();

        log::debug!(
            "Saved changes: {} inserted, {} updated, {} deleted, {} link sets",
            summary.inserted,
            summary.updated,
            summary.deleted,
            summary.links_replaced
        );
        Ok(summary)
    }
}
