//! Queue items and the per-run error map.

use std::collections::{BTreeMap, HashSet};

use lanpack_model::{DescriptorInfo, RecordKind};
use serde::Serialize;
use uuid::Uuid;

/// Which sub-records a caller wants queued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(HashSet<Uuid>),
}

impl Selection {
    pub fn only(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self::Only(ids.into_iter().collect())
    }

    pub fn includes(&self, id: Uuid) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&id),
        }
    }
}

/// One unit of export or import work for exactly one sub-record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub kind: RecordKind,
    pub name: String,
    pub processed: bool,
}

impl QueueItem {
    pub fn new(info: &DescriptorInfo) -> Self {
        Self {
            id: info.id,
            kind: info.kind,
            name: info.name.clone(),
            processed: false,
        }
    }

    /// Key into the error map. Kind is part of the key because one company
    /// can be queued as both developer and publisher.
    pub fn key(&self) -> (RecordKind, Uuid) {
        (self.kind, self.id)
    }
}

/// A failed item and its message, as reported in run summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub item: QueueItem,
    pub message: String,
}

/// Ordered queue plus the error map. An item is either processed, errored,
/// or still pending; never both processed and errored.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Vec<QueueItem>,
    errors: BTreeMap<(RecordKind, Uuid), String>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an item. Returns `false` (and queues nothing) for a duplicate key.
    pub fn push(&mut self, item: QueueItem) -> bool {
        if self.items.iter().any(|i| i.key() == item.key()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn mark_processed(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            self.errors.remove(&item.key());
            item.processed = true;
        }
    }

    pub fn record_error(&mut self, index: usize, message: impl Into<String>) {
        if let Some(item) = self.items.get_mut(index) {
            item.processed = false;
            self.errors.insert(item.key(), message.into());
        }
    }

    /// Error message for an item, if it failed.
    pub fn error(&self, kind: RecordKind, id: Uuid) -> Option<&str> {
        self.errors.get(&(kind, id)).map(String::as_str)
    }

    /// Failed items with their messages, in queue order.
    pub fn errors(&self) -> Vec<(&QueueItem, &str)> {
        self.items
            .iter()
            .filter_map(|item| self.errors.get(&item.key()).map(|m| (item, m.as_str())))
            .collect()
    }

    /// Owned copies of [`WorkQueue::errors`].
    pub fn item_errors(&self) -> Vec<ItemError> {
        self.errors()
            .into_iter()
            .map(|(item, message)| ItemError {
                item: item.clone(),
                message: message.to_string(),
            })
            .collect()
    }

    pub fn processed_count(&self) -> usize {
        self.items.iter().filter(|i| i.processed).count()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
