//! Queue progress reporting.

use crate::queue::QueueItem;

/// Receives queue events from the export and import drivers.
///
/// Calls are fire-and-forget: the drivers never inspect a result, and an
/// observer must not panic.
pub trait SyncObserver {
    /// Called when an item is queued.
    fn on_record_added(&self, item: &QueueItem);

    /// Called after an item is exported or imported successfully.
    fn on_record_processed(&self, item: &QueueItem, current: usize, total: usize);

    /// Called when an item fails. The queue continues with the next item.
    fn on_record_error(&self, item: &QueueItem, message: &str);
}

/// An observer that discards all events.
pub struct SilentObserver;

impl SyncObserver for SilentObserver {
    fn on_record_added(&self, _item: &QueueItem) {}
    fn on_record_processed(&self, _item: &QueueItem, _current: usize, _total: usize) {}
    fn on_record_error(&self, _item: &QueueItem, _message: &str) {}
}

/// An observer that logs to the `log` crate.
pub struct LogObserver;

impl SyncObserver for LogObserver {
    fn on_record_added(&self, item: &QueueItem) {
        log::debug!("Queued {} '{}'", item.kind, item.name);
    }

    fn on_record_processed(&self, item: &QueueItem, current: usize, total: usize) {
        log::info!("  [{}/{}] {} '{}'", current, total, item.kind, item.name);
    }

    fn on_record_error(&self, item: &QueueItem, message: &str) {
        log::warn!("  {} '{}' failed: {}", item.kind, item.name, message);
    }
}
