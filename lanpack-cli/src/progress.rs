//! Progress bar driven by queue events.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use lanpack_sync::{QueueItem, SyncObserver};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

/// A [`SyncObserver`] that renders one bar for the whole queue.
///
/// The bar's length grows as items are queued. Per-item failures are printed
/// above the bar so they stay visible after it finishes.
pub(crate) struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    /// When `quiet` is true the bar is hidden.
    pub(crate) fn new(verb: &str, quiet: bool) -> Self {
        let bar = ProgressBar::with_draw_target(
            Some(0),
            if quiet {
                ProgressDrawTarget::hidden()
            } else {
                ProgressDrawTarget::stderr()
            },
        );
        if let Ok(style) =
            ProgressStyle::with_template("  {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(verb.to_string());
        Self { bar }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl SyncObserver for BarObserver {
    fn on_record_added(&self, _item: &QueueItem) {
        self.bar.inc_length(1);
    }

    fn on_record_processed(&self, item: &QueueItem, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
        self.bar.set_message(format!("{} {}", item.kind, item.name));
    }

    fn on_record_error(&self, item: &QueueItem, message: &str) {
        self.bar.inc(1);
        self.bar.println(format!(
            "  {} {} '{}': {}",
            "\u{2718}".if_supports_color(Stderr, |t| t.red()),
            item.kind,
            item.name,
            message
        ));
    }
}
