//! Progress reporting for batch runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::item::{ItemId, ItemStatus, WorkItem};

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub complete: usize,
    pub errored: usize,
    pub cancelled: usize,
}

impl Progress {
    pub fn from_items(items: &[WorkItem]) -> Self {
        let mut progress = Progress {
            total: items.len(),
            ..Progress::default()
        };
        for item in items {
            match item.status() {
                ItemStatus::Pending => progress.pending += 1,
                ItemStatus::Identifying | ItemStatus::Searching => progress.in_flight += 1,
                ItemStatus::Complete => progress.complete += 1,
                ItemStatus::Errored => progress.errored += 1,
                ItemStatus::Cancelled => progress.cancelled += 1,
            }
        }
        progress
    }

    /// Items in any terminal status.
    pub fn finished(&self) -> usize {
        self.complete + self.errored + self.cancelled
    }

    pub fn is_done(&self) -> bool {
        self.total > 0 && self.finished() == self.total
    }

    /// Share of items that reached a terminal status, in `0.0..=1.0`.
    pub fn fraction_finished(&self) -> f64 {
        ratio(self.finished(), self.total)
    }

    /// Share of items that completed successfully, in `0.0..=1.0`.
    pub fn fraction_complete(&self) -> f64 {
        ratio(self.complete, self.total)
    }

    /// `fraction_finished` as a rounded percentage.
    pub fn percent_finished(&self) -> u8 {
        (self.fraction_finished() * 100.0).round() as u8
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Emitted after every status change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEvent {
    pub item_id: ItemId,
    pub file_name: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Batch-wide counts right after this change.
    pub progress: Progress,
}

impl ItemEvent {
    pub fn new(item: &WorkItem, progress: Progress) -> Self {
        Self {
            item_id: item.id,
            file_name: item.file_name().to_string(),
            status: item.status(),
            message: item.message().map(str::to_string),
            timestamp: Utc::now(),
            progress,
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ItemEvent);
}

/// Discards events.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ItemEvent) {}
}

/// Fans events out over a broadcast channel.
#[derive(Clone)]
pub struct BroadcastProgress {
    sender: Arc<broadcast::Sender<ItemEvent>>,
}

impl BroadcastProgress {
    /// A zero `capacity` is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastProgress {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ItemEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}
