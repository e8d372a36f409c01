//! Routing of clipboard captures.

use crate::mode::QueueMode;
use flowclip_queue::{expand_capture, ClipContent, SettingsRef, SharedQueueRef};
use flowclip_storage::{Database, HistoryEntry, HistoryRepository};
use std::sync::Arc;
use uuid::Uuid;

/// Receives captures that do not go to the queue.
pub trait HistorySink: Send + Sync {
    fn record(&self, content: &ClipContent);
}

pub type HistoryRef = Arc<dyn HistorySink>;

impl HistorySink for Database {
    fn record(&self, content: &ClipContent) {
        if let Err(e) = self.append_history(&HistoryEntry::from_content(content)) {
            tracing::warn!(error = %e, "failed to record history");
        }
    }
}

/// Drops history captures.
#[derive(Debug, Default)]
pub struct NullHistory;

impl HistorySink for NullHistory {
    fn record(&self, _content: &ClipContent) {}
}

/// Where a capture ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Queued(Vec<Uuid>),
    History,
}

/// Sends each capture to the queue while queue mode is on, to history
/// otherwise. Our own synthetic copies never enter the queue.
pub struct CaptureRouter {
    mode: Arc<QueueMode>,
    queue: SharedQueueRef,
    settings: SettingsRef,
    history: HistoryRef,
}

impl CaptureRouter {
    pub fn new(
        mode: Arc<QueueMode>,
        queue: SharedQueueRef,
        settings: SettingsRef,
        history: HistoryRef,
    ) -> Self {
        Self {
            mode,
            queue,
            settings,
            history,
        }
    }

    pub fn on_captured(&self, content: Arc<ClipContent>, is_synthetic: bool) -> Routed {
        if !self.mode.is_active() || is_synthetic {
            tracing::trace!(is_synthetic, "capture routed to history");
            self.history.record(&content);
            return Routed::History;
        }

        let auto_split = self.settings.queue_settings().auto_split_text;
        let ids = self.queue.add_all(expand_capture(content, auto_split));
        tracing::debug!(count = ids.len(), "capture queued");
        Routed::Queued(ids)
    }
}

impl std::fmt::Debug for CaptureRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureRouter")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
