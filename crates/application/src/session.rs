//! Queue mode and the commands the queue panel exposes.

use crate::mode::QueueMode;
use crate::router::{CaptureRouter, HistoryRef};
use flowclip_events::{event_names, publish, EventBusRef, QueueItemView, QueueModeChangedEvent};
use flowclip_input::{InputError, InterceptionManager, PermissionRef};
use flowclip_queue::{DequeueOrder, SettingsRef, SharedQueueRef};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("paste interception unavailable: {0}")]
    Interception(#[from] InputError),
}

/// Process-wide queue session.
///
/// Entering queue mode arms the paste hook and diverts captures into the
/// queue. Leaving it disarms the hook but keeps the queue's contents.
pub struct QueueSession {
    mode: Arc<QueueMode>,
    queue: SharedQueueRef,
    settings: SettingsRef,
    bus: EventBusRef,
    manager: InterceptionManager,
    permission: PermissionRef,
}

impl QueueSession {
    pub fn new(
        queue: SharedQueueRef,
        settings: SettingsRef,
        bus: EventBusRef,
        manager: InterceptionManager,
        permission: PermissionRef,
    ) -> Self {
        Self {
            mode: Arc::new(QueueMode::default()),
            queue,
            settings,
            bus,
            manager,
            permission,
        }
    }

    /// A router that follows this session's mode.
    pub fn capture_router(&self, history: HistoryRef) -> CaptureRouter {
        CaptureRouter::new(
            Arc::clone(&self.mode),
            Arc::clone(&self.queue),
            Arc::clone(&self.settings),
            history,
        )
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_active()
    }

    pub fn is_intercepting(&self) -> bool {
        self.manager.is_monitoring()
    }

    /// Flip queue mode. Returns the new state.
    pub fn toggle_queue_mode(&self) -> Result<bool, SessionError> {
        let active = !self.is_active();
        self.set_active(active)?;
        Ok(active)
    }

    /// Enter or leave queue mode.
    ///
    /// If the hook cannot be armed the mode still turns on, so copies keep
    /// queueing, and the error is returned. A missing permission is
    /// requested from the user.
    pub fn set_active(&self, active: bool) -> Result<(), SessionError> {
        self.mode.set(active);

        let result = if active {
            self.manager.start_monitoring().map_err(|e| {
                if matches!(e, InputError::AccessibilityNotGranted) {
                    self.permission.request();
                }
                SessionError::from(e)
            })
        } else {
            self.manager.stop_monitoring();
            Ok(())
        };

        tracing::info!(
            active,
            intercepting = self.is_intercepting(),
            "queue mode changed"
        );
        publish(
            self.bus.as_ref(),
            event_names::QUEUE_MODE_CHANGED,
            &QueueModeChangedEvent {
                active,
                intercepting: self.is_intercepting(),
            },
        );
        result
    }

    pub fn clear_queue(&self) {
        self.queue.clear();
        tracing::debug!("queue cleared");
    }

    pub fn paste_all(&self) {
        self.manager.paste_all();
    }

    /// Remove one item. Unknown ids are ignored.
    pub fn remove_item(&self, id: Uuid) -> bool {
        let removed = self.queue.remove(id);
        if !removed {
            tracing::debug!(%id, "no queued item to remove");
        }
        removed
    }

    pub fn paste_item(&self, id: Uuid) {
        self.manager.paste_item(id);
    }

    /// Flip FIFO/LIFO. Takes effect at the next paste.
    pub fn toggle_paste_order(&self) -> DequeueOrder {
        let order = self.settings.toggle_dequeue_order();
        tracing::debug!(?order, "paste order changed");
        order
    }

    /// Flip one-item-per-line splitting of captures. Returns the new state.
    pub fn toggle_auto_split(&self) -> bool {
        let enabled = self.settings.toggle_auto_split_text();
        tracing::debug!(enabled, "auto split changed");
        enabled
    }

    pub fn set_cycle(&self, enabled: bool) {
        self.settings.set_cycle_on_exhaustion(enabled);
        tracing::debug!(enabled, "cycle on exhaustion changed");
    }

    pub fn snapshot(&self) -> Vec<QueueItemView> {
        self.queue.snapshot()
    }
}

impl std::fmt::Debug for QueueSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueSession")
            .field("active", &self.is_active())
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}
