//! Process-wide queue handle.
//!
//! Every mutation goes through one lock and publishes a
//! [`QueueChangedEvent`] snapshot after the lock is released, so readers on
//! other threads never hold the queue while they render.

use crate::content::ClipContent;
use crate::settings::{DequeueOrder, QueueSettings, Separator};
use crate::store::QueueStore;
use flowclip_events::{event_names, publish, EventBusRef, QueueChangedEvent, QueueItemView};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Shared handle to the queue.
pub type SharedQueueRef = Arc<SharedQueue>;

pub struct SharedQueue {
    store: Mutex<QueueStore>,
    bus: EventBusRef,
}

impl SharedQueue {
    pub fn new(bus: EventBusRef) -> Self {
        Self {
            store: Mutex::new(QueueStore::new()),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the lock, then publish the resulting snapshot if `f`
    /// reports a change.
    fn mutate<T>(&self, f: impl FnOnce(&mut QueueStore) -> (T, bool)) -> T {
        let (result, snapshot) = {
            let mut store = self.lock();
            let (result, changed) = f(&mut *store);
            (result, changed.then(|| store.views()))
        };

        if let Some(items) = snapshot {
            publish(
                self.bus.as_ref(),
                event_names::QUEUE_CHANGED,
                &QueueChangedEvent { items },
            );
        }
        result
    }

    pub fn add(&self, content: Arc<ClipContent>) -> Uuid {
        let id = self.mutate(|store| (store.add(content), true));
        tracing::debug!(%id, "queued item");
        id
    }

    /// Append several payloads with a single change notification.
    pub fn add_all(&self, contents: Vec<Arc<ClipContent>>) -> Vec<Uuid> {
        if contents.is_empty() {
            return Vec::new();
        }
        let ids = self.mutate(|store| {
            let ids: Vec<Uuid> = contents.into_iter().map(|c| store.add(c)).collect();
            (ids, true)
        });
        tracing::debug!(count = ids.len(), "queued items");
        ids
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.mutate(|store| {
            let removed = store.remove(id);
            (removed, removed)
        })
    }

    pub fn clear(&self) {
        self.mutate(|store| {
            let had_items = !store.is_empty();
            store.clear();
            ((), had_items)
        });
    }

    pub fn next_to_paste(&self, settings: &QueueSettings) -> Option<Arc<ClipContent>> {
        self.mutate(|store| {
            let next = store.next_to_paste(settings);
            let changed = next.is_some();
            (next, changed)
        })
    }

    pub fn mark_consumed(&self, id: Uuid) -> Option<Arc<ClipContent>> {
        self.mutate(|store| {
            let content = store.mark_consumed(id);
            let changed = content.is_some();
            (content, changed)
        })
    }

    pub fn all_text(&self, order: DequeueOrder, separator: &Separator) -> String {
        self.lock().all_text(order, separator)
    }

    /// Current rows for display.
    pub fn snapshot(&self) -> Vec<QueueItemView> {
        self.lock().views()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl std::fmt::Debug for SharedQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
