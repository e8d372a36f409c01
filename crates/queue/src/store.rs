//! The queue itself: ordered items with consumed flags.
//!
//! Pure data structure, no locking and no I/O. [`crate::SharedQueue`] wraps
//! it for concurrent use.

use crate::content::ClipContent;
use crate::settings::{DequeueOrder, QueueSettings, Separator};
use flowclip_events::QueueItemView;
use std::sync::Arc;
use uuid::Uuid;

/// One captured payload waiting in the queue.
///
/// Only `consumed` changes after creation.
#[derive(Debug, Clone)]
pub struct QueueItem {
    id: Uuid,
    content: Arc<ClipContent>,
    consumed: bool,
}

impl QueueItem {
    fn new(content: Arc<ClipContent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            consumed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &Arc<ClipContent> {
        &self.content
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn view(&self) -> QueueItemView {
        QueueItemView {
            id: self.id,
            preview: self.content.preview(),
            consumed: self.consumed,
        }
    }
}

/// Items in arrival order.
#[derive(Debug, Default)]
pub struct QueueStore {
    items: Vec<QueueItem>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unconsumed item at the tail.
    pub fn add(&mut self, content: Arc<ClipContent>) -> Uuid {
        let item = QueueItem::new(content);
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Delete the item with `id`. Returns whether anything was removed;
    /// unknown ids are not an error.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Pick the next item to paste and mark it consumed.
    ///
    /// Scans from the head (FIFO) or tail (LIFO) for the first unconsumed
    /// item. With cycling on, consuming the last unconsumed item resets every
    /// flag straight away so the wrap is visible before the next paste; the
    /// returned content is the item just consumed. If everything was already
    /// consumed and cycling is on, the flags are reset and the boundary item
    /// (head for FIFO, tail for LIFO) is consumed and returned.
    pub fn next_to_paste(&mut self, settings: &QueueSettings) -> Option<Arc<ClipContent>> {
        let order = settings.dequeue_order;
        let cycle = settings.cycle_on_exhaustion;

        let position = match order {
            DequeueOrder::Fifo => self.items.iter().position(|item| !item.consumed),
            DequeueOrder::Lifo => self.items.iter().rposition(|item| !item.consumed),
        };

        if let Some(index) = position {
            self.items[index].consumed = true;
            let content = Arc::clone(&self.items[index].content);

            if cycle && self.items.iter().all(|item| item.consumed) {
                self.reset_consumed();
            }

            return Some(content);
        }

        if cycle && !self.items.is_empty() {
            self.reset_consumed();
            let boundary = match order {
                DequeueOrder::Fifo => 0,
                DequeueOrder::Lifo => self.items.len() - 1,
            };
            self.items[boundary].consumed = true;
            return Some(Arc::clone(&self.items[boundary].content));
        }

        None
    }

    /// Mark one item consumed because it was pasted directly.
    pub fn mark_consumed(&mut self, id: Uuid) -> Option<Arc<ClipContent>> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        item.consumed = true;
        Some(Arc::clone(&item.content))
    }

    /// Join the textual form of every item, each followed by the separator
    /// (so the result ends with one). Items without text are skipped.
    pub fn all_text(&self, order: DequeueOrder, separator: &Separator) -> String {
        let separator = separator.text().unwrap_or_default();
        let texts = self.items.iter().filter_map(|item| item.content.as_text());

        let ordered: Vec<&str> = match order {
            DequeueOrder::Fifo => texts.collect(),
            DequeueOrder::Lifo => texts.rev().collect(),
        };

        let mut joined = String::new();
        for text in ordered {
            joined.push_str(text);
            joined.push_str(&separator);
        }
        joined
    }

    fn reset_consumed(&mut self) {
        for item in &mut self.items {
            item.consumed = false;
        }
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&QueueItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn views(&self) -> Vec<QueueItemView> {
        self.items.iter().map(QueueItem::view).collect()
    }
}
