//! Clipboard queue for flowclip.
//!
//! While queue mode is on, copies accumulate here in arrival order and each
//! paste gesture consumes one item instead of re-pasting the last copy.
//!
//! - `store.rs`    - `QueueStore`, the pure ordered queue and its dequeue rule
//! - `shared.rs`   - `SharedQueue`, the locked handle that publishes snapshots
//! - `settings.rs` - separator, order and cycle configuration
//! - `split.rs`    - one-item-per-line expansion of multi-line captures
//!
//! # Example
//!
//! ```ignore
//! use flowclip_queue::{ClipContent, QueueSettings, QueueStore};
//! use std::sync::Arc;
//!
//! let mut store = QueueStore::new();
//! store.add(Arc::new(ClipContent::text("first")));
//! let next = store.next_to_paste(&QueueSettings::default());
//! ```

mod content;
mod settings;
mod shared;
mod split;
mod store;

pub use content::{ClipContent, ImageContent, PREVIEW_MAX_CHARS};
pub use settings::{
    DequeueOrder, InMemorySettings, QueueSettings, Separator, SettingsRef, SettingsSource,
    DEFAULT_CUSTOM_SEPARATOR,
};
pub use shared::{SharedQueue, SharedQueueRef};
pub use split::{expand_capture, split_lines};
pub use store::{QueueItem, QueueStore};
