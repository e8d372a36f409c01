//! Queue configuration and the source it is read from.
//!
//! Settings are read at the moment of each decision, never cached, so a
//! change made in preferences applies to the very next paste.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Direction in which the next unconsumed item is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DequeueOrder {
    /// Oldest first.
    Fifo,
    /// Newest first.
    #[default]
    Lifo,
}

impl DequeueOrder {
    pub fn from_lifo_flag(lifo: bool) -> Self {
        if lifo {
            DequeueOrder::Lifo
        } else {
            DequeueOrder::Fifo
        }
    }

    pub fn is_lifo(self) -> bool {
        self == DequeueOrder::Lifo
    }

    pub fn toggled(self) -> Self {
        match self {
            DequeueOrder::Fifo => DequeueOrder::Lifo,
            DequeueOrder::Lifo => DequeueOrder::Fifo,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DequeueOrder::Fifo => "FIFO",
            DequeueOrder::Lifo => "LIFO",
        }
    }
}

impl std::fmt::Display for DequeueOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Text inserted between queued items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Separator {
    None,
    Space,
    Newline,
    Comma,
    /// User-defined; `\n`, `\t` and `\r` escapes are expanded.
    Custom(String),
}

/// Default text of the custom separator.
pub const DEFAULT_CUSTOM_SEPARATOR: &str = ", ";

impl Default for Separator {
    fn default() -> Self {
        Separator::Custom(DEFAULT_CUSTOM_SEPARATOR.to_string())
    }
}

impl Separator {
    /// Resolved separator text. `None` when nothing should be inserted,
    /// including a custom separator that expands to the empty string.
    pub fn text(&self) -> Option<String> {
        let text = match self {
            Separator::None => return None,
            Separator::Space => " ".to_string(),
            Separator::Newline => "\n".to_string(),
            Separator::Comma => ",".to_string(),
            Separator::Custom(raw) => expand_escapes(raw),
        };
        (!text.is_empty()).then_some(text)
    }

    /// Name stored in the `queueSeparator` setting.
    pub fn setting_name(&self) -> &'static str {
        match self {
            Separator::None => "none",
            Separator::Space => "space",
            Separator::Newline => "newline",
            Separator::Comma => "comma",
            Separator::Custom(_) => "custom",
        }
    }

    /// Rebuild from the stored `queueSeparator` name and custom text.
    pub fn from_setting(name: &str, custom: &str) -> Option<Self> {
        match name {
            "none" => Some(Separator::None),
            "space" => Some(Separator::Space),
            "newline" => Some(Separator::Newline),
            "comma" => Some(Separator::Comma),
            "custom" => Some(Separator::Custom(custom.to_string())),
            _ => None,
        }
    }
}

fn expand_escapes(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\r", "\r")
}

/// Snapshot of every setting the queue consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QueueSettings {
    /// Wrap around instead of failing once everything is consumed.
    pub cycle_on_exhaustion: bool,
    pub dequeue_order: DequeueOrder,
    pub separator: Separator,
    /// Split multi-line text into one queue item per line on capture.
    pub auto_split_text: bool,
}

/// Where queue settings come from.
///
/// Read-only from the queue's perspective apart from the toggles the queue
/// panel and its shortcuts expose.
pub trait SettingsSource: Send + Sync {
    /// Current settings. Implementations fall back to defaults rather than
    /// fail.
    fn queue_settings(&self) -> QueueSettings;

    fn set_dequeue_order(&self, order: DequeueOrder);

    fn set_cycle_on_exhaustion(&self, enabled: bool);

    fn set_auto_split_text(&self, enabled: bool);

    /// Flip FIFO/LIFO. Returns the new order.
    fn toggle_dequeue_order(&self) -> DequeueOrder {
        let order = self.queue_settings().dequeue_order.toggled();
        self.set_dequeue_order(order);
        order
    }

    /// Flip line splitting of captures. Returns the new state.
    fn toggle_auto_split_text(&self) -> bool {
        let enabled = !self.queue_settings().auto_split_text;
        self.set_auto_split_text(enabled);
        enabled
    }
}

/// Shared settings handle.
pub type SettingsRef = Arc<dyn SettingsSource>;

/// Settings held in memory only.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    settings: RwLock<QueueSettings>,
}

impl InMemorySettings {
    pub fn new(settings: QueueSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Replace the separator (not a panel toggle, so not on the trait).
    pub fn set_separator(&self, separator: Separator) {
        self.update(|s| s.separator = separator);
    }

    fn update(&self, f: impl FnOnce(&mut QueueSettings)) {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

impl SettingsSource for InMemorySettings {
    fn queue_settings(&self) -> QueueSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_dequeue_order(&self, order: DequeueOrder) {
        self.update(|s| s.dequeue_order = order);
    }

    fn set_cycle_on_exhaustion(&self, enabled: bool) {
        self.update(|s| s.cycle_on_exhaustion = enabled);
    }

    fn set_auto_split_text(&self, enabled: bool) {
        self.update(|s| s.auto_split_text = enabled);
    }
}
