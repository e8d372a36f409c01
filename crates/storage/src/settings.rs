//! Key/value settings with JSON-encoded values.

use crate::{Database, Result, StorageError};
use flowclip_queue::{DequeueOrder, QueueSettings, Separator, SettingsSource};
use rusqlite::OptionalExtension;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Setting keys, shared with the preferences of earlier releases.
pub mod keys {
    pub const QUEUE_CYCLE_PASTE: &str = "queueCyclePaste";
    pub const QUEUE_PASTE_LIFO: &str = "queuePasteLifo";
    pub const QUEUE_SEPARATOR: &str = "queueSeparator";
    pub const CUSTOM_QUEUE_SEPARATOR: &str = "customQueueSeparator";
    pub const QUEUE_AUTO_SPLIT_TEXT: &str = "queueAutoSplitText";
}

impl Database {
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn set_setting<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            (key, json),
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        let conn = self.conn();
        let affected = conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("setting {key}")));
        }
        Ok(())
    }

    /// Read the queue settings, using the default for every key not stored.
    pub fn load_queue_settings(&self) -> Result<QueueSettings> {
        let defaults = QueueSettings::default();

        let cycle_on_exhaustion = self
            .get_setting(keys::QUEUE_CYCLE_PASTE)?
            .unwrap_or(defaults.cycle_on_exhaustion);
        let dequeue_order = self
            .get_setting::<bool>(keys::QUEUE_PASTE_LIFO)?
            .map(DequeueOrder::from_lifo_flag)
            .unwrap_or(defaults.dequeue_order);
        let auto_split_text = self
            .get_setting(keys::QUEUE_AUTO_SPLIT_TEXT)?
            .unwrap_or(defaults.auto_split_text);

        let separator = match self.get_setting::<String>(keys::QUEUE_SEPARATOR)? {
            Some(name) => {
                let custom = self
                    .get_setting::<String>(keys::CUSTOM_QUEUE_SEPARATOR)?
                    .unwrap_or_else(|| flowclip_queue::DEFAULT_CUSTOM_SEPARATOR.to_string());
                Separator::from_setting(&name, &custom).unwrap_or_else(|| {
                    tracing::warn!(%name, "unknown separator setting, using default");
                    defaults.separator.clone()
                })
            }
            None => defaults.separator.clone(),
        };

        Ok(QueueSettings {
            cycle_on_exhaustion,
            dequeue_order,
            separator,
            auto_split_text,
        })
    }

    pub fn save_separator(&self, separator: &Separator) -> Result<()> {
        self.set_setting(keys::QUEUE_SEPARATOR, separator.setting_name())?;
        if let Separator::Custom(raw) = separator {
            self.set_setting(keys::CUSTOM_QUEUE_SEPARATOR, raw)?;
        }
        Ok(())
    }

    fn store_or_warn<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.set_setting(key, value) {
            tracing::warn!(key, error = %e, "failed to persist setting");
        }
    }
}

impl SettingsSource for Database {
    fn queue_settings(&self) -> QueueSettings {
        self.load_queue_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read queue settings, using defaults");
            QueueSettings::default()
        })
    }

    fn set_dequeue_order(&self, order: DequeueOrder) {
        self.store_or_warn(keys::QUEUE_PASTE_LIFO, &order.is_lifo());
    }

    fn set_cycle_on_exhaustion(&self, enabled: bool) {
        self.store_or_warn(keys::QUEUE_CYCLE_PASTE, &enabled);
    }

    fn set_auto_split_text(&self, enabled: bool) {
        self.store_or_warn(keys::QUEUE_AUTO_SPLIT_TEXT, &enabled);
    }
}
