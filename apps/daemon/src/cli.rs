use clap::Parser;
use flowclip_input::{KeyBindings, Shortcut};
use std::path::PathBuf;

/// Default clipboard check interval in milliseconds.
pub const DEFAULT_POLL_MS: u64 = 500;

/// Copy several things, then paste them back one at a time.
#[derive(Parser, Debug, Clone)]
#[command(name = "flowclip", version, about)]
pub struct Cli {
    /// Database file for settings and history
    /// [default: <data dir>/flowclip/flowclip.db]
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// How often to check the clipboard for new content, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_POLL_MS)]
    pub poll_ms: u64,

    /// Enter queue mode immediately
    #[arg(long)]
    pub start_in_queue_mode: bool,

    /// Shortcut that clears the queue while in queue mode
    #[arg(long, value_name = "SHORTCUT", default_value = "opt+shift+delete")]
    pub clear_key: Shortcut,

    /// Turn off the clear-queue shortcut
    #[arg(long, conflicts_with = "clear_key")]
    pub no_clear_key: bool,

    /// Shortcut that pastes every queued item at once, e.g. "opt+shift+a"
    #[arg(long, value_name = "SHORTCUT")]
    pub paste_all_key: Option<Shortcut>,

    /// Shortcut that toggles one-item-per-line splitting
    #[arg(long, value_name = "SHORTCUT")]
    pub toggle_split_key: Option<Shortcut>,

    /// Shortcut that flips the paste order
    #[arg(long, value_name = "SHORTCUT")]
    pub toggle_order_key: Option<Shortcut>,
}

impl Cli {
    /// Interception shortcuts from the command line.
    pub fn key_bindings(&self) -> KeyBindings {
        KeyBindings {
            clear_queue: (!self.no_clear_key).then_some(self.clear_key),
            paste_all: self.paste_all_key,
            toggle_split: self.toggle_split_key,
            toggle_paste_order: self.toggle_order_key,
            ..KeyBindings::default()
        }
    }
}
