//! Platform seams of the interception manager.

use crate::error::InputError;
use crate::gesture::{KeyEvent, Verdict};
use flowclip_queue::ClipContent;
use std::sync::Arc;

/// Writes the system clipboard and triggers pastes.
pub trait ClipboardPort: Send + Sync {
    /// Place `content` on the clipboard. `internal` marks writes made by
    /// flowclip itself so the capture path can tell them apart from user copies.
    fn copy(&self, content: &ClipContent, internal: bool) -> Result<(), InputError>;

    /// Paste the current clipboard into the focused application.
    fn paste(&self) -> Result<(), InputError>;
}

/// Reports the pasteboard's change count, which moves on every write.
pub trait ChangeCounter: Send + Sync {
    fn change_count(&self) -> Result<u64, InputError>;
}

/// Posts synthetic key gestures.
pub trait SyntheticInput: Send + Sync {
    fn post_copy_gesture(&self) -> Result<(), InputError>;
    fn post_paste_gesture(&self) -> Result<(), InputError>;
}

/// OS permission required to observe and swallow keystrokes.
pub trait PermissionGate: Send + Sync {
    fn is_granted(&self) -> bool;
    /// Ask the user for the permission. Never blocks on the answer.
    fn request(&self);
}

/// Audible cue for a paste with nothing left to paste.
pub trait FeedbackCue: Send + Sync {
    fn play_failure(&self);
}

/// Callback invoked by the hook for every key-down event.
pub type KeyHandler = Arc<dyn Fn(&KeyEvent) -> Verdict + Send + Sync>;

/// Installs a system-wide key-down hook.
pub trait KeyHook: Send + Sync {
    fn install(&self, handler: KeyHandler) -> Result<HookGuard, InputError>;
}

pub type ClipboardRef = Arc<dyn ClipboardPort>;
pub type ChangeCounterRef = Arc<dyn ChangeCounter>;
pub type SyntheticInputRef = Arc<dyn SyntheticInput>;
pub type PermissionRef = Arc<dyn PermissionGate>;
pub type FeedbackRef = Arc<dyn FeedbackCue>;
pub type KeyHookRef = Arc<dyn KeyHook>;

/// Keeps an installed hook alive. Dropping it removes the hook.
pub struct HookGuard {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl HookGuard {
    pub fn new(remove: impl FnOnce() + Send + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// Remove the hook now.
    pub fn remove(mut self) {
        self.run_remove();
    }

    fn run_remove(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        self.run_remove();
    }
}

impl std::fmt::Debug for HookGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookGuard")
            .field("installed", &self.remove.is_some())
            .finish()
    }
}

/// Hook for platforms without keystroke interception.
#[derive(Debug, Default)]
pub struct UnsupportedHook;

impl KeyHook for UnsupportedHook {
    fn install(&self, _handler: KeyHandler) -> Result<HookGuard, InputError> {
        Err(InputError::Unsupported)
    }
}

/// Cue that only logs.
#[derive(Debug, Default)]
pub struct LogCue;

impl FeedbackCue for LogCue {
    fn play_failure(&self) {
        tracing::info!("nothing left to paste");
    }
}
