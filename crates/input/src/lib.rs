//! Paste interception for flowclip.
//!
//! While queue mode is on, a system-wide hook watches key-down events. A
//! paste gesture is swallowed and replaced by the next queued item, and our
//! own synthetic paste is recognised on its way back and let through.
//!
//! - `gesture.rs`   - pure classification of key events
//! - `layout.rs`    - which virtual key types which character
//! - `manager.rs`   - `InterceptionManager`, the hook handler and follow-ups
//! - `scheduler.rs` - serial deferred execution (real and manual clock)
//! - `ports.rs`     - traits for the clipboard, keystrokes, permission, hook
//! - `fakes.rs`     - in-memory port implementations
//!
//! Platform pieces: `clipboard.rs` (arboard), `keystrokes.rs` (enigo) and,
//! on macOS, `event_tap.rs` plus `macos.rs`.
//!
//! # Example
//!
//! ```ignore
//! use flowclip_input::{InterceptionConfig, InterceptionManager};
//!
//! let manager = InterceptionManager::new(queue, settings, bus, ports, InterceptionConfig::default());
//! manager.start_monitoring()?;
//! ```

mod clipboard;
mod error;
mod gesture;
mod keystrokes;
mod layout;
mod manager;
mod ports;
mod scheduler;

pub mod fakes;

#[cfg(target_os = "macos")]
mod event_tap;
#[cfg(target_os = "macos")]
mod macos;

use std::sync::Arc;

pub use clipboard::{read_clipboard, ArboardClipboard, PasteboardCounter, SyntheticMarker};
pub use error::InputError;
pub use gesture::{
    classify, Chord, Decision, Gesture, HookState, Key, KeyBindings, KeyEvent, Modifiers,
    QueueCommand, ResolvedBindings, Shortcut, ShortcutError, Verdict, KEY_CODE_C,
    KEY_CODE_DELETE, KEY_CODE_V,
};
pub use keystrokes::EnigoKeystrokes;
pub use layout::{AnsiLayout, KeyLayout, KeyLayoutRef, TableLayout};
pub use manager::{
    InterceptionConfig, InterceptionManager, InterceptionPorts, Timings, COPY_RETARGET_DELAY,
    FOCUS_TRANSFER_DELAY, PASTE_SETTLE_DELAY, SEPARATOR_DELAY,
};
pub use ports::{
    ChangeCounter, ChangeCounterRef, ClipboardPort, ClipboardRef, FeedbackCue, FeedbackRef, HookGuard, KeyHandler, KeyHook,
    KeyHookRef, LogCue, PermissionGate, PermissionRef, SyntheticInput, SyntheticInputRef,
    UnsupportedHook,
};
pub use scheduler::{ManualScheduler, Scheduler, SchedulerRef, SerialScheduler, Task};

#[cfg(target_os = "macos")]
pub use event_tap::EventTapHook;
#[cfg(target_os = "macos")]
pub use layout::SystemLayout;
#[cfg(target_os = "macos")]
pub use macos::{SystemSoundCue, FAILURE_SOUND};

/// Check if the application has accessibility permissions.
///
/// On macOS, intercepting and simulating input requires Accessibility
/// permission. On other platforms, always returns `true`.
pub fn has_accessibility_access() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::has_accessibility_access()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

/// Prompt the user to grant accessibility permissions.
///
/// On macOS, this opens the System Settings to the Accessibility pane.
/// On other platforms, this is a no-op.
pub fn prompt_accessibility_access() {
    #[cfg(target_os = "macos")]
    {
        macos::prompt_accessibility_access();
    }
}

/// Check if accessibility is granted, prompting if not.
///
/// Even after prompting, this returns `false` until the user actually
/// grants permission.
pub fn ensure_accessibility_access() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::ensure_accessibility_access()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

/// Permission gate over the process accessibility trust.
#[derive(Debug, Default)]
pub struct AccessibilityGate;

impl PermissionGate for AccessibilityGate {
    fn is_granted(&self) -> bool {
        has_accessibility_access()
    }

    fn request(&self) {
        ensure_accessibility_access();
    }
}

/// The key hook for this platform.
pub fn platform_hook() -> KeyHookRef {
    #[cfg(target_os = "macos")]
    {
        Arc::new(EventTapHook::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(UnsupportedHook)
    }
}

/// The keyboard layout shortcuts are resolved against.
pub fn platform_layout() -> KeyLayoutRef {
    #[cfg(target_os = "macos")]
    {
        Arc::new(SystemLayout)
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(AnsiLayout)
    }
}

/// The failure cue for this platform.
pub fn platform_feedback() -> FeedbackRef {
    #[cfg(target_os = "macos")]
    {
        Arc::new(SystemSoundCue::default())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(LogCue)
    }
}
