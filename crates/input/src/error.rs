//! Error types for gesture interception and synthetic input.

use thiserror::Error;

/// Errors that can occur while intercepting or emitting input.
#[derive(Debug, Error)]
pub enum InputError {
    /// Accessibility / input monitoring permission not granted (macOS).
    #[error("accessibility permission not granted - open System Settings > Privacy & Security > Accessibility")]
    AccessibilityNotGranted,

    /// The OS refused to install the keystroke hook.
    #[error("failed to install keystroke hook: {0}")]
    HookFailed(String),

    /// No keystroke hook exists for this platform.
    #[error("keystroke interception is not supported on this platform")]
    Unsupported,

    /// Reading or writing the system clipboard failed.
    #[error("clipboard operation failed: {0}")]
    ClipboardFailed(String),

    /// Failed to simulate a key press.
    #[error("failed to simulate key: {0}")]
    KeyFailed(String),

    /// The scheduler thread could not be started.
    #[error("failed to start scheduler: {0}")]
    SchedulerFailed(String),
}
