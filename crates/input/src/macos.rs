//! macOS permission checks, pasteboard change count and system sounds.

use crate::error::InputError;
use crate::ports::FeedbackCue;
use objc::runtime::{Class, Object};
use objc::{msg_send, sel, sel_impl};
use std::process::Command;

/// System sound played when a paste finds nothing left in the queue.
pub const FAILURE_SOUND: &str = "/System/Library/Sounds/Morse.aiff";

/// Check if the application has accessibility permissions on macOS.
///
/// Both observing keystrokes through an event tap and posting synthetic
/// ones need the process to be trusted.
pub fn has_accessibility_access() -> bool {
    unsafe {
        extern "C" {
            fn AXIsProcessTrusted() -> bool;
        }
        AXIsProcessTrusted()
    }
}

/// Open System Settings on the Accessibility pane.
///
/// The user must manually add the app to the allowed list.
pub fn prompt_accessibility_access() {
    let _ = Command::new("open")
        .arg("x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility")
        .spawn();
}

/// Check if accessibility is granted, prompting if not.
pub fn ensure_accessibility_access() -> bool {
    if has_accessibility_access() {
        return true;
    }

    tracing::warn!("Accessibility permission not granted. Opening System Settings...");
    prompt_accessibility_access();
    false
}

/// `[[NSPasteboard generalPasteboard] changeCount]`.
pub fn pasteboard_change_count() -> Result<u64, InputError> {
    unsafe {
        let pasteboard_class = Class::get("NSPasteboard")
            .ok_or_else(|| InputError::ClipboardFailed("NSPasteboard unavailable".to_string()))?;
        let pasteboard: *mut Object = msg_send![pasteboard_class, generalPasteboard];
        if pasteboard.is_null() {
            return Err(InputError::ClipboardFailed(
                "failed to get NSPasteboard".to_string(),
            ));
        }
        let count: isize = msg_send![pasteboard, changeCount];
        Ok(count as u64)
    }
}

/// Plays a system sound through `afplay` on a short-lived thread.
#[derive(Debug, Clone)]
pub struct SystemSoundCue {
    sound: String,
}

impl SystemSoundCue {
    pub fn new(sound: impl Into<String>) -> Self {
        Self {
            sound: sound.into(),
        }
    }
}

impl Default for SystemSoundCue {
    fn default() -> Self {
        Self::new(FAILURE_SOUND)
    }
}

impl FeedbackCue for SystemSoundCue {
    fn play_failure(&self) {
        let sound = self.sound.clone();
        std::thread::spawn(move || {
            if let Err(e) = Command::new("afplay").arg(&sound).status() {
                tracing::debug!(error = %e, %sound, "could not play sound");
            }
        });
    }
}
