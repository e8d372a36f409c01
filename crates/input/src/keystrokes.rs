//! Synthetic copy/paste gestures via enigo.

use crate::error::InputError;
use crate::ports::SyntheticInput;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::thread;
use std::time::Duration;

/// Time the modifier is held before the letter key is sent.
const MODIFIER_SETTLE: Duration = Duration::from_millis(10);

/// Posts Cmd+C / Cmd+V (Ctrl elsewhere) to the focused application.
///
/// A fresh `Enigo` is created per gesture, so the type is cheap to share
/// across threads.
#[derive(Debug, Default)]
pub struct EnigoKeystrokes;

impl EnigoKeystrokes {
    pub fn new() -> Self {
        Self
    }

    fn chord(&self, letter: char) -> Result<(), InputError> {
        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| InputError::KeyFailed(e.to_string()))?;

        // Use Meta (Cmd) on macOS, Control on other platforms
        #[cfg(target_os = "macos")]
        let modifier = Key::Meta;
        #[cfg(not(target_os = "macos"))]
        let modifier = Key::Control;

        enigo
            .key(modifier, Direction::Press)
            .map_err(|e| InputError::KeyFailed(e.to_string()))?;

        thread::sleep(MODIFIER_SETTLE);

        let clicked = enigo
            .key(Key::Unicode(letter), Direction::Click)
            .map_err(|e| InputError::KeyFailed(e.to_string()));

        // Always release the modifier, even if the letter failed
        let released = enigo
            .key(modifier, Direction::Release)
            .map_err(|e| InputError::KeyFailed(e.to_string()));

        clicked.and(released)
    }
}

impl SyntheticInput for EnigoKeystrokes {
    fn post_copy_gesture(&self) -> Result<(), InputError> {
        tracing::trace!("posting copy gesture");
        self.chord('c')
    }

    fn post_paste_gesture(&self) -> Result<(), InputError> {
        tracing::trace!("posting paste gesture");
        self.chord('v')
    }
}
