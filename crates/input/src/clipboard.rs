//! System clipboard access via arboard.
//!
//! Captures are detected by the pasteboard change count rather than by
//! content, so copying the same text twice is two captures and our own
//! writes are recognised by the count they produced.

use crate::error::InputError;
use crate::ports::{ChangeCounter, ChangeCounterRef, ClipboardPort, SyntheticInputRef};
use flowclip_queue::{ClipContent, ImageContent};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How many of our own recent writes are remembered.
const MARKER_CAPACITY: usize = 8;

/// Change count of the system pasteboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct PasteboardCounter;

impl ChangeCounter for PasteboardCounter {
    fn change_count(&self) -> Result<u64, InputError> {
        #[cfg(target_os = "macos")]
        {
            crate::macos::pasteboard_change_count()
        }
        #[cfg(not(target_os = "macos"))]
        {
            Err(InputError::Unsupported)
        }
    }
}

/// Remembers the change counts of clipboard writes flowclip made itself.
///
/// The clipboard watcher consults this to flag a capture as synthetic so it
/// is not queued a second time.
#[derive(Debug, Clone, Default)]
pub struct SyntheticMarker {
    recent: Arc<Mutex<VecDeque<u64>>>,
}

impl SyntheticMarker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<u64>> {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(recent: &mut VecDeque<u64>, change_count: u64) {
        if recent.len() == MARKER_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(change_count);
    }

    /// Mark `change_count` as produced by one of our writes.
    pub fn record(&self, change_count: u64) {
        Self::push(&mut self.lock(), change_count);
    }

    /// Run `write` and mark the change count it leaves behind.
    ///
    /// The marker stays locked for the whole write, so a watcher that sees
    /// the new count waits until it has been recorded.
    pub fn record_write(
        &self,
        counter: &dyn ChangeCounter,
        write: impl FnOnce() -> Result<(), InputError>,
    ) -> Result<(), InputError> {
        let mut recent = self.lock();
        write()?;
        match counter.change_count() {
            Ok(count) => Self::push(&mut recent, count),
            Err(e) => tracing::debug!(error = %e, "write not marked, no change count"),
        }
        Ok(())
    }

    /// Whether the clipboard state at `change_count` is one of our writes.
    /// Everything up to that count is forgotten, it has been overwritten.
    pub fn take_if_synthetic(&self, change_count: u64) -> bool {
        let mut recent = self.lock();
        let found = recent.contains(&change_count);
        recent.retain(|&count| count > change_count);
        found
    }
}

/// Clipboard port over the system pasteboard.
pub struct ArboardClipboard {
    keystrokes: SyntheticInputRef,
    marker: SyntheticMarker,
    counter: ChangeCounterRef,
}

impl ArboardClipboard {
    pub fn new(
        keystrokes: SyntheticInputRef,
        marker: SyntheticMarker,
        counter: ChangeCounterRef,
    ) -> Self {
        Self {
            keystrokes,
            marker,
            counter,
        }
    }

    pub fn marker(&self) -> &SyntheticMarker {
        &self.marker
    }
}

fn write_clipboard(content: &ClipContent) -> Result<(), InputError> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| InputError::ClipboardFailed(format!("clipboard init failed: {e}")))?;

    let result = match content {
        ClipContent::Text(text) => clipboard.set_text(text.as_str()),
        ClipContent::Image(image) => clipboard.set_image(arboard::ImageData {
            width: image.width,
            height: image.height,
            bytes: Cow::Borrowed(&image.bytes[..]),
        }),
    };
    result.map_err(|e| InputError::ClipboardFailed(format!("clipboard set failed: {e}")))
}

impl ClipboardPort for ArboardClipboard {
    fn copy(&self, content: &ClipContent, internal: bool) -> Result<(), InputError> {
        if internal {
            self.marker
                .record_write(self.counter.as_ref(), || write_clipboard(content))
        } else {
            write_clipboard(content)
        }
    }

    fn paste(&self) -> Result<(), InputError> {
        self.keystrokes.post_paste_gesture()
    }
}

impl std::fmt::Debug for ArboardClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArboardClipboard").finish_non_exhaustive()
    }
}

/// Read the current clipboard. `Ok(None)` when it holds neither text nor an
/// image.
pub fn read_clipboard() -> Result<Option<ClipContent>, InputError> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| InputError::ClipboardFailed(format!("clipboard init failed: {e}")))?;

    if let Ok(text) = clipboard.get_text() {
        return Ok(Some(ClipContent::Text(text)));
    }

    match clipboard.get_image() {
        Ok(image) => Ok(Some(ClipContent::Image(ImageContent {
            width: image.width,
            height: image.height,
            bytes: Arc::from(image.bytes.into_owned()),
        }))),
        Err(arboard::Error::ContentNotAvailable) => Ok(None),
        Err(e) => Err(InputError::ClipboardFailed(format!(
            "clipboard read failed: {e}"
        ))),
    }
}
