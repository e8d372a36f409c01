//! Clipboard watcher - background thread that notices new clipboard content.
//!
//! Changes are detected by the pasteboard change count, the way macOS
//! clipboard managers poll for them. Identical content copied twice is two
//! changes.

use flowclip_input::{
    read_clipboard, ChangeCounter, InputError, PasteboardCounter, SyntheticMarker,
};
use flowclip_queue::ClipContent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Reads the current clipboard and its change count.
pub trait ClipboardReader: ChangeCounter {
    fn read(&self) -> Result<Option<ClipContent>, InputError>;
}

/// Reader over the system clipboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ChangeCounter for SystemClipboard {
    fn change_count(&self) -> Result<u64, InputError> {
        PasteboardCounter.change_count()
    }
}

impl ClipboardReader for SystemClipboard {
    fn read(&self) -> Result<Option<ClipContent>, InputError> {
        read_clipboard()
    }
}

/// Called with each new payload and whether flowclip wrote it itself.
pub type CaptureCallback = Arc<dyn Fn(Arc<ClipContent>, bool) + Send + Sync + 'static>;

/// Polls the clipboard and reports changes.
///
/// Whatever is on the clipboard at start-up is taken as the baseline and
/// not reported. Without a change count (off macOS) nothing is watched.
pub struct ClipboardWatcher {
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl Default for ClipboardWatcher {
    fn default() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl ClipboardWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        reader: Arc<dyn ClipboardReader>,
        marker: SyntheticMarker,
        callback: CaptureCallback,
        interval: Duration,
    ) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("ClipboardWatcher already running");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        let handle = std::thread::spawn(move || {
            let mut last = match reader.change_count() {
                Ok(count) => count,
                Err(e) => {
                    tracing::error!(error = %e, "clipboard change count unavailable, not watching");
                    running.store(false, Ordering::SeqCst);
                    return;
                }
            };
            tracing::info!(?interval, change_count = last, "ClipboardWatcher started");

            while running.load(Ordering::SeqCst) {
                std::thread::sleep(interval);

                let count = match reader.change_count() {
                    Ok(count) => count,
                    Err(e) => {
                        tracing::debug!(error = %e, "change count read failed");
                        continue;
                    }
                };
                if count == last {
                    continue;
                }
                last = count;

                let is_synthetic = marker.take_if_synthetic(count);
                let content = match reader.read() {
                    Ok(Some(content)) => content,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::debug!(error = %e, "clipboard read failed");
                        continue;
                    }
                };

                tracing::debug!(change_count = count, is_synthetic, "clipboard changed");
                callback(Arc::new(content), is_synthetic);
            }

            tracing::info!("ClipboardWatcher stopped");
        });

        self.handle = Some(handle);
    }

    /// Stop the watcher. Returns after at most one poll interval.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for ClipboardWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
