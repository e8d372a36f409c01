//! In-memory port implementations.
//!
//! Used by tests across the workspace and by headless runs where no window
//! server is available. Each fake records what it was asked to do.

use crate::error::InputError;
use crate::gesture::{KeyEvent, Verdict};
use crate::ports::{
    ClipboardPort, FeedbackCue, HookGuard, KeyHandler, KeyHook, PermissionGate, SyntheticInput,
};
use flowclip_context::{AppInfo, FocusController};
use flowclip_queue::ClipContent;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardCall {
    Copy { content: ClipContent, internal: bool },
    Paste,
}

type PasteListener = Arc<dyn Fn() + Send + Sync>;

/// Clipboard that records calls instead of touching the system.
#[derive(Default)]
pub struct RecordingClipboard {
    calls: Mutex<Vec<ClipboardCall>>,
    current: Mutex<Option<ClipContent>>,
    fail_paste: AtomicBool,
    fail_copy: AtomicBool,
    on_paste: Mutex<Option<PasteListener>>,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ClipboardCall> {
        lock(&self.calls).clone()
    }

    /// Texts of every copy, in order. Non-text copies are skipped.
    pub fn copied_texts(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                ClipboardCall::Copy { content, .. } => content.as_text().map(str::to_string),
                ClipboardCall::Paste => None,
            })
            .collect()
    }

    /// What a paste right now would insert.
    pub fn current(&self) -> Option<ClipContent> {
        lock(&self.current).clone()
    }

    /// Texts that reached the target application, one per successful paste.
    pub fn pasted_texts(&self) -> Vec<String> {
        let calls = lock(&self.calls);
        let mut current: Option<&ClipContent> = None;
        let mut pasted = Vec::new();
        for call in calls.iter() {
            match call {
                ClipboardCall::Copy { content, .. } => current = Some(content),
                ClipboardCall::Paste => {
                    if let Some(text) = current.and_then(|c| c.as_text()) {
                        pasted.push(text.to_string());
                    }
                }
            }
        }
        pasted
    }

    pub fn paste_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, ClipboardCall::Paste))
            .count()
    }

    pub fn set_fail_paste(&self, fail: bool) {
        self.fail_paste.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_copy(&self, fail: bool) {
        self.fail_copy.store(fail, Ordering::SeqCst);
    }

    /// Run `listener` after every successful paste, e.g. to feed the
    /// synthetic keystroke back through a hook.
    pub fn set_on_paste(&self, listener: impl Fn() + Send + Sync + 'static) {
        *lock(&self.on_paste) = Some(Arc::new(listener));
    }
}

impl ClipboardPort for RecordingClipboard {
    fn copy(&self, content: &ClipContent, internal: bool) -> Result<(), InputError> {
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(InputError::ClipboardFailed("copy refused".into()));
        }
        *lock(&self.current) = Some(content.clone());
        lock(&self.calls).push(ClipboardCall::Copy {
            content: content.clone(),
            internal,
        });
        Ok(())
    }

    fn paste(&self) -> Result<(), InputError> {
        if self.fail_paste.load(Ordering::SeqCst) {
            return Err(InputError::KeyFailed("paste refused".into()));
        }
        lock(&self.calls).push(ClipboardCall::Paste);

        let listener = lock(&self.on_paste).clone();
        if let Some(listener) = listener {
            listener();
        }
        Ok(())
    }
}

/// Counts synthetic gestures.
#[derive(Debug, Default)]
pub struct RecordingInput {
    copies: AtomicUsize,
    pastes: AtomicUsize,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy_gestures(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    pub fn paste_gestures(&self) -> usize {
        self.pastes.load(Ordering::SeqCst)
    }
}

impl SyntheticInput for RecordingInput {
    fn post_copy_gesture(&self) -> Result<(), InputError> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn post_paste_gesture(&self) -> Result<(), InputError> {
        self.pastes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Permission with a settable answer.
#[derive(Debug)]
pub struct StaticPermission {
    granted: AtomicBool,
    requests: AtomicUsize,
}

impl StaticPermission {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionGate for StaticPermission {
    fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct CountingCue {
    played: AtomicUsize,
}

impl CountingCue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.played.load(Ordering::SeqCst)
    }
}

impl FeedbackCue for CountingCue {
    fn play_failure(&self) {
        self.played.fetch_add(1, Ordering::SeqCst);
    }
}

/// Focus controller with a settable "own window is frontmost" flag.
#[derive(Debug, Default)]
pub struct FakeFocus {
    own_active: AtomicBool,
    yields: AtomicUsize,
    queries: AtomicUsize,
}

impl FakeFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_own_active(&self, active: bool) {
        self.own_active.store(active, Ordering::SeqCst);
    }

    pub fn yield_count(&self) -> usize {
        self.yields.load(Ordering::SeqCst)
    }

    /// How many times `is_own_app_active` was asked.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl FocusController for FakeFocus {
    fn active_app(&self) -> Option<AppInfo> {
        None
    }

    fn is_own_app_active(&self) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.own_active.load(Ordering::SeqCst)
    }

    fn yield_focus(&self) {
        // Yielding hands focus to the previous app
        self.own_active.store(false, Ordering::SeqCst);
        self.yields.fetch_add(1, Ordering::SeqCst);
    }
}

type HandlerSlot = Arc<Mutex<Option<(u64, KeyHandler)>>>;

/// Hook whose events are injected by hand with [`press`](Self::press).
#[derive(Default)]
pub struct ManualHook {
    slot: HandlerSlot,
    generation: AtomicU64,
    fail_install: AtomicBool,
}

impl ManualHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a key-down to the installed handler. `None` when no hook is
    /// installed, meaning the event reaches the application untouched.
    pub fn press(&self, event: KeyEvent) -> Option<Verdict> {
        let handler = lock(&self.slot).as_ref().map(|(_, h)| Arc::clone(h));
        handler.map(|handler| handler(&event))
    }

    pub fn is_installed(&self) -> bool {
        lock(&self.slot).is_some()
    }

    pub fn install_count(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn set_fail_install(&self, fail: bool) {
        self.fail_install.store(fail, Ordering::SeqCst);
    }
}

impl KeyHook for ManualHook {
    fn install(&self, handler: KeyHandler) -> Result<HookGuard, InputError> {
        if self.fail_install.load(Ordering::SeqCst) {
            return Err(InputError::HookFailed("install refused".into()));
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.slot) = Some((generation, handler));

        let slot = Arc::clone(&self.slot);
        Ok(HookGuard::new(move || {
            let mut slot = lock(&slot);
            if matches!(*slot, Some((installed, _)) if installed == generation) {
                *slot = None;
            }
        }))
    }
}
