//! Queue-mode paste interception.
//!
//! While monitoring, every key-down passes through [`InterceptionManager`]'s
//! hook handler. A paste gesture is swallowed and replaced by the next queued
//! item; a copy aimed at flowclip's own window is redirected to the app the
//! user came from. The handler itself only classifies and schedules, all
//! clipboard and queue work happens later on the scheduler.
//!
//! Queue shortcuts (clear, paste all, toggles) are swallowed and run on the
//! scheduler too.
//!
//! Our own synthetic paste travels back through the hook. The `pending_echo`
//! flag is armed just before each synthetic paste and cleared by the next
//! paste gesture the hook sees, which is passed through untouched.

use crate::error::InputError;
use crate::gesture::{
    classify, Decision, Gesture, HookState, KeyBindings, KeyEvent, QueueCommand,
    ResolvedBindings, Verdict,
};
use crate::layout::KeyLayoutRef;
use crate::ports::{
    ClipboardRef, FeedbackRef, HookGuard, KeyHandler, KeyHookRef, PermissionRef,
    SyntheticInputRef,
};
use crate::scheduler::SchedulerRef;
use flowclip_context::FocusRef;
use flowclip_events::{event_names, publish, EventBusRef, QueueExhaustedEvent};
use flowclip_queue::{ClipContent, SettingsRef, SharedQueueRef};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use uuid::Uuid;

/// Delay between a swallowed paste and the synthetic one, letting the user
/// release the keys first.
pub const PASTE_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Delay after yielding focus before sending input to the previous app.
pub const FOCUS_TRANSFER_DELAY: Duration = Duration::from_millis(100);

/// Delay between an item's paste and its separator's paste.
pub const SEPARATOR_DELAY: Duration = Duration::from_millis(100);

/// Delay between yielding focus and re-sending a redirected copy.
pub const COPY_RETARGET_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub paste_settle: Duration,
    pub focus_transfer: Duration,
    pub separator: Duration,
    pub copy_retarget: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            paste_settle: PASTE_SETTLE_DELAY,
            focus_transfer: FOCUS_TRANSFER_DELAY,
            separator: SEPARATOR_DELAY,
            copy_retarget: COPY_RETARGET_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterceptionConfig {
    pub bindings: KeyBindings,
    pub timings: Timings,
}

/// Everything the manager talks to outside its own state.
#[derive(Clone)]
pub struct InterceptionPorts {
    pub clipboard: ClipboardRef,
    pub input: SyntheticInputRef,
    pub focus: FocusRef,
    pub permission: PermissionRef,
    pub feedback: FeedbackRef,
    pub hook: KeyHookRef,
    pub scheduler: SchedulerRef,
    pub layout: KeyLayoutRef,
}

/// State shared between the hook handler and scheduled follow-ups.
struct Core {
    queue: SharedQueueRef,
    settings: SettingsRef,
    bus: EventBusRef,
    clipboard: ClipboardRef,
    input: SyntheticInputRef,
    focus: FocusRef,
    feedback: FeedbackRef,
    scheduler: SchedulerRef,
    layout: KeyLayoutRef,
    config: InterceptionConfig,
    /// `config.bindings` as key codes, refreshed each time monitoring starts.
    bindings: RwLock<ResolvedBindings>,
    armed: AtomicBool,
    pending_echo: AtomicBool,
}

impl Core {
    fn schedule(self: &Arc<Self>, after: Duration, f: impl FnOnce(&Arc<Core>) + Send + 'static) {
        let core = Arc::clone(self);
        self.scheduler.schedule(after, Box::new(move || f(&core)));
    }

    fn handle_key_down(self: &Arc<Self>, event: &KeyEvent) -> Verdict {
        if !self.armed.load(Ordering::SeqCst) {
            return Verdict::PassThrough;
        }

        let gesture = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .gesture_for(event);
        let pending_echo = self.pending_echo.load(Ordering::SeqCst);
        // Focus is only asked about for gestures that depend on it
        let own_app_active = match gesture {
            Gesture::Paste if !pending_echo => self.focus.is_own_app_active(),
            Gesture::Copy => self.focus.is_own_app_active(),
            _ => false,
        };
        let decision = classify(
            gesture,
            HookState {
                pending_echo,
                own_app_active,
            },
        );
        tracing::trace!(?gesture, ?decision, "key down");

        match decision {
            Decision::PassThrough => {}
            Decision::EchoPassThrough => {
                self.pending_echo.store(false, Ordering::SeqCst);
            }
            Decision::InterceptPaste { yield_focus } => {
                self.schedule(Duration::ZERO, move |core| core.begin_paste(yield_focus));
            }
            Decision::RetargetCopy => {
                self.schedule(Duration::ZERO, |core| core.retarget_copy());
            }
            Decision::RunCommand(command) => {
                self.schedule(Duration::ZERO, move |core| core.run_command(command));
            }
        }

        decision.verdict()
    }

    fn begin_paste(self: &Arc<Self>, yield_focus: bool) {
        let delay = if yield_focus {
            self.focus.yield_focus();
            self.config.timings.focus_transfer
        } else {
            self.config.timings.paste_settle
        };
        self.schedule(delay, |core| core.deliver_next());
    }

    fn deliver_next(self: &Arc<Self>) {
        let settings = self.settings.queue_settings();

        let Some(content) = self.queue.next_to_paste(&settings) else {
            let item_count = self.queue.len();
            tracing::debug!(item_count, "nothing left to paste");
            self.feedback.play_failure();
            publish(
                self.bus.as_ref(),
                event_names::QUEUE_EXHAUSTED,
                &QueueExhaustedEvent { item_count },
            );
            return;
        };

        if let Err(e) = self.paste_content(&content) {
            tracing::warn!(error = %e, "queued paste failed");
            return;
        }

        if let Some(separator) = settings.separator.text() {
            self.schedule(self.config.timings.separator, move |core| {
                if let Err(e) = core.paste_content(&ClipContent::Text(separator)) {
                    tracing::warn!(error = %e, "separator paste failed");
                }
            });
        }
    }

    fn paste_content(&self, content: &ClipContent) -> Result<(), InputError> {
        self.clipboard.copy(content, true)?;
        self.synthetic_paste()
    }

    /// Arm the echo guard and send the paste. The guard is disarmed again if
    /// the paste could not be sent.
    fn synthetic_paste(&self) -> Result<(), InputError> {
        self.pending_echo.store(true, Ordering::SeqCst);
        if let Err(e) = self.clipboard.paste() {
            self.pending_echo.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    fn retarget_copy(self: &Arc<Self>) {
        self.focus.yield_focus();
        self.schedule(self.config.timings.copy_retarget, |core| {
            if let Err(e) = core.input.post_copy_gesture() {
                tracing::warn!(error = %e, "redirected copy failed");
            }
        });
    }

    fn run_command(self: &Arc<Self>, command: QueueCommand) {
        match command {
            QueueCommand::Clear => {
                self.queue.clear();
                tracing::debug!("queue cleared from shortcut");
            }
            QueueCommand::PasteAll => {
                self.schedule(self.config.timings.paste_settle, |core| core.paste_all());
            }
            QueueCommand::ToggleSplit => {
                let enabled = self.settings.toggle_auto_split_text();
                tracing::debug!(enabled, "auto split toggled from shortcut");
            }
            QueueCommand::TogglePasteOrder => {
                let order = self.settings.toggle_dequeue_order();
                tracing::debug!(?order, "paste order toggled from shortcut");
            }
        }
    }

    fn paste_all(&self) {
        let settings = self.settings.queue_settings();
        let text = self
            .queue
            .all_text(settings.dequeue_order, &settings.separator);
        if text.is_empty() {
            tracing::debug!("queue has no text to paste");
            return;
        }

        if let Err(e) = self.paste_content(&ClipContent::Text(text)) {
            tracing::warn!(error = %e, "paste all failed");
        }
    }

    fn paste_item(self: &Arc<Self>, id: Uuid) {
        let Some(content) = self.queue.mark_consumed(id) else {
            tracing::debug!(%id, "no queued item to paste");
            return;
        };

        // Only hand focus back when our window took it
        let yielded = self.focus.is_own_app_active();
        if yielded {
            self.focus.yield_focus();
        }
        if let Err(e) = self.clipboard.copy(&content, true) {
            tracing::warn!(error = %e, "copying queued item failed");
            return;
        }

        let delay = if yielded {
            self.config.timings.focus_transfer
        } else {
            self.config.timings.paste_settle
        };
        self.schedule(delay, |core| {
            if let Err(e) = core.synthetic_paste() {
                tracing::warn!(error = %e, "queued item paste failed");
            }
        });
    }
}

/// Owns the keystroke hook and the paste/copy state machine.
pub struct InterceptionManager {
    core: Arc<Core>,
    hook: KeyHookRef,
    permission: PermissionRef,
    guard: Mutex<Option<HookGuard>>,
}

impl InterceptionManager {
    pub fn new(
        queue: SharedQueueRef,
        settings: SettingsRef,
        bus: EventBusRef,
        ports: InterceptionPorts,
        config: InterceptionConfig,
    ) -> Self {
        let core = Core {
            queue,
            settings,
            bus,
            clipboard: ports.clipboard,
            input: ports.input,
            focus: ports.focus,
            feedback: ports.feedback,
            scheduler: ports.scheduler,
            layout: ports.layout,
            config,
            bindings: RwLock::new(ResolvedBindings::default()),
            armed: AtomicBool::new(false),
            pending_echo: AtomicBool::new(false),
        };

        Self {
            core: Arc::new(core),
            hook: ports.hook,
            permission: ports.permission,
            guard: Mutex::new(None),
        }
    }

    /// Install the hook and start intercepting.
    ///
    /// Any previous hook is removed first and the echo guard starts cleared.
    /// Shortcuts are resolved against the keyboard layout active now.
    /// Fails without installing anything when the accessibility permission is
    /// missing.
    pub fn start_monitoring(&self) -> Result<(), InputError> {
        self.stop_monitoring();

        if !self.permission.is_granted() {
            tracing::warn!("accessibility permission missing, not intercepting");
            return Err(InputError::AccessibilityNotGranted);
        }

        let resolved = self.core.config.bindings.resolve(self.core.layout.as_ref());
        tracing::debug!(?resolved, "key bindings resolved");
        *self
            .core
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = resolved;

        let core = Arc::clone(&self.core);
        let handler: KeyHandler = Arc::new(move |event: &KeyEvent| core.handle_key_down(event));
        let guard = self.hook.install(handler)?;

        *self.guard.lock().unwrap_or_else(PoisonError::into_inner) = Some(guard);
        self.core.pending_echo.store(false, Ordering::SeqCst);
        self.core.armed.store(true, Ordering::SeqCst);
        tracing::info!("intercepting paste gestures");
        Ok(())
    }

    /// Remove the hook. Safe to call when not monitoring.
    pub fn stop_monitoring(&self) {
        self.core.armed.store(false, Ordering::SeqCst);
        self.core.pending_echo.store(false, Ordering::SeqCst);

        let guard = self
            .guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(guard) = guard {
            guard.remove();
            tracing::info!("stopped intercepting");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.core.armed.load(Ordering::SeqCst)
    }

    /// Whether a synthetic paste is in flight and its echo not yet seen.
    pub fn pending_echo(&self) -> bool {
        self.core.pending_echo.load(Ordering::SeqCst)
    }

    /// Classify one key-down event. This is what the installed hook calls;
    /// exposed so platforms can feed events in directly.
    pub fn handle_key_down(&self, event: &KeyEvent) -> Verdict {
        self.core.handle_key_down(event)
    }

    /// Paste every queued text item in one go, joined with the separator.
    /// Does not consume items. No-op when the queue has no text.
    pub fn paste_all(&self) {
        self.core
            .schedule(Duration::ZERO, |core| core.paste_all());
    }

    /// Paste one specific item into the previous application and mark it
    /// consumed. Unknown ids are ignored.
    pub fn paste_item(&self, id: Uuid) {
        self.core
            .schedule(Duration::ZERO, move |core| core.paste_item(id));
    }
}

impl Drop for InterceptionManager {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

impl std::fmt::Debug for InterceptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptionManager")
            .field("monitoring", &self.is_monitoring())
            .field("pending_echo", &self.pending_echo())
            .field("config", &self.core.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{
        CountingCue, FakeFocus, ManualHook, RecordingClipboard, RecordingInput, StaticPermission,
    };
    use crate::gesture::{Modifiers, Shortcut, KEY_CODE_C, KEY_CODE_DELETE, KEY_CODE_V};
    use crate::layout::{AnsiLayout, TableLayout};
    use crate::scheduler::ManualScheduler;
    use flowclip_events::InMemoryEventBus;
    use flowclip_queue::{
        DequeueOrder, InMemorySettings, QueueSettings, Separator, SettingsSource, SharedQueue,
    };

    const CMD_V: KeyEvent = KeyEvent {
        key_code: KEY_CODE_V,
        modifiers: Modifiers::COMMAND,
    };
    const CMD_C: KeyEvent = KeyEvent {
        key_code: KEY_CODE_C,
        modifiers: Modifiers::COMMAND,
    };

    struct Harness {
        manager: InterceptionManager,
        queue: SharedQueueRef,
        settings: Arc<InMemorySettings>,
        bus: Arc<InMemoryEventBus>,
        clipboard: Arc<RecordingClipboard>,
        input: Arc<RecordingInput>,
        focus: Arc<FakeFocus>,
        permission: Arc<StaticPermission>,
        cue: Arc<CountingCue>,
        hook: Arc<ManualHook>,
        scheduler: Arc<ManualScheduler>,
    }

    fn harness(settings: QueueSettings) -> Harness {
        harness_with(settings, Arc::new(AnsiLayout), KeyBindings::default())
    }

    fn harness_with(settings: QueueSettings, layout: KeyLayoutRef, bindings: KeyBindings) -> Harness {
        let bus = Arc::new(InMemoryEventBus::new());
        let queue = Arc::new(SharedQueue::new(bus.clone()));
        let settings = Arc::new(InMemorySettings::new(settings));
        let clipboard = Arc::new(RecordingClipboard::new());
        let input = Arc::new(RecordingInput::new());
        let focus = Arc::new(FakeFocus::new());
        let permission = Arc::new(StaticPermission::new(true));
        let cue = Arc::new(CountingCue::new());
        let hook = Arc::new(ManualHook::new());
        let scheduler = Arc::new(ManualScheduler::new());

        let ports = InterceptionPorts {
            clipboard: clipboard.clone(),
            input: input.clone(),
            focus: focus.clone(),
            permission: permission.clone(),
            feedback: cue.clone(),
            hook: hook.clone(),
            scheduler: scheduler.clone(),
            layout,
        };
        let manager = InterceptionManager::new(
            queue.clone(),
            settings.clone(),
            bus.clone(),
            ports,
            InterceptionConfig {
                bindings,
                ..Default::default()
            },
        );

        Harness {
            manager,
            queue,
            settings,
            bus,
            clipboard,
            input,
            focus,
            permission,
            cue,
            hook,
            scheduler,
        }
    }

    fn fifo_no_separator() -> QueueSettings {
        QueueSettings {
            dequeue_order: DequeueOrder::Fifo,
            separator: Separator::None,
            ..Default::default()
        }
    }

    #[test]
    fn test_events_pass_when_not_monitoring() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("a")));

        assert_eq!(h.manager.handle_key_down(&CMD_V), Verdict::PassThrough);
        assert_eq!(h.scheduler.pending(), 0);
        assert!(h.hook.press(CMD_V).is_none());
    }

    #[test]
    fn test_start_requires_permission() {
        let h = harness(fifo_no_separator());
        h.permission.set_granted(false);

        let result = h.manager.start_monitoring();
        assert!(matches!(result, Err(InputError::AccessibilityNotGranted)));
        assert!(!h.hook.is_installed());
        assert!(!h.manager.is_monitoring());
    }

    #[test]
    fn test_hook_install_failure_leaves_manager_stopped() {
        let h = harness(fifo_no_separator());
        h.hook.set_fail_install(true);

        assert!(matches!(
            h.manager.start_monitoring(),
            Err(InputError::HookFailed(_))
        ));
        assert!(!h.manager.is_monitoring());
    }

    #[test]
    fn test_start_twice_keeps_one_hook() {
        let h = harness(fifo_no_separator());
        h.manager.start_monitoring().unwrap();
        h.manager.start_monitoring().unwrap();

        assert!(h.hook.is_installed());
        assert_eq!(h.hook.install_count(), 2);

        h.manager.stop_monitoring();
        assert!(!h.hook.is_installed());
        h.manager.stop_monitoring();
    }

    #[test]
    fn test_paste_is_swallowed_and_replaced() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("A")));
        h.queue.add(Arc::new(ClipContent::text("B")));
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(CMD_V), Some(Verdict::Swallow));
        // Nothing happens until the settle delay has passed
        h.scheduler.advance(Duration::from_millis(49));
        assert_eq!(h.clipboard.paste_count(), 0);

        h.scheduler.advance(Duration::from_millis(1));
        assert_eq!(h.clipboard.pasted_texts(), vec!["A"]);
        assert!(h.manager.pending_echo());

        let consumed: Vec<bool> = h.queue.snapshot().iter().map(|v| v.consumed).collect();
        assert_eq!(consumed, vec![true, false]);
    }

    #[test]
    fn test_echo_passes_through_without_dequeue() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("A")));
        h.queue.add(Arc::new(ClipContent::text("B")));
        h.manager.start_monitoring().unwrap();

        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();
        assert!(h.manager.pending_echo());

        // Our own paste arrives back at the hook
        assert_eq!(h.hook.press(CMD_V), Some(Verdict::PassThrough));
        assert!(!h.manager.pending_echo());
        assert_eq!(h.scheduler.pending(), 0);

        let consumed: Vec<bool> = h.queue.snapshot().iter().map(|v| v.consumed).collect();
        assert_eq!(consumed, vec![true, false]);

        // The next real paste is intercepted again
        assert_eq!(h.hook.press(CMD_V), Some(Verdict::Swallow));
        h.scheduler.run_until_idle();
        assert_eq!(h.clipboard.pasted_texts(), vec!["A", "B"]);
    }

    #[test]
    fn test_wired_echo_round_trip() {
        let h = harness(fifo_no_separator());
        let hook = Arc::clone(&h.hook);
        h.clipboard.set_on_paste(move || {
            hook.press(CMD_V);
        });
        h.queue.add(Arc::new(ClipContent::text("A")));
        h.queue.add(Arc::new(ClipContent::text("B")));
        h.manager.start_monitoring().unwrap();

        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();
        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();

        assert_eq!(h.clipboard.pasted_texts(), vec!["A", "B"]);
        assert!(!h.manager.pending_echo());
        assert!(h.queue.snapshot().iter().all(|v| v.consumed));
    }

    #[test]
    fn test_lifo_order_with_separator() {
        let h = harness(QueueSettings {
            dequeue_order: DequeueOrder::Lifo,
            separator: Separator::Comma,
            ..Default::default()
        });
        let hook = Arc::clone(&h.hook);
        h.clipboard.set_on_paste(move || {
            hook.press(CMD_V);
        });
        for text in ["A", "B", "C"] {
            h.queue.add(Arc::new(ClipContent::text(text)));
        }
        h.manager.start_monitoring().unwrap();

        h.hook.press(CMD_V);
        h.scheduler.advance(PASTE_SETTLE_DELAY);
        assert_eq!(h.clipboard.pasted_texts(), vec!["C"]);

        h.scheduler.advance(SEPARATOR_DELAY);
        assert_eq!(h.clipboard.pasted_texts(), vec!["C", ","]);

        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();
        assert_eq!(h.clipboard.pasted_texts(), vec!["C", ",", "B", ","]);
        assert!(h.clipboard.calls().iter().all(|call| match call {
            crate::fakes::ClipboardCall::Copy { internal, .. } => *internal,
            crate::fakes::ClipboardCall::Paste => true,
        }));
    }

    #[test]
    fn test_exhausted_queue_plays_cue() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("only")));
        h.manager.start_monitoring().unwrap();

        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();
        h.manager.handle_key_down(&CMD_V); // echo
        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();

        assert_eq!(h.clipboard.pasted_texts(), vec!["only"]);
        // The exhausted press leaves the clipboard alone
        assert_eq!(h.clipboard.copied_texts(), vec!["only"]);
        assert_eq!(h.cue.count(), 1);
        assert!(!h.manager.pending_echo());

        let payload = h.bus.last_payload(event_names::QUEUE_EXHAUSTED).unwrap();
        let event: QueueExhaustedEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(event.item_count, 1);
    }

    #[test]
    fn test_empty_queue_paste_plays_cue() {
        let h = harness(fifo_no_separator());
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(CMD_V), Some(Verdict::Swallow));
        h.scheduler.run_until_idle();

        assert_eq!(h.clipboard.paste_count(), 0);
        assert_eq!(h.cue.count(), 1);
    }

    #[test]
    fn test_cycle_restarts_after_last_item() {
        let h = harness(QueueSettings {
            cycle_on_exhaustion: true,
            ..fifo_no_separator()
        });
        for text in ["A", "B"] {
            h.queue.add(Arc::new(ClipContent::text(text)));
        }
        h.manager.start_monitoring().unwrap();

        for _ in 0..3 {
            h.hook.press(CMD_V);
            h.scheduler.run_until_idle();
            h.hook.press(CMD_V); // echo
        }

        assert_eq!(h.clipboard.pasted_texts(), vec!["A", "B", "A"]);
        assert_eq!(h.cue.count(), 0);
    }

    #[test]
    fn test_paste_from_own_window_yields_focus_first() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("A")));
        h.focus.set_own_active(true);
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(CMD_V), Some(Verdict::Swallow));
        h.scheduler.advance(Duration::ZERO);
        assert_eq!(h.focus.yield_count(), 1);

        // The settle delay is not enough after a focus change
        h.scheduler.advance(PASTE_SETTLE_DELAY);
        assert_eq!(h.clipboard.paste_count(), 0);

        h.scheduler
            .advance(FOCUS_TRANSFER_DELAY - PASTE_SETTLE_DELAY);
        assert_eq!(h.clipboard.pasted_texts(), vec!["A"]);
    }

    #[test]
    fn test_copy_in_own_window_is_retargeted() {
        let h = harness(fifo_no_separator());
        h.focus.set_own_active(true);
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(CMD_C), Some(Verdict::Swallow));
        h.scheduler.advance(Duration::ZERO);
        assert_eq!(h.focus.yield_count(), 1);
        assert_eq!(h.input.copy_gestures(), 0);

        h.scheduler.advance(COPY_RETARGET_DELAY);
        assert_eq!(h.input.copy_gestures(), 1);

        // The re-sent copy lands in the other app and passes through
        assert_eq!(h.hook.press(CMD_C), Some(Verdict::PassThrough));
        assert!(h.queue.is_empty());
    }

    #[test]
    fn test_copy_elsewhere_passes_through() {
        let h = harness(fifo_no_separator());
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(CMD_C), Some(Verdict::PassThrough));
        assert_eq!(h.scheduler.pending(), 0);
    }

    #[test]
    fn test_failed_paste_disarms_guard() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("A")));
        h.queue.add(Arc::new(ClipContent::text("B")));
        h.clipboard.set_fail_paste(true);
        h.manager.start_monitoring().unwrap();

        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();
        assert!(!h.manager.pending_echo());

        // The user's next paste is still intercepted
        h.clipboard.set_fail_paste(false);
        assert_eq!(h.hook.press(CMD_V), Some(Verdict::Swallow));
    }

    #[test]
    fn test_stop_clears_pending_echo() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("A")));
        h.manager.start_monitoring().unwrap();
        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();
        assert!(h.manager.pending_echo());

        h.manager.stop_monitoring();
        assert!(!h.manager.pending_echo());
        h.manager.start_monitoring().unwrap();
        assert!(!h.manager.pending_echo());
    }

    #[test]
    fn test_paste_all_joins_without_consuming() {
        let h = harness(QueueSettings {
            dequeue_order: DequeueOrder::Fifo,
            separator: Separator::Newline,
            ..Default::default()
        });
        for text in ["A", "B", "C"] {
            h.queue.add(Arc::new(ClipContent::text(text)));
        }

        h.manager.paste_all();
        h.scheduler.run_until_idle();

        assert_eq!(h.clipboard.pasted_texts(), vec!["A\nB\nC\n"]);
        assert!(h.queue.snapshot().iter().all(|v| !v.consumed));
    }

    #[test]
    fn test_paste_all_empty_is_noop() {
        let h = harness(fifo_no_separator());
        h.manager.paste_all();
        h.scheduler.run_until_idle();
        assert!(h.clipboard.calls().is_empty());
        assert!(!h.manager.pending_echo());
    }

    #[test]
    fn test_paste_item_consumes_and_yields() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("A")));
        let b = h.queue.add(Arc::new(ClipContent::text("B")));
        h.focus.set_own_active(true);

        h.manager.paste_item(b);
        h.scheduler.advance(Duration::ZERO);
        assert_eq!(h.focus.yield_count(), 1);
        assert_eq!(h.clipboard.copied_texts(), vec!["B"]);
        assert_eq!(h.clipboard.paste_count(), 0);

        h.scheduler.advance(FOCUS_TRANSFER_DELAY);
        assert_eq!(h.clipboard.pasted_texts(), vec!["B"]);
        assert!(h.manager.pending_echo());

        let consumed: Vec<bool> = h.queue.snapshot().iter().map(|v| v.consumed).collect();
        assert_eq!(consumed, vec![false, true]);
    }

    #[test]
    fn test_paste_item_from_elsewhere_keeps_focus() {
        let h = harness(fifo_no_separator());
        let a = h.queue.add(Arc::new(ClipContent::text("A")));

        h.manager.paste_item(a);
        h.scheduler.advance(Duration::ZERO);
        assert_eq!(h.focus.yield_count(), 0);
        assert_eq!(h.clipboard.copied_texts(), vec!["A"]);

        h.scheduler.advance(PASTE_SETTLE_DELAY);
        assert_eq!(h.clipboard.pasted_texts(), vec!["A"]);
    }

    #[test]
    fn test_paste_unknown_item_is_noop() {
        let h = harness(fifo_no_separator());
        h.manager.paste_item(Uuid::new_v4());
        h.scheduler.run_until_idle();
        assert!(h.clipboard.calls().is_empty());
        assert_eq!(h.focus.yield_count(), 0);
    }

    #[test]
    fn test_order_change_applies_to_next_paste() {
        let h = harness(fifo_no_separator());
        for text in ["A", "B", "C"] {
            h.queue.add(Arc::new(ClipContent::text(text)));
        }
        h.manager.start_monitoring().unwrap();

        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();
        h.hook.press(CMD_V); // echo

        h.settings.set_dequeue_order(DequeueOrder::Lifo);
        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();

        assert_eq!(h.clipboard.pasted_texts(), vec!["A", "C"]);
    }

    #[test]
    fn test_plain_keys_do_not_ask_for_focus() {
        let h = harness(fifo_no_separator());
        h.manager.start_monitoring().unwrap();

        let plain_a = KeyEvent::new(0x00, Modifiers::NONE);
        for _ in 0..5 {
            assert_eq!(h.hook.press(plain_a), Some(Verdict::PassThrough));
        }
        assert_eq!(h.focus.query_count(), 0);

        h.hook.press(CMD_C);
        assert_eq!(h.focus.query_count(), 1);
    }

    #[test]
    fn test_echo_does_not_ask_for_focus() {
        let h = harness(fifo_no_separator());
        h.queue.add(Arc::new(ClipContent::text("A")));
        h.manager.start_monitoring().unwrap();

        h.hook.press(CMD_V);
        h.scheduler.run_until_idle();
        let before = h.focus.query_count();

        assert_eq!(h.hook.press(CMD_V), Some(Verdict::PassThrough));
        assert_eq!(h.focus.query_count(), before);
    }

    #[test]
    fn test_paste_follows_keyboard_layout() {
        // Dvorak: V is typed by the ANSI '.' key, K by the ANSI V key
        let dvorak = TableLayout::new([('v', 0x2F), ('c', 0x22), ('k', KEY_CODE_V)]);
        let h = harness_with(fifo_no_separator(), Arc::new(dvorak), KeyBindings::default());
        h.queue.add(Arc::new(ClipContent::text("A")));
        h.manager.start_monitoring().unwrap();

        // Command+K on Dvorak is not a paste
        assert_eq!(h.hook.press(CMD_V), Some(Verdict::PassThrough));
        assert_eq!(h.scheduler.pending(), 0);

        let dvorak_cmd_v = KeyEvent::new(0x2F, Modifiers::COMMAND);
        assert_eq!(h.hook.press(dvorak_cmd_v), Some(Verdict::Swallow));
        h.scheduler.run_until_idle();
        assert_eq!(h.clipboard.pasted_texts(), vec!["A"]);

        // The echo arrives on the same physical key
        assert_eq!(h.hook.press(dvorak_cmd_v), Some(Verdict::PassThrough));
        assert!(!h.manager.pending_echo());
    }

    fn all_commands() -> KeyBindings {
        KeyBindings {
            paste_all: Some("opt+shift+a".parse::<Shortcut>().unwrap()),
            toggle_split: Some("opt+shift+s".parse::<Shortcut>().unwrap()),
            toggle_paste_order: Some("opt+shift+o".parse::<Shortcut>().unwrap()),
            ..Default::default()
        }
    }

    fn opt_shift(key_code: u16) -> KeyEvent {
        KeyEvent::new(key_code, Modifiers::OPTION_SHIFT)
    }

    #[test]
    fn test_clear_shortcut_empties_queue() {
        let h = harness(fifo_no_separator());
        for text in ["A", "B"] {
            h.queue.add(Arc::new(ClipContent::text(text)));
        }
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(opt_shift(KEY_CODE_DELETE)), Some(Verdict::Swallow));
        h.scheduler.run_until_idle();
        assert!(h.queue.is_empty());
        assert!(h.clipboard.calls().is_empty());
    }

    #[test]
    fn test_paste_all_shortcut() {
        let h = harness_with(fifo_no_separator(), Arc::new(AnsiLayout), all_commands());
        for text in ["A", "B"] {
            h.queue.add(Arc::new(ClipContent::text(text)));
        }
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(opt_shift(0x00)), Some(Verdict::Swallow));
        h.scheduler.advance(Duration::ZERO);
        // Waits for the user to let go of the keys
        assert_eq!(h.clipboard.paste_count(), 0);

        h.scheduler.advance(PASTE_SETTLE_DELAY);
        assert_eq!(h.clipboard.pasted_texts(), vec!["AB"]);
        assert!(h.queue.snapshot().iter().all(|v| !v.consumed));
    }

    #[test]
    fn test_toggle_shortcuts_flip_settings() {
        let h = harness_with(fifo_no_separator(), Arc::new(AnsiLayout), all_commands());
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(opt_shift(0x01)), Some(Verdict::Swallow));
        assert_eq!(h.hook.press(opt_shift(0x1F)), Some(Verdict::Swallow));
        h.scheduler.run_until_idle();

        let settings = h.settings.queue_settings();
        assert!(settings.auto_split_text);
        assert_eq!(settings.dequeue_order, DequeueOrder::Lifo);

        h.hook.press(opt_shift(0x1F));
        h.scheduler.run_until_idle();
        assert_eq!(h.settings.queue_settings().dequeue_order, DequeueOrder::Fifo);
    }

    #[test]
    fn test_unbound_commands_pass_through() {
        let h = harness(fifo_no_separator());
        h.manager.start_monitoring().unwrap();

        assert_eq!(h.hook.press(opt_shift(0x00)), Some(Verdict::PassThrough));
        assert_eq!(h.hook.press(opt_shift(0x1F)), Some(Verdict::PassThrough));
        assert_eq!(h.scheduler.pending(), 0);
    }

    #[test]
    fn test_drop_removes_hook() {
        let h = harness(fifo_no_separator());
        h.manager.start_monitoring().unwrap();
        assert!(h.hook.is_installed());

        let Harness { manager, hook, .. } = h;
        drop(manager);
        assert!(!hook.is_installed());
    }
}
