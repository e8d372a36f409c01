//! End-to-end interception tests over the in-memory ports.

use flowclip_events::{event_names, InMemoryEventBus};
use flowclip_input::fakes::{
    CountingCue, FakeFocus, ManualHook, RecordingClipboard, RecordingInput, StaticPermission,
};
use flowclip_input::{
    AnsiLayout, InterceptionConfig, InterceptionManager, InterceptionPorts, KeyEvent,
    ManualScheduler, Modifiers, SchedulerRef, SerialScheduler, Verdict, KEY_CODE_V,
};
use flowclip_queue::{
    ClipContent, DequeueOrder, InMemorySettings, QueueSettings, Separator, SharedQueue,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const CMD_V: KeyEvent = KeyEvent {
    key_code: KEY_CODE_V,
    modifiers: Modifiers::COMMAND,
};

struct Rig {
    manager: InterceptionManager,
    queue: Arc<SharedQueue>,
    bus: Arc<InMemoryEventBus>,
    clipboard: Arc<RecordingClipboard>,
    cue: Arc<CountingCue>,
    hook: Arc<ManualHook>,
}

fn rig(settings: QueueSettings, scheduler: SchedulerRef) -> Rig {
    let bus = Arc::new(InMemoryEventBus::new());
    let queue = Arc::new(SharedQueue::new(bus.clone()));
    let clipboard = Arc::new(RecordingClipboard::new());
    let cue = Arc::new(CountingCue::new());
    let hook = Arc::new(ManualHook::new());

    // Every synthetic paste comes back through the hook, as it does on macOS
    let echo_hook = Arc::clone(&hook);
    clipboard.set_on_paste(move || {
        echo_hook.press(CMD_V);
    });

    let ports = InterceptionPorts {
        clipboard: clipboard.clone(),
        input: Arc::new(RecordingInput::new()),
        focus: Arc::new(FakeFocus::new()),
        permission: Arc::new(StaticPermission::new(true)),
        feedback: cue.clone(),
        hook: hook.clone(),
        scheduler,
        layout: Arc::new(AnsiLayout),
    };
    let manager = InterceptionManager::new(
        queue.clone(),
        Arc::new(InMemorySettings::new(settings)),
        bus.clone(),
        ports,
        InterceptionConfig::default(),
    );

    Rig {
        manager,
        queue,
        bus,
        clipboard,
        cue,
        hook,
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

mod manual_clock {
    use super::*;

    #[test]
    fn test_three_pastes_drain_fifo_queue() {
        let scheduler = Arc::new(ManualScheduler::new());
        let rig = rig(
            QueueSettings {
                dequeue_order: DequeueOrder::Fifo,
                separator: Separator::None,
                ..Default::default()
            },
            scheduler.clone(),
        );
        for text in ["one", "two", "three"] {
            rig.queue.add(Arc::new(ClipContent::text(text)));
        }
        rig.manager.start_monitoring().unwrap();

        for _ in 0..3 {
            assert_eq!(rig.hook.press(CMD_V), Some(Verdict::Swallow));
            scheduler.run_until_idle();
        }

        assert_eq!(rig.clipboard.pasted_texts(), vec!["one", "two", "three"]);
        assert!(!rig.manager.pending_echo());
        assert_eq!(rig.cue.count(), 0);

        // Fourth paste: queue exhausted
        rig.hook.press(CMD_V);
        scheduler.run_until_idle();
        assert_eq!(rig.cue.count(), 1);
        assert_eq!(rig.bus.events_for(event_names::QUEUE_EXHAUSTED).len(), 1);
    }

    #[test]
    fn test_default_settings_paste_newest_with_separator() {
        let scheduler = Arc::new(ManualScheduler::new());
        let rig = rig(QueueSettings::default(), scheduler.clone());
        for text in ["A", "B", "C"] {
            rig.queue.add(Arc::new(ClipContent::text(text)));
        }
        rig.manager.start_monitoring().unwrap();

        rig.hook.press(CMD_V);
        scheduler.run_until_idle();

        assert_eq!(rig.clipboard.pasted_texts(), vec!["C", ", "]);
    }

    #[test]
    fn test_stop_monitoring_lets_pastes_through() {
        let scheduler = Arc::new(ManualScheduler::new());
        let rig = rig(QueueSettings::default(), scheduler.clone());
        rig.queue.add(Arc::new(ClipContent::text("A")));
        rig.manager.start_monitoring().unwrap();
        rig.manager.stop_monitoring();

        assert_eq!(rig.hook.press(CMD_V), None);
        assert_eq!(rig.manager.handle_key_down(&CMD_V), Verdict::PassThrough);
        assert_eq!(scheduler.pending(), 0);
    }
}

mod serial_scheduler {
    use super::*;

    #[test]
    fn test_paste_runs_on_scheduler_thread() {
        let scheduler = Arc::new(SerialScheduler::start().unwrap());
        let rig = rig(
            QueueSettings {
                dequeue_order: DequeueOrder::Fifo,
                separator: Separator::Newline,
                ..Default::default()
            },
            scheduler,
        );
        rig.queue.add(Arc::new(ClipContent::text("first")));
        rig.queue.add(Arc::new(ClipContent::text("second")));
        rig.manager.start_monitoring().unwrap();

        assert_eq!(rig.hook.press(CMD_V), Some(Verdict::Swallow));
        assert!(wait_until(|| rig.clipboard.paste_count() == 2));
        assert_eq!(rig.clipboard.pasted_texts(), vec!["first", "\n"]);

        rig.hook.press(CMD_V);
        assert!(wait_until(|| rig.clipboard.paste_count() == 4));
        assert_eq!(
            rig.clipboard.pasted_texts(),
            vec!["first", "\n", "second", "\n"]
        );
        assert!(!rig.manager.pending_echo());
    }

    #[test]
    fn test_paste_all_through_scheduler() {
        let scheduler = Arc::new(SerialScheduler::start().unwrap());
        let rig = rig(
            QueueSettings {
                dequeue_order: DequeueOrder::Fifo,
                separator: Separator::Space,
                ..Default::default()
            },
            scheduler,
        );
        rig.queue.add(Arc::new(ClipContent::text("a")));
        rig.queue.add(Arc::new(ClipContent::text("b")));

        rig.manager.paste_all();
        assert!(wait_until(|| rig.clipboard.paste_count() == 1));
        assert_eq!(rig.clipboard.pasted_texts(), vec!["a b "]);
    }
}
