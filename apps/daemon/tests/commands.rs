//! Command surface driven against a session over in-memory ports.

use flowclip_application::QueueSession;
use flowclip_daemon::commands::{execute, run, Command, Flow, ItemRef};
use flowclip_events::NullEventBus;
use flowclip_input::fakes::{
    CountingCue, FakeFocus, ManualHook, RecordingClipboard, RecordingInput, StaticPermission,
};
use flowclip_input::{
    AnsiLayout, InterceptionConfig, InterceptionManager, InterceptionPorts, ManualScheduler,
};
use flowclip_queue::{ClipContent, InMemorySettings, QueueSettings, SharedQueue};
use std::io::Cursor;
use std::sync::Arc;

struct Setup {
    session: QueueSession,
    queue: Arc<SharedQueue>,
    clipboard: Arc<RecordingClipboard>,
    scheduler: Arc<ManualScheduler>,
}

fn setup() -> Setup {
    let bus = Arc::new(NullEventBus);
    let queue = Arc::new(SharedQueue::new(bus.clone()));
    let settings = Arc::new(InMemorySettings::new(QueueSettings::default()));
    let permission = Arc::new(StaticPermission::new(true));
    let clipboard = Arc::new(RecordingClipboard::new());
    let scheduler = Arc::new(ManualScheduler::new());

    let ports = InterceptionPorts {
        clipboard: clipboard.clone(),
        input: Arc::new(RecordingInput::new()),
        focus: Arc::new(FakeFocus::new()),
        permission: permission.clone(),
        feedback: Arc::new(CountingCue::new()),
        hook: Arc::new(ManualHook::new()),
        scheduler: scheduler.clone(),
        layout: Arc::new(AnsiLayout),
    };
    let manager = InterceptionManager::new(
        queue.clone(),
        settings.clone(),
        bus.clone(),
        ports,
        InterceptionConfig::default(),
    );
    let session = QueueSession::new(queue.clone(), settings, bus, manager, permission);

    Setup {
        session,
        queue,
        clipboard,
        scheduler,
    }
}

fn output(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_session_script() {
    let s = setup();
    s.queue.add(Arc::new(ClipContent::text("first")));
    s.queue.add(Arc::new(ClipContent::text("second")));

    let script = "toggle\nlist\n\nremove 1\nbogus\nlist\nquit\nlist\n";
    let mut out = Vec::new();
    run(&s.session, Cursor::new(script), &mut out).unwrap();
    let text = output(out);

    assert!(text.contains("queue mode on"));
    assert!(text.contains("first"));
    assert!(text.contains("removed"));
    assert!(text.contains("unknown command: bogus"));
    // Nothing after quit runs: exactly two listings of "second"
    assert_eq!(text.matches("second").count(), 2);
    assert!(s.session.is_active());
    assert_eq!(s.queue.len(), 1);
}

#[test]
fn test_paste_by_position() {
    let s = setup();
    s.queue.add(Arc::new(ClipContent::text("a")));
    s.queue.add(Arc::new(ClipContent::text("b")));

    let mut out = Vec::new();
    let flow = execute(&s.session, Command::Paste(ItemRef::Position(1)), &mut out).unwrap();
    assert_eq!(flow, Flow::Continue);
    s.scheduler.run_until_idle();
    assert_eq!(s.clipboard.pasted_texts(), vec!["a"]);

    execute(&s.session, Command::Paste(ItemRef::Position(9)), &mut out).unwrap();
    assert!(output(out).contains("no such item"));
}

#[test]
fn test_settings_commands_report_state() {
    let s = setup();
    let mut out = Vec::new();
    execute(&s.session, Command::Order, &mut out).unwrap();
    execute(&s.session, Command::Split, &mut out).unwrap();
    execute(&s.session, Command::Cycle(true), &mut out).unwrap();
    let text = output(out);

    assert!(text.contains("paste order: FIFO"));
    assert!(text.contains("split lines: on"));
    assert!(text.contains("cycle: on"));
}

#[test]
fn test_clear_and_empty_list() {
    let s = setup();
    s.queue.add(Arc::new(ClipContent::text("gone")));

    let mut out = Vec::new();
    run(&s.session, Cursor::new("clear\nlist\n"), &mut out).unwrap();
    let text = output(out);
    assert!(text.contains("queue cleared"));
    assert!(text.contains("queue is empty"));
}
