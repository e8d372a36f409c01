//! Headless flowclip process.
//!
//! Wires the queue, the interception manager and the capture router to the
//! real clipboard, keyboard and database, then serves line commands on stdin.

pub mod cli;
pub mod commands;
pub mod watcher;

use anyhow::Context;
use flowclip_application::QueueSession;
use flowclip_events::{EventBusRef, LogEventBus};
use flowclip_input::{
    platform_feedback, platform_hook, platform_layout, AccessibilityGate, ArboardClipboard,
    EnigoKeystrokes, InterceptionConfig, InterceptionManager, InterceptionPorts,
    PasteboardCounter, PermissionRef, SerialScheduler, SyntheticInputRef, SyntheticMarker,
};
use flowclip_queue::SharedQueue;
use flowclip_storage::Database;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use watcher::{ClipboardWatcher, SystemClipboard};

pub use cli::Cli;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,flowclip=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_dir().context("could not determine the user data directory")?;
    Ok(data_dir.join("flowclip").join("flowclip.db"))
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing();
    tracing::info!("Starting flowclip");

    let db_path = match cli.db.clone() {
        Some(path) => path,
        None => default_db_path()?,
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db = Arc::new(
        Database::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?,
    );

    let bus: EventBusRef = Arc::new(LogEventBus);
    let queue = Arc::new(SharedQueue::new(bus.clone()));

    let keystrokes: SyntheticInputRef = Arc::new(EnigoKeystrokes::new());
    let marker = SyntheticMarker::new();
    let permission: PermissionRef = Arc::new(AccessibilityGate);
    let scheduler =
        Arc::new(SerialScheduler::start().context("failed to start the paste scheduler")?);

    let ports = InterceptionPorts {
        clipboard: Arc::new(ArboardClipboard::new(
            keystrokes.clone(),
            marker.clone(),
            Arc::new(PasteboardCounter),
        )),
        input: keystrokes,
        focus: Arc::new(flowclip_context::platform::platform_focus()),
        permission: permission.clone(),
        feedback: platform_feedback(),
        hook: platform_hook(),
        scheduler,
        layout: platform_layout(),
    };
    let manager = InterceptionManager::new(
        queue.clone(),
        db.clone(),
        bus.clone(),
        ports,
        InterceptionConfig {
            bindings: cli.key_bindings(),
            ..Default::default()
        },
    );
    let session = QueueSession::new(queue, db.clone(), bus, manager, permission);

    let router = session.capture_router(db);
    let mut watcher = ClipboardWatcher::new();
    watcher.start(
        Arc::new(SystemClipboard),
        marker,
        Arc::new(move |content, is_synthetic| {
            router.on_captured(content, is_synthetic);
        }),
        Duration::from_millis(cli.poll_ms),
    );

    if cli.start_in_queue_mode {
        if let Err(e) = session.set_active(true) {
            tracing::warn!(error = %e, "queue mode on without paste interception");
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&session, std::io::stdin().lock(), &mut out)
        .context("failed to read commands")?;

    watcher.stop();
    session.set_active(false).ok();
    tracing::info!("flowclip stopped");
    Ok(())
}
