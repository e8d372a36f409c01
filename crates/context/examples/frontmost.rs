//! Example: print the frontmost application once a second.
//!
//! Run with: cargo run -p flowclip-context --example frontmost

use flowclip_context::{platform::platform_focus, FocusController};
use std::time::Duration;

fn main() {
    let focus = platform_focus();

    println!("Switch between apps to see focus changes (10 s)...\n");
    for _ in 0..10 {
        match focus.active_app() {
            Some(app) => println!(
                "{:<40} pid={:<8} own={}",
                app.name.as_deref().unwrap_or(&app.bundle_id),
                app.pid.map(|p| p.to_string()).unwrap_or_default(),
                focus.is_own_app_active()
            ),
            None => println!("(no frontmost application)"),
        }
        std::thread::sleep(Duration::from_secs(1));
    }
}
