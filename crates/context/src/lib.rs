//! Focus awareness for flowclip.
//!
//! The interception manager needs to know whether flowclip itself holds
//! input focus (the queue panel was clicked) and, if so, to hand focus back
//! to the application the user was working in before emitting keystrokes.
//!
//! - `state.rs`    - `AppInfo`
//! - `provider.rs` - `FocusController` trait and a null implementation
//! - `platform/`   - macOS implementation over NSWorkspace / NSApplication

mod provider;
mod state;

pub mod platform;

pub use provider::{FocusController, FocusRef, NullFocus};
pub use state::AppInfo;
