//! Focus controller trait.
//!
//! Abstracts the platform so the interception logic stays testable without
//! a window server.

use crate::state::AppInfo;
use std::sync::Arc;

/// Reads and hands off input focus.
pub trait FocusController: Send + Sync {
    /// The application currently holding input focus.
    fn active_app(&self) -> Option<AppInfo>;

    /// Whether this process holds input focus.
    fn is_own_app_active(&self) -> bool {
        self.active_app()
            .map(|app| app.is_current_process())
            .unwrap_or(false)
    }

    /// Give focus back to the previously active application.
    ///
    /// Asynchronous at the OS level: callers wait before sending input.
    fn yield_focus(&self);
}

/// Shared focus controller handle.
pub type FocusRef = Arc<dyn FocusController>;

/// Null implementation for headless use and unsupported platforms.
pub struct NullFocus;

impl FocusController for NullFocus {
    fn active_app(&self) -> Option<AppInfo> {
        None
    }

    fn is_own_app_active(&self) -> bool {
        false
    }

    fn yield_focus(&self) {}
}
