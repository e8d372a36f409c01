//! macOS focus controller over NSWorkspace and NSApplication.

use crate::provider::FocusController;
use crate::state::AppInfo;

// Native Cocoa imports for frontmost app detection
use objc::runtime::{Class, Object, NO};
use objc::{msg_send, sel, sel_impl};

/// Focus controller backed by native Cocoa calls, no subprocesses.
#[derive(Debug, Default)]
pub struct MacOSFocus;

impl MacOSFocus {
    pub fn new() -> Self {
        Self
    }
}

impl FocusController for MacOSFocus {
    fn active_app(&self) -> Option<AppInfo> {
        get_frontmost_app()
    }

    fn yield_focus(&self) {
        deactivate_current_app();
    }
}

/// Get the frontmost application via
/// `[[NSWorkspace sharedWorkspace] frontmostApplication]`.
fn get_frontmost_app() -> Option<AppInfo> {
    unsafe {
        let workspace_class = Class::get("NSWorkspace")?;

        let shared_workspace: *mut Object = msg_send![workspace_class, sharedWorkspace];
        if shared_workspace.is_null() {
            return None;
        }

        let frontmost_app: *mut Object = msg_send![shared_workspace, frontmostApplication];
        if frontmost_app.is_null() {
            return None;
        }

        // pid_t is i32 on macOS
        let pid: i32 = msg_send![frontmost_app, processIdentifier];

        let bundle_id_ns: *mut Object = msg_send![frontmost_app, bundleIdentifier];
        let bundle_id = nsstring_to_string(bundle_id_ns).unwrap_or_default();

        let name_ns: *mut Object = msg_send![frontmost_app, localizedName];
        let name = nsstring_to_string(name_ns);

        Some(AppInfo {
            bundle_id,
            name,
            pid: u32::try_from(pid).ok(),
        })
    }
}

#[link(name = "AppKit", kind = "framework")]
extern "C" {
    /// Nil until something creates the shared application.
    static NSApp: *mut Object;
}

/// `[NSApp deactivate]` on the main thread: the window server then
/// activates the application that was frontmost before us.
///
/// A process without an `NSApplication` (the terminal daemon) owns no window
/// to give up, so nothing is sent.
fn deactivate_current_app() {
    unsafe {
        let app = NSApp;
        if app.is_null() {
            tracing::debug!("no NSApplication in this process, focus stays put");
            return;
        }

        let _: () = msg_send![app,
            performSelectorOnMainThread: sel!(deactivate)
            withObject: std::ptr::null_mut::<Object>()
            waitUntilDone: NO];
    }
    tracing::debug!("yielded input focus");
}

/// Convert NSString to Rust String.
unsafe fn nsstring_to_string(nsstring: *mut Object) -> Option<String> {
    if nsstring.is_null() {
        return None;
    }

    let c_str: *const std::os::raw::c_char = msg_send![nsstring, UTF8String];
    if c_str.is_null() {
        return None;
    }

    let rust_str = std::ffi::CStr::from_ptr(c_str).to_str().ok()?;
    Some(rust_str.to_string())
}
