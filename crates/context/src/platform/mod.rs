//! Platform-specific implementations.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::MacOSFocus;

// Re-export the appropriate controller for the current platform
#[cfg(target_os = "macos")]
pub type PlatformFocus = MacOSFocus;

#[cfg(not(target_os = "macos"))]
pub type PlatformFocus = crate::provider::NullFocus;

/// Construct the focus controller for this platform.
pub fn platform_focus() -> PlatformFocus {
    #[cfg(target_os = "macos")]
    {
        MacOSFocus::new()
    }
    #[cfg(not(target_os = "macos"))]
    {
        crate::provider::NullFocus
    }
}
