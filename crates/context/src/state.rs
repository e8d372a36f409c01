//! Application identity.

use serde::{Deserialize, Serialize};

/// Information about a running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    /// Bundle ID (e.g., "com.apple.TextEdit")
    pub bundle_id: String,

    /// Display name (e.g., "TextEdit")
    pub name: Option<String>,

    /// Process identifier, when the platform reports one.
    #[serde(default)]
    pub pid: Option<u32>,
}

impl AppInfo {
    /// Whether this is the current process.
    pub fn is_current_process(&self) -> bool {
        self.pid == Some(std::process::id())
    }
}
