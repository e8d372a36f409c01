//! Captured clipboard payloads.

use std::sync::Arc;

/// Maximum characters kept in a panel preview.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// A clipboard payload as captured from the system clipboard.
///
/// The capture layer owns these; the queue holds them behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClipContent {
    Text(String),
    Image(ImageContent),
}

/// Raw RGBA image data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageContent {
    pub width: usize,
    pub height: usize,
    pub bytes: Arc<[u8]>,
}

impl ClipContent {
    pub fn text(text: impl Into<String>) -> Self {
        ClipContent::Text(text.into())
    }

    /// The textual form of this payload, if it has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ClipContent::Text(text) => Some(text),
            ClipContent::Image(_) => None,
        }
    }

    /// Short single-line preview for display.
    pub fn preview(&self) -> Option<String> {
        let text = self.as_text()?;
        let line = text.trim().replace(['\n', '\r', '\t'], " ");
        if line.chars().count() > PREVIEW_MAX_CHARS {
            let cut: String = line.chars().take(PREVIEW_MAX_CHARS).collect();
            Some(format!("{cut}..."))
        } else {
            Some(line)
        }
    }
}

impl From<&str> for ClipContent {
    fn from(text: &str) -> Self {
        ClipContent::Text(text.to_string())
    }
}

impl From<String> for ClipContent {
    fn from(text: String) -> Self {
        ClipContent::Text(text)
    }
}
