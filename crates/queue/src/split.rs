//! Auto-split of multi-line text captures.

use crate::content::ClipContent;
use std::sync::Arc;

/// Non-blank lines of `text`, in order. `\r\n` endings are handled.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// The payloads a capture becomes in the queue.
///
/// With splitting on, text spanning several non-blank lines becomes one
/// payload per line. Everything else passes through as the original `Arc`.
pub fn expand_capture(content: Arc<ClipContent>, auto_split: bool) -> Vec<Arc<ClipContent>> {
    if !auto_split {
        return vec![content];
    }

    let lines = match content.as_text() {
        Some(text) => split_lines(text),
        None => return vec![content],
    };

    if lines.len() <= 1 {
        return vec![content];
    }

    lines
        .into_iter()
        .map(|line| Arc::new(ClipContent::Text(line)))
        .collect()
}
