//! Display overlays and the preview renderer that applies them to text

use serde::Serialize;

/// A masked slice of one physical line, before highlight styling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMask {
    /// 0-based line
    pub line: usize,
    /// Byte column where the overlay starts
    pub col: usize,
    pub text: String,
}

/// A visual replacement for part of one physical line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtmarkSpec {
    /// 0-based line
    pub line: usize,
    /// Byte column where the overlay starts
    pub col: usize,
    pub masked_text: String,
    pub highlight_group: String,
}

impl ExtmarkSpec {
    pub fn from_line_mask(mask: &LineMask, highlight_group: &str) -> Self {
        Self {
            line: mask.line,
            col: mask.col,
            masked_text: mask.text.clone(),
            highlight_group: highlight_group.to_string(),
        }
    }
}

/// Render overlays onto a copy of `lines`, the way an editor draws overlay
/// virtual text: each overlay covers as many characters as it contains,
/// starting at its byte column, and may run past the end of the line.
///
/// The input lines are never modified.
pub fn render_overlays<S: AsRef<str>>(lines: &[S], overlays: &[ExtmarkSpec]) -> Vec<String> {
    let mut rendered: Vec<Vec<char>> = lines.iter().map(|l| l.as_ref().chars().collect()).collect();

    for overlay in overlays {
        let Some(line) = lines.get(overlay.line) else {
            continue;
        };
        let line = line.as_ref();
        let col = overlay.col.min(line.len());
        let Some(prefix) = line.get(..col) else {
            // Column inside a multi-byte character; nothing sensible to draw
            continue;
        };
        let start = prefix.chars().count();
        let chars = &mut rendered[overlay.line];
        for (i, ch) in overlay.masked_text.chars().enumerate() {
            let idx = start + i;
            if idx < chars.len() {
                chars[idx] = ch;
            } else {
                chars.push(ch);
            }
        }
    }

    rendered.into_iter().map(|chars| chars.into_iter().collect()).collect()
}
