//! Peeking at the value under the cursor.
//!
//! Revealing exempts the cursor line from masking until the cursor moves off
//! it or the buffer is left. When the cursor sits inside a multi-line value
//! every line of that value is revealed together.

use crate::model::BufferId;
use crate::plugin_api::BufferSource;
use crate::primitives::ContentHash;
use crate::state::Feature;
use std::collections::BTreeSet;

use super::Shelter;

impl Shelter {
    /// Reveal the cursor line of a sheltered buffer. Returns false when peek
    /// is disabled or there is nothing to reveal.
    pub fn reveal_current_line(&mut self, buffers: &dyn BufferSource, buffer_id: BufferId) -> bool {
        if !self.state.is_enabled(Feature::Peek) || !self.sheltered.contains_key(&buffer_id) {
            return false;
        }
        let Some(cursor) = buffers.cursor_line(buffer_id) else {
            return false;
        };
        let Some(lines) = buffers.get_lines(buffer_id) else {
            return false;
        };

        let content_hash = ContentHash::of_lines(&lines);
        let parsed = self.parsed_variables(&lines, &content_hash);
        let mut reveal: BTreeSet<usize> = parsed
            .iter()
            .filter(|v| !v.is_comment && v.spans_line(cursor))
            .flat_map(|v| v.start_line..=v.end_line)
            .collect();
        reveal.insert(cursor);

        if let Some(previous) = self.peek_buffer.filter(|id| *id != buffer_id) {
            self.state.reset_revealed();
            self.peek_buffer = None;
            self.shelter_buffer(buffers, previous);
        }
        self.state.reset_revealed();
        for line in reveal {
            self.state.reveal_line(line);
        }
        self.peek_buffer = Some(buffer_id);
        self.shelter_buffer(buffers, buffer_id)
    }

    /// Re-mask once the cursor leaves the revealed lines
    pub fn on_cursor_moved(&mut self, buffers: &dyn BufferSource, buffer_id: BufferId) {
        if self.peek_buffer != Some(buffer_id) {
            return;
        }
        let still_revealed = buffers
            .cursor_line(buffer_id)
            .is_some_and(|line| self.state.is_revealed(line));
        if !still_revealed {
            self.hide_revealed(buffers);
        }
    }

    /// Re-mask when the revealed buffer loses focus
    pub fn on_buffer_leave(&mut self, buffers: &dyn BufferSource, buffer_id: BufferId) {
        if self.peek_buffer == Some(buffer_id) {
            self.hide_revealed(buffers);
        }
    }

    pub(super) fn hide_revealed(&mut self, buffers: &dyn BufferSource) {
        let had_revealed = self.state.reset_revealed();
        if let Some(buffer_id) = self.peek_buffer.take() {
            if had_revealed {
                self.shelter_buffer(buffers, buffer_id);
            }
        }
    }
}
