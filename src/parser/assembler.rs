//! Whole-buffer parsing: drives the line parser across every physical line
//! and emits one [`ParsedVariable`] per finished logical assignment.

use super::comment::{parse_comment_line, parse_inline_comment};
use super::line::{parse_line, Assignment, InlineComment, LineOutcome, MultiLineState};
use crate::model::{ParsedVariable, ParsedVariables};
use crate::primitives::ContentHash;

/// Parse a buffer given as physical lines
pub fn parse_buffer<S: AsRef<str>>(lines: &[S], content_hash: &ContentHash) -> ParsedVariables {
    let mut vars = ParsedVariables::new();
    let mut state = MultiLineState::new();

    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let line_num = idx + 1;

        match parse_line(line, line_num, &mut state) {
            LineOutcome::Blank | LineOutcome::Invalid => {}
            LineOutcome::Comment(_) => {
                vars.extend(parse_comment_line(line, line_num, content_hash));
            }
            LineOutcome::Open { comment } => {
                add_inline_comment(&mut vars, comment, line_num, content_hash);
            }
            LineOutcome::Complete {
                assignment,
                comment,
            } => {
                vars.insert(finalize(assignment, content_hash));
                add_inline_comment(&mut vars, comment, line_num, content_hash);
            }
        }
    }

    if let Some(assignment) = state.finish_at_eof() {
        tracing::debug!(
            "Value of '{}' starting at line {} runs to end of buffer",
            assignment.key,
            assignment.start_line
        );
        vars.insert(finalize(assignment, content_hash));
    }

    vars
}

fn add_inline_comment(
    vars: &mut ParsedVariables,
    comment: Option<InlineComment>,
    line_num: usize,
    content_hash: &ContentHash,
) {
    if let Some(comment) = comment {
        vars.extend(parse_inline_comment(
            &comment.text,
            comment.col,
            line_num,
            content_hash,
        ));
    }
}

fn finalize(assignment: Assignment, content_hash: &ContentHash) -> ParsedVariable {
    let has_newlines = assignment.value.contains('\n');
    ParsedVariable {
        is_multi_line: assignment.start_line < assignment.end_line,
        has_newlines,
        key: assignment.key,
        value: assignment.value,
        quote_char: assignment.quote_char,
        start_line: assignment.start_line,
        end_line: assignment.end_line,
        eq_pos: assignment.eq_pos,
        is_comment: false,
        is_inline_comment: false,
        content_hash: content_hash.clone(),
        segments: assignment.segments,
    }
}
