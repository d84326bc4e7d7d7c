//! `KEY=value` pairs embedded in comments.
//!
//! Documentation-style comments such as `# example: API_KEY=abc123` often
//! carry real secrets, so they are scanned and masked like live assignments.

use super::line::find_closing_quote;
use crate::model::{ParsedVariable, ParsedVariables, QuoteChar, ValueSegment};
use crate::primitives::ContentHash;

/// Scan a full-line comment (`line` includes the leading `#`)
pub fn parse_comment_line(line: &str, line_num: usize, content_hash: &ContentHash) -> ParsedVariables {
    let trimmed = line.trim_start();
    let Some(text) = trimmed.strip_prefix('#') else {
        return ParsedVariables::new();
    };
    let base_col = line.len() - text.len();
    scan_pairs(text, base_col, line_num, content_hash, false)
}

/// Scan the text of a trailing comment. `comment_col` is the byte column of
/// `comment_text` within its line.
pub fn parse_inline_comment(
    comment_text: &str,
    comment_col: usize,
    line_num: usize,
    content_hash: &ContentHash,
) -> ParsedVariables {
    scan_pairs(comment_text, comment_col, line_num, content_hash, true)
}

fn scan_pairs(
    text: &str,
    base_col: usize,
    line_num: usize,
    content_hash: &ContentHash,
    inline: bool,
) -> ParsedVariables {
    let mut vars = ParsedVariables::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find('=') {
        let eq = pos + rel;

        let key_start = text[pos..eq]
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| pos + i + c.len_utf8())
            .unwrap_or(pos);
        let key = text[key_start..eq].trim_start_matches('#');
        if key.is_empty() {
            pos = eq + 1;
            continue;
        }

        let (value_start, value_end, next, quote_char) = scan_value(text, eq + 1);
        if value_start == value_end {
            pos = next.max(eq + 1);
            continue;
        }

        let value = &text[value_start..value_end];
        vars.insert(ParsedVariable {
            key: key.to_string(),
            value: value.to_string(),
            quote_char,
            start_line: line_num,
            end_line: line_num,
            eq_pos: base_col + eq,
            is_multi_line: false,
            has_newlines: false,
            is_comment: true,
            is_inline_comment: inline,
            content_hash: content_hash.clone(),
            segments: vec![ValueSegment {
                line: line_num,
                col: base_col + value_start,
                width: value.chars().count(),
                suffix: String::new(),
            }],
        });
        pos = next;
    }

    vars
}

/// Locate the value after `=` at `start`.
///
/// Returns `(value_start, value_end, resume_at, quote)`. A quoted value needs
/// its closing quote on the same line; otherwise the value is read unquoted up
/// to the next whitespace.
fn scan_value(text: &str, start: usize) -> (usize, usize, usize, Option<QuoteChar>) {
    if let Some(quote) = text[start..].chars().next().and_then(QuoteChar::from_char) {
        if let Some(close) = find_closing_quote(text, start + 1, quote) {
            return (start + 1, close, close + 1, Some(quote));
        }
    }

    let end = text[start..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, _)| start + i)
        .unwrap_or(text.len());
    (start, end, end, None)
}
