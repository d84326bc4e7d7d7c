//! Single physical line parsing.
//!
//! [`parse_line`] consumes one line at a time and threads a
//! [`MultiLineState`] between calls so quoted strings that span lines and
//! backslash continuations come out as one logical assignment.

use crate::model::{QuoteChar, ValueSegment};

/// How an open value continues onto the next physical line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Inside a quoted string whose closing quote has not been seen yet.
    /// Lines are joined with `\n`.
    Quoted(QuoteChar),
    /// Previous line ended with a backslash. Lines are joined without a separator.
    Backslash,
}

/// Comment text found on a line, with the byte column where the text (after `#`) starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineComment {
    pub text: String,
    pub col: usize,
}

/// A completed logical assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: String,
    pub quote_char: Option<QuoteChar>,
    pub eq_pos: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub continuation: Option<Continuation>,
    pub segments: Vec<ValueSegment>,
}

#[derive(Debug, Clone)]
struct OpenValue {
    assignment: Assignment,
    kind: Continuation,
}

/// State carried between consecutive [`parse_line`] calls
#[derive(Debug, Clone, Default)]
pub struct MultiLineState {
    open: Option<OpenValue>,
}

impl MultiLineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a value started on an earlier line is still being accumulated
    pub fn in_multi_line(&self) -> bool {
        self.open.is_some()
    }

    /// The kind of continuation in progress, if any
    pub fn continuation(&self) -> Option<Continuation> {
        self.open.as_ref().map(|o| o.kind)
    }

    pub fn reset(&mut self) {
        self.open = None;
    }

    /// Close whatever is still open when input ends. An unterminated quote
    /// simply runs to the end of the buffer.
    pub fn finish_at_eof(&mut self) -> Option<Assignment> {
        self.open.take().map(|open| open.assignment)
    }
}

/// Result of parsing one physical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Empty or whitespace-only line
    Blank,
    /// Not an assignment (no `=`, empty or malformed key)
    Invalid,
    /// Full-line `#` comment
    Comment(InlineComment),
    /// Line started or continued a value that is not finished yet
    Open { comment: Option<InlineComment> },
    /// Line finished a logical assignment
    Complete {
        assignment: Assignment,
        comment: Option<InlineComment>,
    },
}

/// Parse one physical line (`line_num` is 1-based)
pub fn parse_line(line: &str, line_num: usize, state: &mut MultiLineState) -> LineOutcome {
    match state.open.take() {
        Some(open) => continue_value(line, line_num, open, state),
        None => start_value(line, line_num, state),
    }
}

fn start_value(line: &str, line_num: usize, state: &mut MultiLineState) -> LineOutcome {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return LineOutcome::Blank;
    }
    if trimmed.starts_with('#') {
        let hash_col = line.len() - trimmed.len();
        return LineOutcome::Comment(InlineComment {
            text: line[hash_col + 1..].to_string(),
            col: hash_col + 1,
        });
    }

    let Some(eq_pos) = find_unescaped_eq(line) else {
        return LineOutcome::Invalid;
    };
    let Some(key) = normalize_key(&line[..eq_pos]) else {
        return LineOutcome::Invalid;
    };

    let after_eq = eq_pos + 1;
    let rest = &line[after_eq..];
    let value_col = after_eq + (rest.len() - rest.trim_start().len());

    let mut assignment = Assignment {
        key,
        value: String::new(),
        quote_char: None,
        eq_pos,
        start_line: line_num,
        end_line: line_num,
        continuation: None,
        segments: Vec::new(),
    };

    let quote = line[value_col..].chars().next().and_then(QuoteChar::from_char);
    if let Some(quote) = quote {
        assignment.quote_char = Some(quote);
        let content_col = value_col + 1;
        match find_closing_quote(line, content_col, quote) {
            Some(close) => {
                assignment.value = line[content_col..close].to_string();
                assignment.segments.push(segment(line, line_num, content_col, close, close));
                let comment = find_trailing_comment(line, close + 1);
                LineOutcome::Complete {
                    assignment,
                    comment,
                }
            }
            None => {
                assignment.value = line[content_col..].to_string();
                assignment.segments.push(segment(line, line_num, content_col, line.len(), line.len()));
                assignment.continuation = Some(Continuation::Quoted(quote));
                state.open = Some(OpenValue {
                    assignment,
                    kind: Continuation::Quoted(quote),
                });
                LineOutcome::Open { comment: None }
            }
        }
    } else {
        let (content_end, suffix_end, continues, comment) = split_unquoted(line, value_col);
        assignment.value = line[value_col..content_end].to_string();
        assignment
            .segments
            .push(segment(line, line_num, value_col, content_end, suffix_end));
        if continues {
            assignment.continuation = Some(Continuation::Backslash);
            state.open = Some(OpenValue {
                assignment,
                kind: Continuation::Backslash,
            });
            LineOutcome::Open { comment }
        } else {
            LineOutcome::Complete {
                assignment,
                comment,
            }
        }
    }
}

fn continue_value(
    line: &str,
    line_num: usize,
    mut open: OpenValue,
    state: &mut MultiLineState,
) -> LineOutcome {
    open.assignment.end_line = line_num;

    match open.kind {
        Continuation::Quoted(quote) => {
            open.assignment.value.push('\n');
            match find_closing_quote(line, 0, quote) {
                Some(close) => {
                    open.assignment.value.push_str(&line[..close]);
                    open.assignment.segments.push(segment(line, line_num, 0, close, close));
                    let comment = find_trailing_comment(line, close + 1);
                    LineOutcome::Complete {
                        assignment: open.assignment,
                        comment,
                    }
                }
                None => {
                    open.assignment.value.push_str(line);
                    open.assignment
                        .segments
                        .push(segment(line, line_num, 0, line.len(), line.len()));
                    state.open = Some(open);
                    LineOutcome::Open { comment: None }
                }
            }
        }
        Continuation::Backslash => {
            let content_col = line.len() - line.trim_start().len();
            let (content_end, suffix_end, continues, comment) = split_unquoted(line, content_col);
            open.assignment.value.push_str(&line[content_col..content_end]);
            open.assignment
                .segments
                .push(segment(line, line_num, content_col, content_end, suffix_end));
            if continues {
                state.open = Some(open);
                LineOutcome::Open { comment }
            } else {
                LineOutcome::Complete {
                    assignment: open.assignment,
                    comment,
                }
            }
        }
    }
}

fn segment(line: &str, line_num: usize, start: usize, end: usize, suffix_end: usize) -> ValueSegment {
    ValueSegment {
        line: line_num,
        col: start,
        width: line[start..end].chars().count(),
        suffix: line[end..suffix_end].to_string(),
    }
}

/// Split an unquoted value starting at `start` into content, continuation
/// marker and trailing comment.
///
/// Returns `(content_end, suffix_end, continues, comment)` where
/// `line[start..content_end]` is the value content and
/// `line[content_end..suffix_end]` is the backslash kept visible when the
/// line continues.
fn split_unquoted(line: &str, start: usize) -> (usize, usize, bool, Option<InlineComment>) {
    let comment_hash = find_comment_hash(line, start);
    let body_end = comment_hash.unwrap_or(line.len());
    let body = line[start..body_end].trim_end();
    let mut content_end = start + body.len();
    let mut suffix_end = content_end;
    let mut continues = false;

    if body.ends_with('\\') {
        continues = true;
        suffix_end = content_end;
        content_end -= 1;
    }

    let comment = comment_hash.map(|hash| InlineComment {
        text: line[hash + 1..].to_string(),
        col: hash + 1,
    });

    (content_end, suffix_end, continues, comment)
}

/// Position of a `#` that starts a comment at or after `from`.
///
/// A `#` only starts a comment at the start of the line or after whitespace,
/// so `abc#123` stays part of the value.
fn find_comment_hash(line: &str, from: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    (from..bytes.len()).find(|&i| bytes[i] == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()))
}

/// Comment after a closing quote: a `#` directly after the quote or after whitespace
fn find_trailing_comment(line: &str, after_quote: usize) -> Option<InlineComment> {
    let bytes = line.as_bytes();
    let hash = (after_quote..bytes.len()).find(|&i| {
        bytes[i] == b'#' && (i == after_quote || bytes[i - 1].is_ascii_whitespace())
    })?;
    Some(InlineComment {
        text: line[hash + 1..].to_string(),
        col: hash + 1,
    })
}

/// Byte index of the first `=` not preceded by a backslash
fn find_unescaped_eq(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\\' if !escaped => escaped = true,
            b'=' if !escaped => return Some(i),
            _ => escaped = false,
        }
    }
    None
}

/// Byte index of the closing `quote` at or after `from`.
///
/// Backslash escapes the next character inside double quotes only; single
/// quotes take everything literally.
pub(crate) fn find_closing_quote(text: &str, from: usize, quote: QuoteChar) -> Option<usize> {
    let target = quote.as_char() as u8;
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && quote == QuoteChar::Double {
            i += 2;
            continue;
        }
        if b == target {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Trim a raw key and strip an `export` prefix. Keys must be non-empty and contain no whitespace.
fn normalize_key(raw: &str) -> Option<String> {
    let mut key = raw.trim();
    if let Some(rest) = key.strip_prefix("export") {
        if rest.starts_with(char::is_whitespace) {
            key = rest.trim_start();
        }
    }
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some(key.to_string())
}
