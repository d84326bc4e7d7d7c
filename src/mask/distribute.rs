//! Splitting one computed mask back across the physical lines of a value.
//!
//! Every overlay produced here covers at least the full extent of the content
//! it hides; if the mask runs short the gap is filled with the mask
//! character, never left showing the real text.

use super::policy::{MaskEngine, MaskRequest};
use crate::config::MaskMode;
use crate::model::{LineMask, ParsedVariable, QuoteChar, ValueSegment};

/// Compute the per-line overlays for one variable.
///
/// Returns an empty list when the variable needs no overlay (mode `none` or
/// empty value).
pub fn compute_line_masks(
    variable: &ParsedVariable,
    engine: &MaskEngine,
    source: Option<&str>,
) -> Vec<LineMask> {
    if variable.value.is_empty() || variable.segments.is_empty() {
        return Vec::new();
    }
    let request = MaskRequest::new(Some(&variable.key), source);
    if engine.resolve_mode(request.key, request.source) == MaskMode::None {
        return Vec::new();
    }

    if let Some(fixed) = engine.config().mask_length {
        if variable.segments.len() == 1 {
            let masked = engine.determine_masked_value(&variable.value, &request);
            let segment = &variable.segments[0];
            let mut text = fit_to_width(&masked, segment.width);
            text.push_str(&segment.suffix);
            return vec![wrap_segment(segment, text, variable.quote_char, true, true)];
        }
        return distribute_fixed(variable, engine, fixed);
    }

    if variable.has_newlines {
        let masked = engine.mask_preserving_newlines(&variable.value, &request);
        distribute_quoted(variable, &masked, engine.config().mask_char)
    } else {
        let masked = engine.determine_masked_value(&variable.value, &request);
        distribute_continuation(variable, &masked, engine.config().mask_char)
    }
}

/// Slice a mask across backslash-continued (or single) lines: each line
/// consumes as many mask characters as it has content characters and keeps
/// its own continuation suffix.
pub fn distribute_continuation(
    variable: &ParsedVariable,
    masked: &str,
    mask_char: char,
) -> Vec<LineMask> {
    let mut remaining = masked.chars();
    let last = variable.segments.len() - 1;
    let mut out = Vec::with_capacity(variable.segments.len());

    for (i, segment) in variable.segments.iter().enumerate() {
        if segment.width == 0 {
            continue;
        }
        let mut text: String = remaining.by_ref().take(segment.width).collect();
        pad_with(&mut text, segment.width, mask_char);
        if i == last && variable.segments.len() == 1 {
            // Single line: anything left over belongs to this line too
            text.extend(remaining.by_ref());
        }
        text.push_str(&segment.suffix);
        out.push(wrap_segment(segment, text, variable.quote_char, i == 0, i == last));
    }
    out
}

/// Pair the lines of a newline-preserving mask with the physical lines of a
/// quoted multi-line value.
pub fn distribute_quoted(variable: &ParsedVariable, masked: &str, mask_char: char) -> Vec<LineMask> {
    let last = variable.segments.len() - 1;
    let mut mask_lines = masked.split('\n');
    let mut out = Vec::with_capacity(variable.segments.len());

    for (i, segment) in variable.segments.iter().enumerate() {
        let mut text = mask_lines.next().unwrap_or("").to_string();
        if segment.width == 0 {
            continue;
        }
        pad_with(&mut text, segment.width, mask_char);
        out.push(wrap_segment(segment, text, variable.quote_char, i == 0, i == last));
    }
    out
}

/// Fixed mask length on a multi-line value: every physical line gets its own
/// full mask of `mask_length`, fitted to that line's content.
fn distribute_fixed(variable: &ParsedVariable, engine: &MaskEngine, mask_length: usize) -> Vec<LineMask> {
    let last = variable.segments.len() - 1;
    let line_mask = engine.repeat_mask(mask_length);
    variable
        .segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| segment.width > 0)
        .map(|(i, segment)| {
            let mut text = fit_to_width(&line_mask, segment.width);
            text.push_str(&segment.suffix);
            wrap_segment(segment, text, variable.quote_char, i == 0, i == last)
        })
        .collect()
}

/// Fit a fixed-length mask over `width` characters of real content: pad with
/// spaces when the content is longer, truncate when it is shorter.
pub fn fit_to_width(mask: &str, width: usize) -> String {
    let len = mask.chars().count();
    if len >= width {
        mask.chars().take(width).collect()
    } else {
        let mut text = mask.to_string();
        text.extend(std::iter::repeat(' ').take(width - len));
        text
    }
}

fn pad_with(text: &mut String, width: usize, fill: char) {
    let len = text.chars().count();
    if len < width {
        text.extend(std::iter::repeat(fill).take(width - len));
    }
}

/// Turn a masked slice into an overlay, adding the opening quote on the first
/// line and the closing quote on the last.
fn wrap_segment(
    segment: &ValueSegment,
    mut text: String,
    quote: Option<QuoteChar>,
    first: bool,
    last: bool,
) -> LineMask {
    let mut col = segment.col;
    if let Some(quote) = quote {
        if last {
            text.push(quote.as_char());
        }
        if first {
            text.insert(0, quote.as_char());
            col -= 1;
        }
    }
    LineMask {
        line: segment.line - 1,
        col,
        text,
    }
}
