//! Parsed environment variable records

use crate::primitives::ContentHash;
use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;

/// Quote character that wrapped a raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuoteChar {
    Double,
    Single,
}

impl QuoteChar {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '"' => Some(QuoteChar::Double),
            '\'' => Some(QuoteChar::Single),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            QuoteChar::Double => '"',
            QuoteChar::Single => '\'',
        }
    }
}

/// Where a piece of a value sits on one physical line.
///
/// Multi-line values have one segment per physical line; single-line values
/// have exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueSegment {
    /// 1-based physical line number
    pub line: usize,
    /// Byte column where the value content starts (after any opening quote)
    pub col: usize,
    /// Width of the content in characters
    pub width: usize,
    /// Text that follows the content on this line and stays visible in the
    /// overlay (the continuation backslash, when there is one)
    pub suffix: String,
}

/// One logical environment-variable assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVariable {
    pub key: String,
    /// Value with quotes stripped; contains `\n` for quoted multi-line strings
    pub value: String,
    pub quote_char: Option<QuoteChar>,
    /// 1-based, inclusive
    pub start_line: usize,
    /// 1-based, inclusive
    pub end_line: usize,
    /// Byte column of `=` on the start line
    pub eq_pos: usize,
    pub is_multi_line: bool,
    pub has_newlines: bool,
    pub is_comment: bool,
    pub is_inline_comment: bool,
    pub content_hash: ContentHash,
    pub segments: Vec<ValueSegment>,
}

impl ParsedVariable {
    /// Identity of this record within one parse pass
    pub fn id(&self) -> VariableId {
        VariableId {
            line: self.start_line,
            col: self.eq_pos,
            key: self.key.clone(),
        }
    }

    /// Whether any of this variable's physical lines is `line` (1-based)
    pub fn spans_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// Composite identity of a parsed variable: position first, then key.
///
/// Live assignments are unique per `(key, start line)`; comment-embedded
/// pairs also need the column since one comment may hold several pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    pub line: usize,
    pub col: usize,
    pub key: String,
}

/// All variables found in one buffer state, ordered by position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedVariables {
    entries: BTreeMap<VariableId, ParsedVariable>,
}

impl ParsedVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Returns the record previously stored under the same identity.
    pub fn insert(&mut self, variable: ParsedVariable) -> Option<ParsedVariable> {
        self.entries.insert(variable.id(), variable)
    }

    pub fn extend(&mut self, other: ParsedVariables) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in buffer order
    pub fn iter(&self) -> btree_map::Values<'_, VariableId, ParsedVariable> {
        self.entries.values()
    }

    /// Every occurrence of `key`, comments included, in buffer order
    pub fn occurrences<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ParsedVariable> {
        self.entries.values().filter(move |v| v.key == key)
    }

    /// The live assignment that takes effect for `key`: the last one in the file
    pub fn latest(&self, key: &str) -> Option<&ParsedVariable> {
        self.entries
            .values()
            .filter(|v| !v.is_comment && v.key == key)
            .last()
    }

    /// Index live assignments by key, later occurrences overriding earlier ones
    pub fn by_key(&self) -> HashMap<&str, &ParsedVariable> {
        let mut map = HashMap::new();
        for variable in self.entries.values().filter(|v| !v.is_comment) {
            map.insert(variable.key.as_str(), variable);
        }
        map
    }
}

impl<'a> IntoIterator for &'a ParsedVariables {
    type Item = &'a ParsedVariable;
    type IntoIter = btree_map::Values<'a, VariableId, ParsedVariable>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl FromIterator<ParsedVariable> for ParsedVariables {
    fn from_iter<I: IntoIterator<Item = ParsedVariable>>(iter: I) -> Self {
        let mut vars = ParsedVariables::new();
        for variable in iter {
            vars.insert(variable);
        }
        vars
    }
}
