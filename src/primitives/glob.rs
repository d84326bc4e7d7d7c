//! Minimal glob compiler used for key patterns, source patterns and env-file
//! name patterns.
//!
//! Only two wildcards are recognised: `*` (any run of characters, greedy) and
//! `?` (exactly one character). Everything else matches literally and
//! matching is case-sensitive. Patterns are compiled to an anchored regex once
//! and the compiled matcher is reused for every lookup.

use regex::Regex;
use std::fmt;

/// A compiled glob pattern
#[derive(Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
    /// Number of literal (non-wildcard) characters, used to rank overlapping patterns
    literal_len: usize,
}

impl Glob {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut source = String::with_capacity(pattern.len() * 2 + 2);
        let mut literal_len = 0;
        source.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                _ => {
                    literal_len += 1;
                    let mut buf = [0u8; 4];
                    source.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
                }
            }
        }
        source.push('$');

        Ok(Self {
            pattern: pattern.to_string(),
            regex: Regex::new(&source)?,
            literal_len,
        })
    }

    /// Check whether `text` matches this pattern in full
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The original pattern text
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Count of literal characters in the pattern
    pub fn literal_len(&self) -> usize {
        self.literal_len
    }
}

impl fmt::Debug for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Glob").field(&self.pattern).finish()
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for Glob {}

/// An ordered set of globs each mapped to a value.
///
/// Lookups return the value of the most specific matching pattern: the one
/// with the most literal characters, ties broken by pattern text so the
/// result never depends on configuration map ordering.
#[derive(Debug, Clone)]
pub struct GlobMap<T> {
    entries: Vec<(Glob, T)>,
}

impl<T: Clone> GlobMap<T> {
    /// Compile every `(pattern, value)` pair. Invalid patterns are logged and skipped.
    pub fn compile<'a, I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a T)>,
        T: 'a,
    {
        let mut entries: Vec<(Glob, T)> = patterns
            .into_iter()
            .filter_map(|(pattern, value)| match Glob::new(pattern) {
                Ok(glob) => Some((glob, value.clone())),
                Err(e) => {
                    tracing::warn!("Ignoring invalid pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        entries.sort_by(|(a, _), (b, _)| {
            b.literal_len()
                .cmp(&a.literal_len())
                .then_with(|| a.as_str().cmp(b.as_str()))
        });

        Self { entries }
    }

    /// Value of the best matching pattern, if any
    pub fn lookup(&self, text: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(glob, _)| glob.is_match(text))
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T> Default for GlobMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}
