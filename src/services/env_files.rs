//! Deciding whether a buffer is an environment file at all

use crate::config::ShelterConfig;
use crate::primitives::Glob;
use once_cell::sync::Lazy;
use std::path::Path;

static DEFAULT_MATCHER: Lazy<EnvFileMatcher> =
    Lazy::new(|| EnvFileMatcher::compile(&ShelterConfig::default().env_file_patterns));

/// Compiled `env_file_patterns`
#[derive(Debug, Clone)]
pub struct EnvFileMatcher {
    globs: Vec<Glob>,
}

impl EnvFileMatcher {
    /// Compile the configured patterns. An empty list means the default
    /// patterns.
    pub fn new(patterns: &[String]) -> Self {
        if patterns.is_empty() {
            return DEFAULT_MATCHER.clone();
        }
        Self::compile(patterns)
    }

    fn compile(patterns: &[String]) -> Self {
        let globs = patterns
            .iter()
            .filter_map(|pattern| match Glob::new(pattern) {
                Ok(glob) => Some(glob),
                Err(e) => {
                    tracing::warn!("Ignoring invalid env file pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();
        Self { globs }
    }

    /// Match against the file name, or the whole path for patterns that
    /// contain a directory part
    pub fn matches(&self, path: &Path) -> bool {
        let file_name = path.file_name().and_then(|n| n.to_str());
        let full = path.to_str();
        self.globs.iter().any(|glob| {
            let target = if glob.as_str().contains('/') { full } else { file_name };
            target.is_some_and(|t| glob.is_match(t))
        })
    }
}

impl Default for EnvFileMatcher {
    fn default() -> Self {
        DEFAULT_MATCHER.clone()
    }
}

/// One-shot check of a file name against a pattern list
pub fn matches_env_file_pattern(filename: &str, patterns: &[String]) -> bool {
    EnvFileMatcher::new(patterns).matches(Path::new(filename))
}
