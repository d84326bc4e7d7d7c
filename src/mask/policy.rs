//! Masking policy: which mode applies to a value, and what the masked string is.
//!
//! Precedence is key pattern, then source file pattern, then the default
//! mode. Partial masking only reveals `show_start + show_end` characters when
//! at least `min_mask` characters remain to be hidden; otherwise the whole
//! value is masked.

use crate::config::{MaskMode, MaskingConfig, PartialMode, PartialSettings};
use crate::primitives::{ContentHash, GlobMap};

/// Per-call masking context
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskRequest<'a> {
    pub key: Option<&'a str>,
    /// Originating file name
    pub source: Option<&'a str>,
    /// Overrides the configured partial mode
    pub partial_mode: Option<PartialMode>,
}

impl<'a> MaskRequest<'a> {
    pub fn new(key: Option<&'a str>, source: Option<&'a str>) -> Self {
        Self {
            key,
            source,
            partial_mode: None,
        }
    }
}

/// Masking configuration with its glob patterns compiled
#[derive(Debug, Clone)]
pub struct MaskEngine {
    config: MaskingConfig,
    patterns: GlobMap<MaskMode>,
    sources: GlobMap<MaskMode>,
    fingerprint: ContentHash,
}

impl MaskEngine {
    pub fn new(config: MaskingConfig) -> Self {
        let patterns = GlobMap::compile(&config.patterns);
        let sources = GlobMap::compile(&config.sources);
        let fingerprint = match serde_json::to_vec(&config) {
            Ok(bytes) => ContentHash::of_bytes(&bytes),
            Err(e) => {
                tracing::warn!("Failed to fingerprint masking config: {}", e);
                ContentHash::of_bytes(format!("{:?}", config).as_bytes())
            }
        };
        Self {
            config,
            patterns,
            sources,
            fingerprint,
        }
    }

    pub fn config(&self) -> &MaskingConfig {
        &self.config
    }

    /// Fingerprint of every setting that affects masked output
    pub fn fingerprint(&self) -> &ContentHash {
        &self.fingerprint
    }

    /// Mode for a key/source pair
    pub fn resolve_mode(&self, key: Option<&str>, source: Option<&str>) -> MaskMode {
        if let Some(mode) = key.and_then(|k| self.patterns.lookup(k)) {
            return *mode;
        }
        if let Some(mode) = source.and_then(|s| self.lookup_source(s)) {
            return mode;
        }
        self.config.effective_default_mode()
    }

    fn lookup_source(&self, source: &str) -> Option<MaskMode> {
        if let Some(mode) = self.sources.lookup(source) {
            return Some(*mode);
        }
        // Patterns without a directory part match the file name alone
        let file_name = std::path::Path::new(source).file_name()?.to_str()?;
        if file_name != source {
            return self.sources.lookup(file_name).copied();
        }
        None
    }

    /// Partial parameters in effect for a request, `None` meaning "mask fully"
    pub fn partial_settings(&self, request: &MaskRequest<'_>) -> Option<PartialSettings> {
        request
            .partial_mode
            .unwrap_or(self.config.partial_mode)
            .settings()
    }

    /// Masked display string for `value`
    pub fn determine_masked_value(&self, value: &str, request: &MaskRequest<'_>) -> String {
        match self.resolve_mode(request.key, request.source) {
            MaskMode::None => value.to_string(),
            MaskMode::Full => self.full_mask(value),
            MaskMode::Partial => match self.partial_settings(request) {
                Some(settings) => self.partial_mask(value, settings),
                None => self.full_mask(value),
            },
        }
    }

    /// Like [`determine_masked_value`](Self::determine_masked_value) but keeps
    /// every `\n` of a multi-line value in place, so the result can be split
    /// back into lines. Requires the dynamic (value-length) mask mode.
    pub fn mask_preserving_newlines(&self, value: &str, request: &MaskRequest<'_>) -> String {
        let masked = self.determine_masked_value(value, request);
        let mut masked_chars = masked.chars();
        value
            .chars()
            .map(|original| {
                let replacement = masked_chars.next().unwrap_or(self.config.mask_char);
                if original == '\n' {
                    '\n'
                } else if replacement == '\n' {
                    self.config.mask_char
                } else {
                    replacement
                }
            })
            .collect()
    }

    /// Every character masked: value length, or exactly `mask_length`
    pub fn full_mask(&self, value: &str) -> String {
        let len = self
            .config
            .mask_length
            .unwrap_or_else(|| value.chars().count());
        self.repeat_mask(len)
    }

    pub fn repeat_mask(&self, len: usize) -> String {
        std::iter::repeat(self.config.mask_char).take(len).collect()
    }

    /// Show the first `show_start` and last `show_end` characters when there
    /// is room to hide at least `min_mask` characters in between, against
    /// both the real value length and the output length.
    pub fn partial_mask(&self, value: &str, settings: PartialSettings) -> String {
        let chars: Vec<char> = value.chars().collect();
        let value_len = chars.len();
        let output_len = self.config.mask_length.unwrap_or(value_len);
        let shown = settings.show_start + settings.show_end;

        if !has_room(value_len, shown, settings.min_mask) || !has_room(output_len, shown, settings.min_mask) {
            return self.full_mask(value);
        }

        let middle = output_len - shown;
        let mut masked = String::with_capacity(output_len);
        masked.extend(&chars[..settings.show_start]);
        masked.push_str(&self.repeat_mask(middle));
        masked.extend(&chars[value_len - settings.show_end..]);
        masked
    }
}

fn has_room(len: usize, shown: usize, min_mask: usize) -> bool {
    len > shown && len - shown >= min_mask
}
