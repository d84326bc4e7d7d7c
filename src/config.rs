//! Shelter configuration.
//!
//! Loaded from JSON. Every field has a default, and out-of-range values are
//! clamped toward more masking instead of being rejected: a bad config must
//! never reveal a value.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::state::Feature;

/// Masking mode for a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MaskMode {
    /// Every character is masked
    Full,
    /// The first and last few characters stay visible
    Partial,
    /// Shown as-is
    None,
}

/// Resolved partial-masking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub struct PartialSettings {
    pub show_start: usize,
    pub show_end: usize,
    pub min_mask: usize,
}

impl Default for PartialSettings {
    fn default() -> Self {
        Self {
            show_start: 3,
            show_end: 3,
            min_mask: 3,
        }
    }
}

/// `partial_mode` setting: `false`, `true` (defaults) or custom parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawPartialMode", into = "RawPartialMode")]
pub enum PartialMode {
    #[default]
    Disabled,
    Enabled,
    Custom(PartialSettings),
}

impl PartialMode {
    /// Parameters to use, or `None` when partial masking is off
    pub fn settings(&self) -> Option<PartialSettings> {
        match self {
            PartialMode::Disabled => None,
            PartialMode::Enabled => Some(PartialSettings::default()),
            PartialMode::Custom(settings) => Some(*settings),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, PartialMode::Disabled)
    }
}

/// Wire form of [`PartialMode`]. Accepts signed numbers so negative input can be clamped.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawPartialMode {
    Flag(bool),
    Custom(RawPartialSettings),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RawPartialSettings {
    pub show_start: i64,
    pub show_end: i64,
    pub min_mask: i64,
}

impl Default for RawPartialSettings {
    fn default() -> Self {
        let defaults = PartialSettings::default();
        Self {
            show_start: defaults.show_start as i64,
            show_end: defaults.show_end as i64,
            min_mask: defaults.min_mask as i64,
        }
    }
}

impl From<RawPartialMode> for PartialMode {
    fn from(raw: RawPartialMode) -> Self {
        match raw {
            RawPartialMode::Flag(true) => PartialMode::Enabled,
            RawPartialMode::Flag(false) => PartialMode::Disabled,
            RawPartialMode::Custom(raw) => PartialMode::Custom(PartialSettings {
                show_start: clamp_non_negative("show_start", raw.show_start, 0),
                show_end: clamp_non_negative("show_end", raw.show_end, 0),
                min_mask: clamp_non_negative("min_mask", raw.min_mask, 1).max(1),
            }),
        }
    }
}

impl From<PartialMode> for RawPartialMode {
    fn from(mode: PartialMode) -> Self {
        match mode {
            PartialMode::Disabled => RawPartialMode::Flag(false),
            PartialMode::Enabled => RawPartialMode::Flag(true),
            PartialMode::Custom(s) => RawPartialMode::Custom(RawPartialSettings {
                show_start: s.show_start as i64,
                show_end: s.show_end as i64,
                min_mask: s.min_mask as i64,
            }),
        }
    }
}

fn clamp_non_negative(name: &str, value: i64, fallback: usize) -> usize {
    if value < 0 {
        tracing::warn!("partial_mode.{} = {} is negative, using {}", name, value, fallback);
        fallback
    } else {
        value as usize
    }
}

/// Masking policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MaskingConfig {
    /// Character used for masking. Only the first character of the string is used.
    #[serde(deserialize_with = "deserialize_mask_char")]
    #[schemars(with = "String")]
    pub mask_char: char,

    /// `false`, `true`, or `{ "show_start": 3, "show_end": 3, "min_mask": 3 }`
    #[schemars(with = "RawPartialMode")]
    pub partial_mode: PartialMode,

    /// Fixed mask length; unset or non-positive masks to the value's own length
    #[serde(deserialize_with = "deserialize_mask_length")]
    #[schemars(with = "Option<i64>")]
    pub mask_length: Option<usize>,

    /// Key glob -> mode. Takes precedence over everything else.
    pub patterns: BTreeMap<String, MaskMode>,

    /// Source file name glob -> mode
    pub sources: BTreeMap<String, MaskMode>,

    /// Mode when no pattern or source matches. Defaults to `partial` when
    /// partial mode is enabled, `full` otherwise.
    pub default_mode: Option<MaskMode>,

    /// Highlight group for masked text
    pub highlight_group: String,

    /// Leave values found inside comments unmasked
    pub skip_comments: bool,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            mask_char: '*',
            partial_mode: PartialMode::Disabled,
            mask_length: None,
            patterns: BTreeMap::new(),
            sources: BTreeMap::new(),
            default_mode: None,
            highlight_group: "Comment".to_string(),
            skip_comments: false,
        }
    }
}

impl MaskingConfig {
    /// Mode used when neither a key pattern nor a source pattern matches
    pub fn effective_default_mode(&self) -> MaskMode {
        self.default_mode.unwrap_or(if self.partial_mode.is_enabled() {
            MaskMode::Partial
        } else {
            MaskMode::Full
        })
    }
}

fn deserialize_mask_char<'de, D: Deserializer<'de>>(deserializer: D) -> Result<char, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let mut chars = raw.chars();
    match chars.next() {
        Some(c) => {
            if chars.next().is_some() {
                tracing::warn!("mask_char '{}' has more than one character, using '{}'", raw, c);
            }
            Ok(c)
        }
        None => {
            tracing::warn!("mask_char is empty, using '*'");
            Ok('*')
        }
    }
}

fn deserialize_mask_length<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<usize>, D::Error> {
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(match raw {
        Some(n) if n > 0 => Some(n as usize),
        Some(n) => {
            if n < 0 {
                tracing::warn!("mask_length = {} is negative, masking to value length", n);
            }
            None
        }
        None => None,
    })
}

/// Initial on/off state of each feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ModulesConfig {
    /// Mask values in env-file buffers
    pub files: bool,
    /// Mask values in hover/peek windows
    pub peek: bool,
    /// Mask values shown in completion menus
    pub completion: bool,
    /// Mask values in fuzzy-picker result lists
    pub pickers: bool,
    /// Mask values in picker file previews
    pub previewers: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            files: true,
            peek: true,
            completion: true,
            pickers: false,
            previewers: false,
        }
    }
}

impl ModulesConfig {
    pub fn get(&self, feature: Feature) -> bool {
        match feature {
            Feature::Files => self.files,
            Feature::Peek => self.peek,
            Feature::Completion => self.completion,
            Feature::Pickers => self.pickers,
            Feature::Previewers => self.previewers,
        }
    }
}

/// Cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CacheConfig {
    /// Parsed-variable cache capacity (buffer states)
    pub parsed_capacity: usize,
    /// Extmark cache capacity (buffer states x masking configs)
    pub extmark_capacity: usize,
    /// Per-variable mask cache capacity
    pub mask_capacity: usize,
    /// Seconds before a cache expires as a whole; 0 disables expiry
    pub ttl_secs: u64,
    /// Estimated memory ceiling per cache in bytes
    pub max_memory_bytes: Option<usize>,
    /// Interval of the periodic cleanup timer; unset disables the timer
    pub cleanup_interval_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            parsed_capacity: 100,
            extmark_capacity: 100,
            mask_capacity: 1000,
            ttl_secs: 300,
            max_memory_bytes: Some(10 * 1024 * 1024),
            cleanup_interval_secs: Some(60),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ShelterConfig {
    pub modules: ModulesConfig,
    pub mask: MaskingConfig,
    /// File name globs that identify env files
    pub env_file_patterns: Vec<String>,
    pub cache: CacheConfig,
    /// Overlays applied per batch before yielding to the editor
    pub apply_batch_size: usize,
}

impl Default for ShelterConfig {
    fn default() -> Self {
        Self {
            modules: ModulesConfig::default(),
            mask: MaskingConfig::default(),
            env_file_patterns: vec![
                ".env".to_string(),
                ".envrc".to_string(),
                ".env.*".to_string(),
                "*.env".to_string(),
            ],
            cache: CacheConfig::default(),
            apply_batch_size: 100,
        }
    }
}

impl ShelterConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!("Loaded shelter config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ShelterConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Clamp values that would break the engine to the nearest safe setting
    pub fn sanitized(mut self) -> Self {
        if self.apply_batch_size == 0 {
            tracing::warn!("apply_batch_size = 0, using 1");
            self.apply_batch_size = 1;
        }
        for (name, capacity) in [
            ("parsed_capacity", &mut self.cache.parsed_capacity),
            ("extmark_capacity", &mut self.cache.extmark_capacity),
            ("mask_capacity", &mut self.cache.mask_capacity),
        ] {
            if *capacity == 0 {
                tracing::warn!("cache.{} = 0, using 1", name);
                *capacity = 1;
            }
        }
        if self.cache.cleanup_interval_secs == Some(0) {
            self.cache.cleanup_interval_secs = None;
        }
        self
    }

    /// JSON schema of the configuration file
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(ShelterConfig);
        serde_json::to_value(&schema).unwrap_or(serde_json::Value::Null)
    }
}

/// Error loading a configuration file
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
