//! Feature toggles and temporarily revealed lines

use crate::config::ModulesConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Independently toggleable masking surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Files,
    Peek,
    Completion,
    Pickers,
    Previewers,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Files,
        Feature::Peek,
        Feature::Completion,
        Feature::Pickers,
        Feature::Previewers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Files => "files",
            Feature::Peek => "peek",
            Feature::Completion => "completion",
            Feature::Pickers => "pickers",
            Feature::Previewers => "previewers",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("Unknown feature '{}'", s))
    }
}

/// Enable/disable command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCommand {
    Enable,
    Disable,
}

impl FromStr for StateCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enable" => Ok(StateCommand::Enable),
            "disable" => Ok(StateCommand::Disable),
            _ => Err(format!("Unknown command '{}'", s)),
        }
    }
}

/// Process-wide shelter state, owned by the `Shelter` context
#[derive(Debug, Clone)]
pub struct ShelterState {
    initial: ModulesConfig,
    enabled: ModulesConfig,
    /// 1-based line numbers currently exempt from masking
    revealed: BTreeSet<usize>,
}

impl ShelterState {
    pub fn new(modules: ModulesConfig) -> Self {
        Self {
            initial: modules,
            enabled: modules,
            revealed: BTreeSet::new(),
        }
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.get(feature)
    }

    /// Set one feature. Returns true if the state changed.
    pub fn set_feature_state(&mut self, feature: Feature, enabled: bool) -> bool {
        let slot = match feature {
            Feature::Files => &mut self.enabled.files,
            Feature::Peek => &mut self.enabled.peek,
            Feature::Completion => &mut self.enabled.completion,
            Feature::Pickers => &mut self.enabled.pickers,
            Feature::Previewers => &mut self.enabled.previewers,
        };
        let changed = *slot != enabled;
        *slot = enabled;
        changed
    }

    /// Flip between "everything off" and the configured initial states.
    /// Returns whether any feature is enabled afterwards.
    pub fn toggle_all(&mut self) -> bool {
        if self.any_enabled() {
            for feature in Feature::ALL {
                self.set_feature_state(feature, false);
            }
        } else {
            self.enabled = self.initial;
        }
        self.any_enabled()
    }

    pub fn any_enabled(&self) -> bool {
        Feature::ALL.into_iter().any(|f| self.is_enabled(f))
    }

    pub fn reveal_line(&mut self, line: usize) {
        self.revealed.insert(line);
    }

    pub fn reset_revealed(&mut self) -> bool {
        let had_any = !self.revealed.is_empty();
        self.revealed.clear();
        had_any
    }

    pub fn is_revealed(&self, line: usize) -> bool {
        self.revealed.contains(&line)
    }
}
