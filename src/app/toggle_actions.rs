//! Feature toggles for the Shelter context.
//!
//! Turning `files` on clears every cache and re-applies overlays to all known
//! env buffers; turning it off removes their overlays and restores
//! completion. Other features only change what later calls produce.

use crate::plugin_api::BufferSource;
use crate::state::{Feature, StateCommand};

use super::Shelter;

impl Shelter {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.state.is_enabled(feature)
    }

    /// Flip one feature
    pub fn toggle_feature(&mut self, buffers: &dyn BufferSource, feature: Feature) {
        let enabled = !self.state.is_enabled(feature);
        self.apply_feature_state(buffers, feature, enabled);
        let status = if enabled { "enabled" } else { "disabled" };
        self.set_status_message(format!("Shelter {} masking {}", feature, status));
    }

    /// Enable or disable one feature, or every feature when `feature` is `None`
    pub fn set_state(&mut self, buffers: &dyn BufferSource, command: StateCommand, feature: Option<Feature>) {
        let enabled = command == StateCommand::Enable;
        match feature {
            Some(feature) => self.apply_feature_state(buffers, feature, enabled),
            None => {
                for feature in Feature::ALL {
                    self.apply_feature_state(buffers, feature, enabled);
                }
            }
        }
    }

    /// Flip between "everything off" and the configured initial states
    pub fn toggle_all(&mut self, buffers: &dyn BufferSource) {
        let files_before = self.state.is_enabled(Feature::Files);
        let peek_before = self.state.is_enabled(Feature::Peek);
        let any_enabled = self.state.toggle_all();

        if peek_before && !self.state.is_enabled(Feature::Peek) {
            self.hide_revealed(buffers);
        }
        match (files_before, self.state.is_enabled(Feature::Files)) {
            (false, true) => self.files_enabled(buffers),
            (true, false) => self.files_disabled(),
            _ => {}
        }

        let status = if any_enabled { "enabled" } else { "disabled" };
        self.set_status_message(format!("Shelter masking {}", status));
    }

    fn apply_feature_state(&mut self, buffers: &dyn BufferSource, feature: Feature, enabled: bool) {
        if !self.state.set_feature_state(feature, enabled) {
            return;
        }
        match (feature, enabled) {
            (Feature::Files, true) => self.files_enabled(buffers),
            (Feature::Files, false) => self.files_disabled(),
            (Feature::Peek, false) => self.hide_revealed(buffers),
            _ => {}
        }
    }

    fn files_enabled(&mut self, buffers: &dyn BufferSource) {
        self.caches.clear_all();
        self.reshelter_all(buffers);
    }

    fn files_disabled(&mut self) {
        let ids: Vec<_> = self.sheltered.keys().copied().collect();
        for buffer_id in ids {
            self.unshelter_buffer(buffer_id);
        }
    }
}
