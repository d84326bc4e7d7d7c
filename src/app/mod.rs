//! The `Shelter` context: everything the masking engine needs, owned in one
//! place and driven by host events.

mod overlay_applier;
mod peek;
mod toggle_actions;

pub use overlay_applier::{BatchOutcome, OverlayApplier};

use crate::cache::{ExtmarkKey, ShelterCacheStats, ShelterCaches};
use crate::config::ShelterConfig;
use crate::mask::{build_extmarks, MaskEngine, MaskRequest};
use crate::model::{render_overlays, BufferId, ExtmarkSpec, ParsedVariables};
use crate::parser::parse_buffer;
use crate::plugin_api::{log_send_failure, BufferSource, HostApi, ShelterCommand, TimerId};
use crate::primitives::ContentHash;
use crate::services::{EnvFileMatcher, RealTimeSource, SharedTimeSource};
use crate::state::{Feature, ShelterState};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

/// Buffer currently showing overlays
#[derive(Debug, Clone)]
struct ShelteredBuffer {
    content_hash: ContentHash,
}

/// Shelter context. Create one per activation and call
/// [`shutdown`](Shelter::shutdown) on deactivation.
#[derive(Debug)]
pub struct Shelter {
    config: ShelterConfig,
    state: ShelterState,
    engine: MaskEngine,
    caches: ShelterCaches,
    applier: OverlayApplier,
    api: HostApi,
    env_files: EnvFileMatcher,
    time: SharedTimeSource,
    cleanup_timer: Option<TimerId>,
    next_timer_id: u64,
    /// Buffers recognised as env files
    env_buffers: BTreeSet<BufferId>,
    sheltered: HashMap<BufferId, ShelteredBuffer>,
    /// Buffer whose revealed lines are currently exempt
    peek_buffer: Option<BufferId>,
}

impl Shelter {
    pub fn new(config: ShelterConfig, command_sender: Sender<ShelterCommand>) -> Self {
        Self::with_time_source(config, command_sender, RealTimeSource::shared())
    }

    pub fn with_time_source(
        config: ShelterConfig,
        command_sender: Sender<ShelterCommand>,
        time: SharedTimeSource,
    ) -> Self {
        let config = config.sanitized();
        let mut shelter = Self {
            state: ShelterState::new(config.modules),
            engine: MaskEngine::new(config.mask.clone()),
            caches: ShelterCaches::new(&config.cache, Arc::clone(&time)),
            applier: OverlayApplier::new(config.apply_batch_size),
            api: HostApi::new(command_sender),
            env_files: EnvFileMatcher::new(&config.env_file_patterns),
            time,
            cleanup_timer: None,
            next_timer_id: 1,
            env_buffers: BTreeSet::new(),
            sheltered: HashMap::new(),
            peek_buffer: None,
            config,
        };
        shelter.start_cleanup_timer();
        shelter
    }

    pub fn config(&self) -> &ShelterConfig {
        &self.config
    }

    pub fn state(&self) -> &ShelterState {
        &self.state
    }

    pub fn engine(&self) -> &MaskEngine {
        &self.engine
    }

    /// Whether a path counts as an environment file
    pub fn is_env_file(&self, path: &Path) -> bool {
        self.env_files.matches(path)
    }

    pub fn is_sheltered(&self, buffer_id: BufferId) -> bool {
        self.sheltered.contains_key(&buffer_id)
    }

    /// Compute and apply overlays for a buffer. Safe to call repeatedly.
    /// Returns true when overlays are being applied.
    pub fn shelter_buffer(&mut self, buffers: &dyn BufferSource, buffer_id: BufferId) -> bool {
        let Some(path) = buffers.file_path(buffer_id) else {
            return false;
        };
        if !self.env_files.matches(&path) {
            return false;
        }
        self.env_buffers.insert(buffer_id);
        if !self.state.is_enabled(Feature::Files) {
            return false;
        }
        let Some(lines) = buffers.get_lines(buffer_id) else {
            return false;
        };

        let source = source_name(&path);
        let content_hash = ContentHash::of_lines(&lines);
        let mut extmarks = self.compute_extmarks(&lines, &content_hash, source.as_deref());
        if self.peek_buffer == Some(buffer_id) {
            extmarks.retain(|e| !self.state.is_revealed(e.line + 1));
        }

        let newly_sheltered = self
            .sheltered
            .insert(
                buffer_id,
                ShelteredBuffer {
                    content_hash: content_hash.clone(),
                },
            )
            .is_none();
        if newly_sheltered {
            log_send_failure(self.api.set_buffer_completion(buffer_id, false));
        }

        tracing::debug!("Sheltering buffer {:?} with {} overlays", buffer_id, extmarks.len());
        self.applier.begin(&self.api, buffer_id, content_hash, extmarks);
        true
    }

    /// Remove all overlays from a buffer and restore completion
    pub fn unshelter_buffer(&mut self, buffer_id: BufferId) {
        self.applier.cancel(buffer_id);
        log_send_failure(self.api.clear_overlays(buffer_id));
        if self.sheltered.remove(&buffer_id).is_some() {
            log_send_failure(self.api.set_buffer_completion(buffer_id, true));
        }
        if self.peek_buffer == Some(buffer_id) {
            self.peek_buffer = None;
            self.state.reset_revealed();
        }
    }

    /// Host callback for [`ShelterCommand::Defer`]
    pub fn resume(&mut self, buffers: &dyn BufferSource, buffer_id: BufferId, generation: u64) -> BatchOutcome {
        if !buffers.is_valid(buffer_id) || !self.state.is_enabled(Feature::Files) {
            self.applier.cancel(buffer_id);
            return BatchOutcome::Aborted;
        }
        let current = buffers.get_lines(buffer_id).map(|lines| ContentHash::of_lines(&lines));
        self.applier
            .resume(&self.api, buffer_id, generation, current.as_ref())
    }

    /// Buffer text changed: drop every cache and recompute
    pub fn on_buffer_changed(&mut self, buffers: &dyn BufferSource, buffer_id: BufferId) {
        if !self.env_buffers.contains(&buffer_id) && !self.sheltered.contains_key(&buffer_id) {
            return;
        }
        self.caches.clear_all();
        self.shelter_buffer(buffers, buffer_id);
    }

    /// Buffer closed: forget it and evict what was cached for its content
    pub fn on_buffer_closed(&mut self, buffer_id: BufferId) {
        self.applier.cancel(buffer_id);
        self.env_buffers.remove(&buffer_id);
        if let Some(sheltered) = self.sheltered.remove(&buffer_id) {
            self.caches.evict_content(&sheltered.content_hash);
        }
        if self.peek_buffer == Some(buffer_id) {
            self.peek_buffer = None;
            self.state.reset_revealed();
        }
    }

    /// Mask a single value for a feature (completion items, peek windows).
    /// Returns the value unchanged when the feature is disabled.
    pub fn mask_value(&self, value: &str, feature: Feature, key: Option<&str>, source: Option<&str>) -> String {
        if !self.state.is_enabled(feature) {
            return value.to_string();
        }
        self.engine
            .determine_masked_value(value, &MaskRequest::new(key, source))
    }

    /// Display lines for a picker or previewer showing an env file
    pub fn mask_lines<S: AsRef<str>>(&mut self, feature: Feature, lines: &[S], source: Option<&str>) -> Vec<String> {
        if !self.state.is_enabled(feature) {
            return lines.iter().map(|l| l.as_ref().to_string()).collect();
        }
        let content_hash = ContentHash::of_lines(lines);
        let extmarks = self.compute_extmarks(lines, &content_hash, source);
        render_overlays(lines, &extmarks)
    }

    /// Parsed variables for a buffer state, through the parsed-variable cache
    pub fn parsed_variables<S: AsRef<str>>(&mut self, lines: &[S], content_hash: &ContentHash) -> Arc<ParsedVariables> {
        if let Some(parsed) = self.caches.parsed.get(content_hash) {
            return parsed;
        }
        let parsed = parse_buffer(lines, content_hash);
        self.caches.parsed.put(content_hash.clone(), parsed)
    }

    /// Overlays for a buffer state, before revealed lines are removed
    pub fn compute_extmarks<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        content_hash: &ContentHash,
        source: Option<&str>,
    ) -> Vec<ExtmarkSpec> {
        let key = ExtmarkKey {
            content_hash: content_hash.clone(),
            config: self.engine.fingerprint().clone(),
            source: source.map(str::to_string),
        };
        if let Some(cached) = self.caches.extmarks.get(&key) {
            return cached.to_vec();
        }
        let parsed = self.parsed_variables(lines, content_hash);
        let extmarks = build_extmarks(&parsed, &self.engine, source, &mut self.caches.masks);
        self.caches.extmarks.put(key, extmarks).to_vec()
    }

    pub fn cache_stats(&self) -> ShelterCacheStats {
        self.caches.stats()
    }

    pub fn clear_caches(&mut self) {
        self.caches.clear_all();
    }

    /// Replace the configuration. The previous cleanup timer is stopped
    /// before a new one starts; sheltered buffers are recomputed.
    pub fn reconfigure(&mut self, config: ShelterConfig, buffers: &dyn BufferSource) {
        self.stop_cleanup_timer();
        let config = config.sanitized();
        self.state = ShelterState::new(config.modules);
        self.engine = MaskEngine::new(config.mask.clone());
        self.caches = ShelterCaches::new(&config.cache, Arc::clone(&self.time));
        self.applier = OverlayApplier::new(config.apply_batch_size);
        self.env_files = EnvFileMatcher::new(&config.env_file_patterns);
        self.peek_buffer = None;
        self.config = config;
        self.start_cleanup_timer();
        self.reshelter_all(buffers);
    }

    /// Host callback for a timer started with [`ShelterCommand::StartTimer`]
    pub fn on_timer(&mut self, timer_id: TimerId) {
        if self.cleanup_timer == Some(timer_id) {
            self.caches.cleanup();
        } else {
            tracing::debug!("Ignoring tick from unknown timer {:?}", timer_id);
        }
    }

    pub fn cleanup_timer(&self) -> Option<TimerId> {
        self.cleanup_timer
    }

    /// Stop timers, drop pending work and clear caches. Idempotent.
    pub fn shutdown(&mut self) {
        self.stop_cleanup_timer();
        self.applier.cancel_all();
        self.caches.clear_all();
    }

    fn start_cleanup_timer(&mut self) {
        let Some(secs) = self.config.cache.cleanup_interval_secs else {
            return;
        };
        let timer_id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        log_send_failure(self.api.start_timer(timer_id, Duration::from_secs(secs)));
        self.cleanup_timer = Some(timer_id);
    }

    fn stop_cleanup_timer(&mut self) {
        if let Some(timer_id) = self.cleanup_timer.take() {
            log_send_failure(self.api.stop_timer(timer_id));
        }
    }

    fn reshelter_all(&mut self, buffers: &dyn BufferSource) {
        let ids: Vec<BufferId> = self.env_buffers.iter().copied().collect();
        for buffer_id in ids {
            if buffers.is_valid(buffer_id) {
                self.shelter_buffer(buffers, buffer_id);
            } else {
                self.on_buffer_closed(buffer_id);
            }
        }
    }

    fn set_status_message(&self, message: String) {
        tracing::info!("{}", message);
        log_send_failure(self.api.set_status(message));
    }
}

impl Drop for Shelter {
    fn drop(&mut self) {
        self.stop_cleanup_timer();
    }
}

/// Source name for pattern matching: the full path, which source patterns
/// match either whole or by file name
fn source_name(path: &Path) -> Option<String> {
    path.to_str().map(str::to_string)
}
