//! Batched overlay application.
//!
//! A buffer's overlays are replaced in fixed-size batches. After each batch
//! the applier asks the host to call back on the next tick (`Defer`) instead
//! of applying everything at once. Every job carries a generation number and
//! the content hash it was computed from; a resumed batch whose generation is
//! stale, or whose buffer content has changed, is dropped.

use crate::model::{BufferId, ExtmarkSpec};
use crate::plugin_api::{log_send_failure, HostApi};
use crate::primitives::ContentHash;
use std::collections::HashMap;

/// Result of running one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// All overlays applied
    Finished,
    /// More batches pending; a `Defer` was sent
    Yielded,
    /// Job superseded, buffer gone or content changed; nothing applied
    Aborted,
}

#[derive(Debug)]
struct ApplyJob {
    generation: u64,
    content_hash: ContentHash,
    overlays: Vec<ExtmarkSpec>,
    next: usize,
}

#[derive(Debug)]
pub struct OverlayApplier {
    batch_size: usize,
    jobs: HashMap<BufferId, ApplyJob>,
    next_generation: u64,
}

impl OverlayApplier {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            jobs: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Replace a buffer's overlays: clear, apply the first batch, and yield
    /// if more remain. Supersedes any job already running for the buffer.
    pub fn begin(
        &mut self,
        api: &HostApi,
        buffer_id: BufferId,
        content_hash: ContentHash,
        overlays: Vec<ExtmarkSpec>,
    ) -> BatchOutcome {
        if self.jobs.remove(&buffer_id).is_some() {
            tracing::debug!("Superseding in-flight overlay job for buffer {:?}", buffer_id);
        }
        let generation = self.next_generation;
        self.next_generation += 1;

        log_send_failure(api.clear_overlays(buffer_id));
        self.jobs.insert(
            buffer_id,
            ApplyJob {
                generation,
                content_hash,
                overlays,
                next: 0,
            },
        );
        self.run_batch(api, buffer_id)
    }

    /// Continue a job after a `Defer`. `current_hash` is the hash of the
    /// buffer's lines now, or `None` if the buffer is no longer valid.
    pub fn resume(
        &mut self,
        api: &HostApi,
        buffer_id: BufferId,
        generation: u64,
        current_hash: Option<&ContentHash>,
    ) -> BatchOutcome {
        let Some(job) = self.jobs.get(&buffer_id) else {
            return BatchOutcome::Aborted;
        };
        if job.generation != generation {
            tracing::debug!(
                "Ignoring stale overlay batch for buffer {:?} (generation {}, current {})",
                buffer_id,
                generation,
                job.generation
            );
            return BatchOutcome::Aborted;
        }
        if current_hash != Some(&job.content_hash) {
            tracing::debug!("Buffer {:?} changed or closed mid-apply; dropping job", buffer_id);
            self.jobs.remove(&buffer_id);
            return BatchOutcome::Aborted;
        }
        self.run_batch(api, buffer_id)
    }

    /// Drop a buffer's pending job. Returns true if one was running.
    pub fn cancel(&mut self, buffer_id: BufferId) -> bool {
        self.jobs.remove(&buffer_id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.jobs.clear();
    }

    pub fn is_pending(&self, buffer_id: BufferId) -> bool {
        self.jobs.contains_key(&buffer_id)
    }

    fn run_batch(&mut self, api: &HostApi, buffer_id: BufferId) -> BatchOutcome {
        let Some(job) = self.jobs.get_mut(&buffer_id) else {
            return BatchOutcome::Aborted;
        };
        let end = (job.next + self.batch_size).min(job.overlays.len());
        if end > job.next {
            let batch = job.overlays[job.next..end].to_vec();
            log_send_failure(api.add_overlays(buffer_id, batch));
        }
        job.next = end;

        if job.next >= job.overlays.len() {
            self.jobs.remove(&buffer_id);
            BatchOutcome::Finished
        } else {
            log_send_failure(api.defer(buffer_id, job.generation));
            BatchOutcome::Yielded
        }
    }
}
