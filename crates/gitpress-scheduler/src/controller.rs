//! Job admission and coalescing controller.
//!
//! One controller owns every build target. Per target it keeps at most one
//! running job plus a single pending slot: a bounded mailbox of size 1 with
//! last-writer-wins semantics. Of a burst of pushes arriving while a build
//! runs, only the first (already running) and the most recent submission
//! execute; everything in between is aborted before it starts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use gitpress_core::{BuildPipeline, JobState, PipelineError, PushEvent};

use crate::handle::{JobHandle, JobUpdate};

/// Admission and coalescing controller for build jobs.
///
/// Cheap to clone; clones share the same slot registry. Must be used from
/// within a Tokio runtime, since admitted jobs run on spawned tasks.
#[derive(Clone)]
pub struct JobController {
    inner: Arc<Inner>,
}

struct Inner {
    pipeline: Arc<dyn BuildPipeline>,
    /// Registry of per-target slots. Locked only to look up, insert, or
    /// retire an entry; never held across bookkeeping or builds.
    slots: Mutex<HashMap<String, Arc<Mutex<TargetSlot>>>>,
}

/// Per-target bookkeeping: the running job and the single pending slot.
struct TargetSlot {
    running: Option<Job>,
    pending: Option<Job>,
    /// Set when the slot has been removed from the registry. A submitter
    /// holding a stale handle must re-look-up instead of admitting into it.
    retired: bool,
}

impl TargetSlot {
    fn new() -> Self {
        Self {
            running: None,
            pending: None,
            retired: false,
        }
    }
}

struct Job {
    id: Uuid,
    event: PushEvent,
    state: JobState,
    updates: mpsc::UnboundedSender<JobUpdate>,
}

impl Job {
    fn new(event: PushEvent) -> (Self, JobHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let handle = JobHandle::new(id, event.target_key.clone(), rx);
        let job = Self {
            id,
            event,
            state: JobState::Queued,
            updates: tx,
        };
        (job, handle)
    }

    fn send(&self, update: JobUpdate) {
        // The caller may have dropped its handle; lifecycle updates are
        // best-effort deliveries, not control flow.
        let _ = self.updates.send(update);
    }

    fn start(&mut self) {
        self.state = JobState::Running;
        self.send(JobUpdate::Started);
    }

    fn abort(mut self) {
        self.state = JobState::Aborted;
        self.send(JobUpdate::Aborted);
    }

    fn finish(mut self, result: Result<(), PipelineError>) {
        match result {
            Ok(()) => {
                self.state = JobState::Completed;
                self.send(JobUpdate::Completed);
            }
            Err(err) => {
                self.state = JobState::Failed;
                self.send(JobUpdate::Failed(err));
            }
        }
    }
}

impl JobController {
    /// Create a controller driving the given build pipeline.
    pub fn new(pipeline: Arc<dyn BuildPipeline>) -> Self {
        Self {
            inner: Arc::new(Inner {
                pipeline,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Submit a validated push event.
    ///
    /// Returns immediately; the outcome is observed through the returned
    /// handle. Per target the admission decision is one of: run now (idle
    /// target), wait in the pending slot (busy target), or displace the
    /// previous waiter (busy target, pending slot taken).
    pub fn submit(&self, event: PushEvent) -> JobHandle {
        let (mut job, handle) = Job::new(event);
        let target = job.event.target_key.clone();

        loop {
            let slot = self.lookup(&target);
            let mut state = slot.lock().expect("slot mutex poisoned");
            if state.retired {
                // Lost the race against slot retirement. The registry no
                // longer holds this entry; the next lookup creates a fresh
                // one.
                continue;
            }

            if state.running.is_none() {
                job.start();
                info!(
                    target_key = %target,
                    job = %job.id,
                    revision = %job.event.revision,
                    "starting build"
                );
                let id = job.id;
                let event = job.event.clone();
                state.running = Some(job);
                drop(state);
                self.spawn_build(slot, target, id, event);
            } else if state.pending.is_none() {
                info!(
                    target_key = %target,
                    job = %job.id,
                    revision = %job.event.revision,
                    "build in progress, queueing"
                );
                state.pending = Some(job);
            } else {
                info!(
                    target_key = %target,
                    job = %job.id,
                    revision = %job.event.revision,
                    "superseding queued build"
                );
                if let Some(displaced) = state.pending.replace(job) {
                    displaced.abort();
                }
            }

            return handle;
        }
    }

    /// Look up or create the registry entry for a target.
    fn lookup(&self, target: &str) -> Arc<Mutex<TargetSlot>> {
        let mut slots = self.inner.slots.lock().expect("slot registry poisoned");
        slots
            .entry(target.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TargetSlot::new())))
            .clone()
    }

    fn spawn_build(&self, slot: Arc<Mutex<TargetSlot>>, target: String, id: Uuid, event: PushEvent) {
        let controller = self.clone();
        tokio::spawn(async move {
            let result = controller.inner.pipeline.run(&event).await;
            controller.finish_build(&slot, &target, id, result);
        });
    }

    /// Completion bookkeeping for the job occupying the running slot.
    ///
    /// Pipeline failures are data here: a failed build emits `failed` and
    /// still promotes the pending job.
    fn finish_build(
        &self,
        slot: &Arc<Mutex<TargetSlot>>,
        target: &str,
        id: Uuid,
        result: Result<(), PipelineError>,
    ) {
        let mut state = slot.lock().expect("slot mutex poisoned");

        let Some(job) = state.running.take() else {
            error!(target_key = %target, job = %id, "no running job to finish");
            return;
        };
        if job.id != id || job.state != JobState::Running {
            // Slot bookkeeping out of sync is a programming defect, not a
            // recoverable runtime condition.
            error!(target_key = %target, job = %id, "running slot out of sync");
        }

        match &result {
            Ok(()) => info!(target_key = %target, job = %job.id, "build completed"),
            Err(err) => {
                warn!(target_key = %target, job = %job.id, error = %err, "build failed")
            }
        }
        job.finish(result);

        if let Some(mut next) = state.pending.take() {
            next.start();
            info!(
                target_key = %target,
                job = %next.id,
                revision = %next.event.revision,
                "promoting queued build"
            );
            let id = next.id;
            let event = next.event.clone();
            state.running = Some(next);
            drop(state);
            self.spawn_build(slot.clone(), target.to_string(), id, event);
        } else {
            drop(state);
            self.retire_if_idle(target, slot);
        }
    }

    /// Remove a fully idle slot from the registry.
    ///
    /// The registry lock is taken before the slot lock; `submit` never holds
    /// the slot lock while touching the registry, so this order cannot
    /// deadlock.
    fn retire_if_idle(&self, target: &str, slot: &Arc<Mutex<TargetSlot>>) {
        let mut slots = self.inner.slots.lock().expect("slot registry poisoned");
        let mut state = slot.lock().expect("slot mutex poisoned");
        if state.retired {
            // Already replaced in the registry; the entry there is not ours
            // to remove.
            return;
        }
        if state.running.is_none() && state.pending.is_none() {
            state.retired = true;
            slots.remove(target);
            debug!(target_key = %target, "target idle, slot retired");
        }
    }
}
