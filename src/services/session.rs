use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::job::{ExtractionMode, JobStatus, TaskId};
use crate::services::poller::PollerHandle;
use crate::view::state::{View, ViewEvent, ViewStateMachine};

/// The one job the client currently cares about.
#[derive(Debug)]
pub struct ActiveJob {
    pub task_id: TaskId,
    pub mode: ExtractionMode,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    poller: Option<PollerHandle>,
}

impl ActiveJob {
    /// Stop this job's polling loop, if one was attached. Idempotent.
    pub fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.as_mut() {
            poller.stop();
        }
    }
}

/// Shared context for a submission session: the current view, the active-job
/// slot, and the name of the last export artifact the service produced.
///
/// The controller owns the session; the poller and renderers only apply view
/// events through it. Every mutation on behalf of a job is tagged with its
/// task id and checked against the slot under one lock, so a response
/// arriving after the job was superseded cannot touch the view.
#[derive(Debug, Default)]
pub struct Session {
    view: ViewStateMachine,
    active: Mutex<Option<ActiveJob>>,
    export_file: Mutex<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest view.
    pub fn view(&self) -> View {
        self.view.current()
    }

    /// Watch the view; receivers always observe the most recent state.
    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.view.subscribe()
    }

    /// Apply an event that belongs to no particular job, such as a
    /// validation failure raised before a submission begins.
    pub fn apply(&self, event: ViewEvent) -> View {
        self.view.apply(event)
    }

    /// Apply `event` only while `task_id` still owns the active-job slot.
    /// Returns false when the event was discarded as stale.
    pub fn apply_for(&self, task_id: &TaskId, event: ViewEvent) -> bool {
        let active = self.active.lock().expect("session lock poisoned");
        match active.as_ref() {
            Some(job) if job.task_id == *task_id => {
                self.view.apply(event);
                true
            }
            _ => false,
        }
    }

    /// Install a new active job, clearing the view back to a clean slate.
    /// Returns the superseded job, with its poller still attached, so the
    /// caller can stop it exactly once.
    pub fn begin_job(&self, task_id: TaskId, mode: ExtractionMode) -> Option<ActiveJob> {
        let mut active = self.active.lock().expect("session lock poisoned");
        self.view.apply(ViewEvent::Reset);
        active.replace(ActiveJob {
            task_id,
            mode,
            status: JobStatus::Pending,
            started_at: Utc::now(),
            poller: None,
        })
    }

    /// Attach the polling handle for `task_id`. If the job was superseded in
    /// the meantime the handle is dropped, which stops its loop.
    pub fn attach_poller(&self, task_id: &TaskId, poller: PollerHandle) {
        let mut active = self.active.lock().expect("session lock poisoned");
        if let Some(job) = active.as_mut() {
            if job.task_id == *task_id {
                job.status = JobStatus::Polling;
                job.poller = Some(poller);
            }
        }
    }

    /// Detach the polling handle so the caller can stop it before the
    /// terminal view transition.
    pub fn take_poller(&self, task_id: &TaskId) -> Option<PollerHandle> {
        let mut active = self.active.lock().expect("session lock poisoned");
        match active.as_mut() {
            Some(job) if job.task_id == *task_id => job.poller.take(),
            _ => None,
        }
    }

    pub fn is_current(&self, task_id: &TaskId) -> bool {
        let active = self.active.lock().expect("session lock poisoned");
        active
            .as_ref()
            .is_some_and(|job| job.task_id == *task_id)
    }

    /// Retire the job and apply its terminal event in one step. Returns
    /// false, without touching the view, when `task_id` was superseded and
    /// the caller's result must be discarded.
    pub fn conclude(&self, task_id: &TaskId, status: JobStatus, event: ViewEvent) -> bool {
        let mut active = self.active.lock().expect("session lock poisoned");
        match active.as_ref() {
            Some(job) if job.task_id == *task_id => {
                let elapsed_ms = (Utc::now() - job.started_at).num_milliseconds();
                tracing::debug!(task_id = %task_id, status = ?status, elapsed_ms, "job finished");

                if let ViewEvent::ImageReady(result) = &event {
                    *self.export_file.lock().expect("session lock poisoned") =
                        result.export_file.clone();
                }

                *active = None;
                self.view.apply(event);
                true
            }
            _ => false,
        }
    }

    /// Name of the most recent export artifact, kept for a later,
    /// independent download action.
    pub fn export_file(&self) -> Option<String> {
        self.export_file
            .lock()
            .expect("session lock poisoned")
            .clone()
    }
}
