use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::models::job::TaskId;
use crate::services::api::ExtractionServiceClient;
use crate::services::session::Session;
use crate::view::state::ViewEvent;

/// Consecutive failed polls tolerated before the loop gives up on progress
/// updates. Giving up never touches the view; the submission response stays
/// the sole authority for the terminal state.
const MAX_CONSECUTIVE_POLL_FAILURES: u32 = 30;

/// Spawns periodic progress queries for active jobs.
#[derive(Debug, Clone)]
pub struct ProgressPoller {
    api: ExtractionServiceClient,
    poll_interval: Duration,
    max_duration: Duration,
}

impl ProgressPoller {
    pub fn new(api: ExtractionServiceClient, poll_interval: Duration, max_duration: Duration) -> Self {
        Self {
            api,
            poll_interval,
            max_duration,
        }
    }

    /// Start polling progress for `task_id`, publishing each snapshot into
    /// the session view. The loop runs until the handle is stopped, the
    /// overall budget is exhausted, or too many polls fail in a row.
    pub fn start(&self, session: Arc<Session>, task_id: TaskId) -> PollerHandle {
        let api = self.api.clone();
        let poll_interval = self.poll_interval;
        let max_duration = self.max_duration;

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut consecutive_failures = 0u32;

            loop {
                ticker.tick().await;

                if started.elapsed() >= max_duration {
                    tracing::warn!(task_id = %task_id, "poll budget exhausted, giving up on progress updates");
                    break;
                }

                match api.get_progress(&task_id).await {
                    Ok(snapshot) => {
                        consecutive_failures = 0;
                        // Snapshots for a superseded job must never reach the view.
                        if !session.apply_for(&task_id, ViewEvent::Snapshot(snapshot)) {
                            tracing::debug!(task_id = %task_id, "dropped snapshot for superseded job");
                        }
                    }
                    Err(error) => {
                        // A single failed poll is non-fatal; only an explicit
                        // stop or the thresholds above end the loop.
                        consecutive_failures += 1;
                        tracing::warn!(task_id = %task_id, error = %error, "progress poll failed");
                        if consecutive_failures >= MAX_CONSECUTIVE_POLL_FAILURES {
                            tracing::warn!(task_id = %task_id, "too many consecutive poll failures, giving up");
                            break;
                        }
                    }
                }
            }
        });

        PollerHandle { task: Some(task) }
    }
}

/// Handle to a running polling loop. Stopping is idempotent, and a dropped
/// handle stops its loop, so an abandoned poller cannot outlive its job.
#[derive(Debug)]
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
