use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::extraction::{AnalysisResult, ExtractionMethod, ExtractionResult};
use crate::models::job::{ExtractionMode, JobStatus, SubmissionFile, TaskId};
use crate::models::request::SubmissionRequest;
use crate::services::api::{ApiError, ExtractionServiceClient};
use crate::services::poller::ProgressPoller;
use crate::services::session::Session;
use crate::view::state::ViewEvent;

/// Fallback shown when a text extraction fails without a server message.
const GENERIC_TEXT_ERROR: &str = "An error occurred during extraction";

/// Fallback shown when an image analysis fails without a server message.
const GENERIC_IMAGE_ERROR: &str = "An error occurred during image extraction";

/// Validates submissions, dispatches them to the extraction service, and
/// owns the polling lifecycle of the active job.
///
/// Reentrant: a submission arriving while another is in flight supersedes
/// it. The superseded job's poller is stopped immediately and its eventual
/// response is discarded when it arrives.
pub struct SubmissionController {
    api: ExtractionServiceClient,
    poller: ProgressPoller,
    session: Arc<Session>,
}

/// How a submission ended, beyond what the view shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Text(ExtractionResult),
    Image(AnalysisResult),
    /// Another submission took over while this one was in flight; its
    /// response was discarded without touching the view.
    Superseded,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Rejected before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// The request failed at the network layer.
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered but reported failure.
    #[error("{0}")]
    Application(String),
}

impl SubmitError {
    fn from_api(error: ApiError, fallback: &str) -> Self {
        match error {
            ApiError::Transport(source) => SubmitError::Transport(source),
            ApiError::Application { message } => {
                SubmitError::Application(message.unwrap_or_else(|| fallback.to_string()))
            }
            ApiError::Decode(source) => {
                tracing::warn!(error = %source, "undecodable service response");
                SubmitError::Application(fallback.to_string())
            }
            ApiError::Config(message) => SubmitError::Application(message),
        }
    }
}

impl SubmissionController {
    pub fn new(api: ExtractionServiceClient, poller: ProgressPoller, session: Arc<Session>) -> Self {
        Self {
            api,
            poller,
            session,
        }
    }

    /// Wire up a controller with a fresh session from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let api = ExtractionServiceClient::new(&config.service_url)?;
        let poller = ProgressPoller::new(
            api.clone(),
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.max_poll_secs),
        );
        Ok(Self::new(api, poller, Arc::new(Session::new())))
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Submit a document. A valid submission issues exactly one outbound
    /// request; an invalid one issues none and renders the validation
    /// message.
    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmitOutcome, SubmitError> {
        let file = match request.selected_file() {
            Ok(file) => file,
            Err(message) => {
                self.session.apply(ViewEvent::Failed(message.clone()));
                return Err(SubmitError::Validation(message));
            }
        };

        let task_id = TaskId::generate();
        tracing::info!(
            task_id = %task_id,
            mode = %request.mode,
            file = %file.name,
            "submitting document"
        );

        if let Some(mut superseded) = self.session.begin_job(task_id.clone(), request.mode) {
            tracing::debug!(task_id = %superseded.task_id, "superseding active job");
            superseded.stop_poller();
        }

        match request.mode {
            ExtractionMode::Text => {
                self.submit_text(task_id, file, request.method, request.use_ocr)
                    .await
            }
            ExtractionMode::Image => self.submit_image(task_id, file).await,
        }
    }

    /// Fetch the most recent export artifact, if the service produced one.
    pub async fn download_export(&self) -> Result<Option<Vec<u8>>, SubmitError> {
        match self.session.export_file() {
            Some(name) => {
                let bytes = self
                    .api
                    .download_export(&name)
                    .await
                    .map_err(|error| SubmitError::from_api(error, GENERIC_IMAGE_ERROR))?;
                Ok(Some(bytes))
            }
            None => Ok(None),
        }
    }

    async fn submit_text(
        &self,
        task_id: TaskId,
        file: &SubmissionFile,
        method: ExtractionMethod,
        use_ocr: bool,
    ) -> Result<SubmitOutcome, SubmitError> {
        self.session
            .apply_for(&task_id, ViewEvent::SubmissionStarted(ExtractionMode::Text));

        match self.api.submit_text_extraction(file, method, use_ocr).await {
            Ok(result) => {
                let event = ViewEvent::TextReady(result.clone());
                if !self.session.conclude(&task_id, JobStatus::Succeeded, event) {
                    tracing::debug!(task_id = %task_id, "discarding result for superseded job");
                    return Ok(SubmitOutcome::Superseded);
                }
                Ok(SubmitOutcome::Text(result))
            }
            Err(error) => self.conclude_failure(&task_id, error, GENERIC_TEXT_ERROR),
        }
    }

    async fn submit_image(
        &self,
        task_id: TaskId,
        file: &SubmissionFile,
    ) -> Result<SubmitOutcome, SubmitError> {
        self.session
            .apply_for(&task_id, ViewEvent::SubmissionStarted(ExtractionMode::Image));

        let handle = self.poller.start(self.session.clone(), task_id.clone());
        self.session.attach_poller(&task_id, handle);

        let outcome = self.api.submit_image_analysis(file).await;

        // The poller must be dead before any terminal transition, whatever
        // the outcome.
        if let Some(mut poller) = self.session.take_poller(&task_id) {
            poller.stop();
        }

        match outcome {
            Ok(result) => {
                let event = ViewEvent::ImageReady(result.clone());
                if !self.session.conclude(&task_id, JobStatus::Succeeded, event) {
                    tracing::debug!(task_id = %task_id, "discarding result for superseded job");
                    return Ok(SubmitOutcome::Superseded);
                }
                Ok(SubmitOutcome::Image(result))
            }
            Err(error) => self.conclude_failure(&task_id, error, GENERIC_IMAGE_ERROR),
        }
    }

    fn conclude_failure(
        &self,
        task_id: &TaskId,
        error: ApiError,
        fallback: &str,
    ) -> Result<SubmitOutcome, SubmitError> {
        let error = SubmitError::from_api(error, fallback);
        let event = ViewEvent::Failed(error.to_string());
        if !self.session.conclude(task_id, JobStatus::Failed, event) {
            tracing::debug!(task_id = %task_id, "discarding error for superseded job");
            return Ok(SubmitOutcome::Superseded);
        }
        Err(error)
    }
}
