use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::extraction::{AnalysisResult, ExtractionMethod, ExtractionResult};
use crate::models::job::{SubmissionFile, TaskId};
use crate::models::progress::ProgressSnapshot;

/// HTTP client for the remote extraction service.
///
/// Success payloads arrive wrapped in a `{success, ...}` envelope; a
/// `success: false` body is an application-level failure carrying an
/// optional `error` message, regardless of the HTTP status code.
#[derive(Debug, Clone)]
pub struct ExtractionServiceClient {
    http: Client,
    base_url: Url,
}

impl ExtractionServiceClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::Config(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!("not a usable base URL: {}", base_url)));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    /// POST /extract with the document and text-mode options. Synchronous:
    /// the response carries the extracted text.
    pub async fn submit_text_extraction(
        &self,
        file: &SubmissionFile,
        method: ExtractionMethod,
        use_ocr: bool,
    ) -> Result<ExtractionResult, ApiError> {
        let form = Self::document_form(file)?
            .text("method", method.to_string())
            .text("use_ocr", use_ocr.to_string());

        let response = self
            .http
            .post(self.endpoint(&["extract"]))
            .multipart(form)
            .send()
            .await?;

        Self::parse_payload(response).await
    }

    /// POST /extract-images with the document. The request stays open for
    /// the lifetime of the analysis job; progress is tracked separately.
    pub async fn submit_image_analysis(
        &self,
        file: &SubmissionFile,
    ) -> Result<AnalysisResult, ApiError> {
        let response = self
            .http
            .post(self.endpoint(&["extract-images"]))
            .multipart(Self::document_form(file)?)
            .send()
            .await?;

        Self::parse_payload(response).await
    }

    /// GET /progress/{task_id}. Snapshots come back without an envelope.
    pub async fn get_progress(&self, task_id: &TaskId) -> Result<ProgressSnapshot, ApiError> {
        let snapshot = self
            .http
            .get(self.endpoint(&["progress", task_id.as_str()]))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(snapshot)
    }

    /// GET /download/{export_file}, fetching a generated export artifact.
    /// The name is sent as a single percent-encoded path segment so
    /// generated names with spaces or slashes survive the round trip.
    pub async fn download_export(&self, export_file: &str) -> Result<Vec<u8>, ApiError> {
        let bytes = self
            .http
            .get(self.endpoint(&["download", export_file]))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(bytes.to_vec())
    }

    fn document_form(file: &SubmissionFile) -> Result<Form, ApiError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("application/pdf")?;

        Ok(Form::new().part("file", part))
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Base URL validity is checked at construction.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn parse_payload<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;

        if body.get("success").and_then(Value::as_bool) != Some(true) {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string);
            return Err(ApiError::Application { message });
        }

        serde_json::from_value(body).map_err(ApiError::Decode)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{}", .message.as_deref().unwrap_or("service reported failure"))]
    Application { message: Option<String> },

    #[error("failed to decode service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid service URL: {0}")]
    Config(String),
}
