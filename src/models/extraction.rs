use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Text extraction backend offered by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Layout-aware extraction. Service default.
    #[default]
    Layout,
    /// Plain page-by-page text dump.
    Basic,
}

/// Payload of a successful text extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub filename: String,
    pub method: ExtractionMethod,
    pub ocr_used: bool,
}

/// Payload of a completed image-analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub filename: String,
    pub total_images: u32,
    pub processed: u32,
    pub skipped: u32,
    #[serde(default)]
    pub items: Vec<DetectedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_file: Option<String>,
}

/// One product detected and classified in the document.
///
/// `category` is an open set: the service may introduce new categories at
/// any time, so it stays a plain string on this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedItem {
    pub sku: String,
    pub category: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
