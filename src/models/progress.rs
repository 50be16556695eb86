use serde::{Deserialize, Serialize};

/// One progress report returned by a status query.
///
/// Each snapshot supersedes the previous one; the client renders whichever
/// snapshot was delivered last and does not reorder or smooth the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub percentage: u8,
    pub message: String,
    pub current: u32,
    pub total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
}

impl ProgressSnapshot {
    /// Placeholder shown between submission and the first poll response.
    pub fn initial() -> Self {
        Self {
            percentage: 0,
            message: "Starting AI analysis... This may take several minutes.".to_string(),
            current: 0,
            total: 0,
            eta_seconds: None,
        }
    }
}
