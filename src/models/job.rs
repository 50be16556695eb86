use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Processing mode selected for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Text,
    Image,
}

/// Status of a submitted job as tracked by the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Polling,
    Succeeded,
    Failed,
}

/// Client-generated correlation token for one submission attempt.
///
/// The id is minted before the request leaves the client and every state
/// mutation for the job is tagged with it, so a response arriving after the
/// job has been superseded can be recognized and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Mint a fresh identifier, unique across the session.
    pub fn generate() -> Self {
        Self(format!("task_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document picked for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SubmissionFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}
