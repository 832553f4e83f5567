//! Remote data model and collaborator traits.
//!
//! The explorer core never talks HTTP itself; it consumes these traits and
//! leaves transport mechanics, retries beyond the poll interval, and
//! authentication to the implementor.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// Identifier of a remote job (plugin instance) whose output is browsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One file record from a job's flat output listing.
///
/// `path` is the server-side full path; `resource_url` is the download
/// locator handed back to [`BlobClient`] verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileRecord {
    pub id: u64,
    #[serde(alias = "fname")]
    pub path: String,
    #[serde(alias = "fsize", default)]
    pub size: u64,
    #[serde(alias = "file_resource")]
    pub resource_url: String,
}

/// Remote job status vocabulary as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Created,
    WaitingForPrevious,
    Scheduled,
    Started,
    FinishedSuccessfully,
    FinishedWithError,
    Cancelled,
}

impl JobState {
    /// Whether the remote job will make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::FinishedSuccessfully | JobState::FinishedWithError | JobState::Cancelled
        )
    }
}

/// One status fetch result for a job.
///
/// `files` is only expected to be present once the job finished
/// successfully; `logs` carries the job's compute log for diagnostic
/// display and is never parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    #[serde(alias = "status")]
    pub state: JobState,
    #[serde(default)]
    pub files: Option<Vec<FileRecord>>,
    #[serde(default)]
    pub logs: Option<String>,
}

/// Storage/transport collaborator: fetches job status and output listings.
#[async_trait]
pub trait StatusClient: Send + Sync {
    async fn fetch_job_status(&self, id: JobId) -> Result<JobStatusResponse>;
}

/// File content collaborator: fetches raw bytes for a file record.
#[async_trait]
pub trait BlobClient: Send + Sync {
    async fn fetch_blob(&self, file: &FileRecord) -> Result<Vec<u8>>;
}
