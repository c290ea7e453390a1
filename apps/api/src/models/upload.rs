use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::UnknownVariant;

/// Processing state of an uploaded resume.
///
/// Moves forward only: `pending → processing → complete | failed`.
/// `failed` is also reachable straight from `pending` when a job dies before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Processing => "processing",
            UploadStatus::Complete => "complete",
            UploadStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Complete | UploadStatus::Failed)
    }

    /// States a record may be in immediately before entering `self`.
    pub fn predecessors(&self) -> &'static [UploadStatus] {
        match self {
            UploadStatus::Pending => &[],
            UploadStatus::Processing => &[UploadStatus::Pending],
            UploadStatus::Complete => &[UploadStatus::Processing],
            UploadStatus::Failed => &[UploadStatus::Pending, UploadStatus::Processing],
        }
    }

    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        next.predecessors().contains(self)
    }
}

impl TryFrom<String> for UploadStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(UploadStatus::Pending),
            "processing" => Ok(UploadStatus::Processing),
            "complete" => Ok(UploadStatus::Complete),
            "failed" => Ok(UploadStatus::Failed),
            _ => Err(UnknownVariant {
                kind: "upload status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UploadedResume {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Object key in blob storage.
    pub file_key: String,
    pub original_filename: String,
    #[sqlx(try_from = "String")]
    pub status: UploadStatus,
    pub analysis_results: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadedResume {
    pub fn is_processing_complete(&self) -> bool {
        self.status.is_terminal()
    }
}
