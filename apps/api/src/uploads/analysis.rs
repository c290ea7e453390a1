//! Resume analysis job: stored PDF → text → LLM feedback → record update.
//!
//! Every status write is a guarded transition, so a job never moves a record
//! backwards and a second job for the same upload is a no-op.

use std::sync::Arc;

use bytes::Bytes;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{parse_json_output, TextGenerator};
use crate::models::upload::UploadStatus;
use crate::uploads::pdf::TextExtractor;
use crate::uploads::prompts::build_analysis_prompt;
use crate::uploads::repository::UploadRepository;
use crate::uploads::storage::BlobStore;

/// Structured feedback stored in `analysis_results` when analysis succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub improvements: Vec<String>,
    /// Always within 0..=100.
    #[serde(deserialize_with = "lenient_score")]
    pub score: u8,
    #[serde(default, deserialize_with = "one_or_many")]
    pub recommendations: Vec<String>,
}

/// Accepts `85`, `85.4`, `"85"` or `"85/100"`, clamped into 0..=100.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(s) => s
            .trim()
            .trim_end_matches("/100")
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("score is not numeric: {s:?}")))?,
    };
    if !value.is_finite() {
        return Err(de::Error::custom("score is not a finite number"));
    }
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(item) => vec![item],
        Raw::Many(items) => items,
    })
}

/// Expected ways for analysis to fail. Their messages are what clients see.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisFailure {
    #[error("Could not extract text from the provided PDF.")]
    NoText,

    #[error("Failed to get analysis from AI service.")]
    Ai,
}

impl AnalysisFailure {
    pub fn payload(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    uploads: Arc<dyn UploadRepository>,
    blobs: Arc<dyn BlobStore>,
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<dyn TextGenerator>,
}

impl AnalysisPipeline {
    pub fn new(
        uploads: Arc<dyn UploadRepository>,
        blobs: Arc<dyn BlobStore>,
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            uploads,
            blobs,
            extractor,
            generator,
        }
    }

    /// Runs one analysis attempt. Never returns an error: unexpected failures are
    /// recorded on the upload, and if even that write fails it is only logged.
    pub async fn run(&self, upload_id: Uuid) {
        let Err(e) = self.process(upload_id).await else {
            return;
        };
        error!(upload_id = %upload_id, "Analysis failed: {e}");
        let payload = json!({ "error": e.to_string() });
        if let Err(write_err) = self
            .uploads
            .transition(upload_id, UploadStatus::Failed, Some(payload))
            .await
        {
            error!(upload_id = %upload_id, "Could not record analysis failure: {write_err}");
        }
    }

    async fn process(&self, upload_id: Uuid) -> Result<(), AppError> {
        if !self
            .uploads
            .transition(upload_id, UploadStatus::Processing, None)
            .await?
        {
            info!(upload_id = %upload_id, "Upload is no longer pending, skipping analysis");
            return Ok(());
        }

        let record = self
            .uploads
            .get(upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;
        let bytes = self.blobs.get(&record.file_key).await?;

        let (status, results) = match self.analyze(bytes).await {
            Ok(report) => (
                UploadStatus::Complete,
                serde_json::to_value(&report).map_err(|e| AppError::Internal(e.into()))?,
            ),
            Err(failure) => (UploadStatus::Failed, failure.payload()),
        };

        if self
            .uploads
            .transition(upload_id, status, Some(results))
            .await?
        {
            info!(upload_id = %upload_id, status = status.as_str(), "Analysis finished");
        } else {
            warn!(upload_id = %upload_id, "Upload left processing before analysis finished");
        }
        Ok(())
    }

    /// Extracts text off the async runtime and asks the LLM for a report.
    pub async fn analyze(&self, pdf: Bytes) -> Result<AnalysisReport, AnalysisFailure> {
        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract(&pdf))
            .await
            .unwrap_or_else(|e| {
                warn!("Text extraction task failed: {e}");
                String::new()
            });
        let text = text.trim();
        if text.is_empty() {
            return Err(AnalysisFailure::NoText);
        }

        let raw = self
            .generator
            .generate(&build_analysis_prompt(text), JSON_ONLY_SYSTEM)
            .await
            .map_err(|e| {
                warn!("Analysis LLM call failed: {e}");
                AnalysisFailure::Ai
            })?;

        parse_json_output::<AnalysisReport>(&raw).map_err(|e| {
            warn!("Analysis response was not a valid report: {e}");
            AnalysisFailure::Ai
        })
    }
}
