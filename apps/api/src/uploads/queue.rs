use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::uploads::analysis::AnalysisPipeline;

/// Hands upload ids to a background worker. Each id gets one detached,
/// single-attempt analysis task; there is no retry and no cancellation.
#[derive(Clone)]
pub struct AnalysisQueue {
    sender: mpsc::UnboundedSender<Uuid>,
}

impl AnalysisQueue {
    /// Spawns the worker on the current runtime.
    pub fn start(pipeline: AnalysisPipeline) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Uuid>();
        tokio::spawn(async move {
            while let Some(upload_id) = receiver.recv().await {
                debug!(upload_id = %upload_id, "Starting analysis job");
                let pipeline = pipeline.clone();
                tokio::spawn(async move { pipeline.run(upload_id).await });
            }
            info!("Analysis queue closed");
        });
        Self { sender }
    }

    pub fn enqueue(&self, upload_id: Uuid) -> Result<(), AppError> {
        self.sender
            .send(upload_id)
            .map_err(|_| AppError::Internal(anyhow!("analysis worker is not running")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::llm_client::fakes::FakeGenerator;
    use crate::models::upload::UploadStatus;
    use crate::uploads::pdf::TextExtractor;
    use crate::uploads::repository::fakes::MemoryUploadRepository;
    use crate::uploads::repository::UploadRepository;
    use crate::uploads::storage::fakes::MemoryBlobStore;
    use crate::uploads::storage::BlobStore;

    struct Echo;

    impl TextExtractor for Echo {
        fn extract(&self, bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }

    #[tokio::test]
    async fn test_enqueued_upload_reaches_terminal_state() {
        let uploads = Arc::new(MemoryUploadRepository::default());
        let blobs = Arc::new(MemoryBlobStore::default());
        let generator = FakeGenerator::replying(
            r#"{"summary": "ok", "strengths": [], "improvements": [], "score": 70, "recommendations": []}"#,
        );
        let queue = AnalysisQueue::start(AnalysisPipeline::new(
            uploads.clone(),
            blobs.clone(),
            Arc::new(Echo),
            generator,
        ));

        let id = Uuid::new_v4();
        uploads
            .create(id, Uuid::new_v4(), "k.pdf", "k.pdf")
            .await
            .unwrap();
        blobs
            .put("k.pdf", Bytes::from_static(b"John Doe"), "application/pdf")
            .await
            .unwrap();

        queue.enqueue(id).unwrap();

        for _ in 0..200 {
            if uploads.status_of(id).is_some_and(|s| s.is_terminal()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(uploads.status_of(id), Some(UploadStatus::Complete));
    }
}
