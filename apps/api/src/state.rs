use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::tokens::TokenService;
use crate::enhancement::TextEnhancer;
use crate::resumes::repository::ResumeRepository;
use crate::uploads::queue::AnalysisQueue;
use crate::uploads::repository::UploadRepository;
use crate::uploads::storage::BlobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Users and tokens are read straight from the pool by the auth module.
    pub db: PgPool,
    pub tokens: TokenService,
    pub enhancer: TextEnhancer,
    pub resumes: Arc<dyn ResumeRepository>,
    /// Upload records. Postgres in production; the analysis worker shares the same instance.
    pub uploads: Arc<dyn UploadRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub analysis_queue: AnalysisQueue,
}
