mod auth;
mod config;
mod db;
mod enhancement;
mod errors;
mod extract;
mod llm_client;
mod models;
mod permissions;
mod resumes;
mod routes;
mod state;
mod uploads;
mod validation;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::tokens::TokenService;
use crate::config::Config;
use crate::db::create_pool;
use crate::enhancement::TextEnhancer;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::resumes::repository::PgResumeRepository;
use crate::routes::build_router;
use crate::state::AppState;
use crate::uploads::analysis::AnalysisPipeline;
use crate::uploads::pdf::PdfTextExtractor;
use crate::uploads::queue::AnalysisQueue;
use crate::uploads::repository::{PgUploadRepository, UploadRepository};
use crate::uploads::storage::{BlobStore, S3BlobStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let blobs: Arc<dyn BlobStore> = Arc::new(S3BlobStore::from_config(&config).await);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());
    let generator: Arc<dyn TextGenerator> = Arc::new(llm);

    // Background analysis worker
    let uploads: Arc<dyn UploadRepository> = Arc::new(PgUploadRepository::new(db.clone()));
    let pipeline = AnalysisPipeline::new(
        uploads.clone(),
        blobs.clone(),
        Arc::new(PdfTextExtractor),
        generator.clone(),
    );
    let analysis_queue = AnalysisQueue::start(pipeline);
    info!("Analysis worker started");

    // Build app state
    let state = AppState {
        db: db.clone(),
        tokens: TokenService::from_config(&config),
        enhancer: TextEnhancer::new(generator),
        resumes: Arc::new(PgResumeRepository::new(db.clone())),
        uploads,
        blobs,
        analysis_queue,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the frontend host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
