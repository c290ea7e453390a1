//! Axum route handlers for resume upload and analysis status.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{AppError, FieldErrors};
use crate::models::upload::{UploadStatus, UploadedResume};
use crate::permissions;
use crate::state::AppState;
use crate::uploads::storage;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Transport limit for the upload route: the file plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

const FILE_FIELD: &str = "file";

/// A file part pulled out of the multipart body.
#[derive(Debug)]
pub struct IncomingFile {
    pub filename: String,
    pub data: Bytes,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub status: UploadStatus,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub upload_id: Uuid,
    pub status: UploadStatus,
    pub is_processing_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_results: Option<Value>,
}

impl From<UploadedResume> for StatusResponse {
    fn from(record: UploadedResume) -> Self {
        let is_processing_complete = record.is_processing_complete();
        // Failure payloads stay internal; clients only see results of a finished analysis.
        let analysis_results = match record.status {
            UploadStatus::Complete => record.analysis_results,
            _ => None,
        };
        Self {
            upload_id: record.id,
            status: record.status,
            is_processing_complete,
            analysis_results,
        }
    }
}

/// Checks, in order: a file was sent, it is a PDF by name, it fits the size cap.
pub fn validate_upload(file: Option<IncomingFile>) -> Result<IncomingFile, AppError> {
    let file = file.ok_or_else(|| {
        AppError::InvalidFields(FieldErrors::single(FILE_FIELD, "No file provided"))
    })?;
    if !file.filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::InvalidFields(FieldErrors::single(
            FILE_FIELD,
            "Only PDF files are supported",
        )));
    }
    if file.data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::InvalidFields(FieldErrors::single(
            FILE_FIELD,
            "File size must be less than 10MB",
        )));
    }
    Ok(file)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File size must be less than 10MB".to_string())
    } else {
        AppError::Validation(format!("Malformed multipart body: {}", e.body_text()))
    }
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<IncomingFile>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(IncomingFile { filename, data }));
    }
    Ok(None)
}

/// Stores the file, records it as pending and queues analysis.
///
/// A record that cannot be inserted leaves no blob behind; a record whose job
/// cannot be queued is marked failed.
pub async fn accept_upload(
    state: &AppState,
    user_id: Uuid,
    file: IncomingFile,
) -> Result<UploadedResume, AppError> {
    let upload_id = Uuid::new_v4();
    let key = storage::upload_key(Utc::now(), upload_id, &file.filename);
    state.blobs.put(&key, file.data, "application/pdf").await?;

    let record = match state
        .uploads
        .create(upload_id, user_id, &key, &file.filename)
        .await
    {
        Ok(record) => record,
        Err(e) => {
            if let Err(delete_err) = state.blobs.delete(&key).await {
                error!(upload_id = %upload_id, key = %key, "Orphaned upload blob: {delete_err}");
            }
            return Err(e);
        }
    };

    if let Err(e) = state.analysis_queue.enqueue(record.id) {
        let payload = json!({ "error": e.to_string() });
        if let Err(write_err) = state
            .uploads
            .transition(record.id, UploadStatus::Failed, Some(payload))
            .await
        {
            error!(upload_id = %record.id, "Could not record enqueue failure: {write_err}");
        }
        return Err(e);
    }
    Ok(record)
}

/// POST /upload/
///
/// Returns before analysis starts; clients poll `/status/{upload_id}/`.
pub async fn handle_upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let file = validate_upload(read_file_field(&mut multipart).await?)?;
    let size = file.data.len();
    let record = accept_upload(&state, user.id, file).await?;

    info!(
        upload_id = %record.id,
        user_id = %user.id,
        size_bytes = size,
        "Resume uploaded, analysis queued"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            upload_id: record.id,
            status: record.status,
            message: "File uploaded successfully. AI analysis started.",
        }),
    ))
}

/// GET /status/{upload_id}/
pub async fn handle_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let record = state
        .uploads
        .get_for_user(upload_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;
    permissions::check_ownership(&user, &record)?;
    Ok(Json(StatusResponse::from(record)))
}
