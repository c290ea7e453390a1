//! Axum route handlers for the resume API.
//!
//! Mutations check the premium tier before touching the database. Lookups are
//! always scoped to the requester, so a foreign id is a 404, never a 403.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::user::User;
use crate::permissions::{self, Access};
use crate::resumes::payload::ResumePayload;
use crate::resumes::{ResumeAggregate, ResumeExport};
use crate::state::AppState;

fn resume_not_found() -> AppError {
    AppError::NotFound("Resume not found".to_string())
}

async fn load_owned(
    state: &AppState,
    user: &User,
    resume_id: Uuid,
) -> Result<ResumeAggregate, AppError> {
    let resume = state
        .resumes
        .get_for_user(resume_id, user.id)
        .await?
        .ok_or_else(resume_not_found)?;
    permissions::premium_or_read_only(user, Access::Read, &resume)?;
    Ok(resume)
}

/// Write permission needs only the resume row, not its sections.
async fn authorize_write(state: &AppState, user: &User, resume_id: Uuid) -> Result<(), AppError> {
    let row = state
        .resumes
        .find_row_for_user(resume_id, user.id)
        .await?
        .ok_or_else(resume_not_found)?;
    permissions::premium_or_read_only(user, Access::Write, &row)
}

/// GET /resumes/
pub async fn handle_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ResumeAggregate>>, AppError> {
    let resumes = state.resumes.list_for_user(user.id).await?;
    Ok(Json(resumes))
}

/// POST /resumes/
pub async fn handle_create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<ResumePayload>,
) -> Result<(StatusCode, Json<ResumeAggregate>), AppError> {
    permissions::require_premium(&user)?;
    let new = payload.into_new_resume()?;
    let resume = state.resumes.create(user.id, new).await?;
    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /resumes/{id}/
pub async fn handle_retrieve(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeAggregate>, AppError> {
    let resume = load_owned(&state, &user, resume_id).await?;
    Ok(Json(resume))
}

async fn apply_update(
    state: &AppState,
    user: &User,
    resume_id: Uuid,
    payload: ResumePayload,
    partial: bool,
) -> Result<ResumeAggregate, AppError> {
    permissions::require_premium(user)?;
    let changes = payload.into_changes(partial)?;
    authorize_write(state, user, resume_id).await?;
    state.resumes.update(resume_id, user.id, changes).await
}

/// PUT /resumes/{id}/
pub async fn handle_update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(resume_id): Path<Uuid>,
    AppJson(payload): AppJson<ResumePayload>,
) -> Result<Json<ResumeAggregate>, AppError> {
    Ok(Json(
        apply_update(&state, &user, resume_id, payload, false).await?,
    ))
}

/// PATCH /resumes/{id}/
pub async fn handle_patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(resume_id): Path<Uuid>,
    AppJson(payload): AppJson<ResumePayload>,
) -> Result<Json<ResumeAggregate>, AppError> {
    Ok(Json(
        apply_update(&state, &user, resume_id, payload, true).await?,
    ))
}

/// DELETE /resumes/{id}/
pub async fn handle_delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    permissions::require_premium(&user)?;
    authorize_write(&state, &user, resume_id).await?;
    if !state.resumes.delete(resume_id, user.id).await? {
        return Err(resume_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /resumes/{id}/export/
pub async fn handle_export(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeExport>, AppError> {
    let resume = load_owned(&state, &user, resume_id).await?;
    Ok(Json(ResumeExport {
        export_date: Utc::now(),
        user: user.username,
        resume_data: resume,
    }))
}
