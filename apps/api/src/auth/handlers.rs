//! Registration, login, token refresh and profile endpoints.

use std::sync::LazyLock;

use anyhow::anyhow;
use axum::{extract::State, http::StatusCode, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::repository;
use crate::auth::tokens::TokenType;
use crate::auth::AuthUser;
use crate::errors::{AppError, FieldErrors};
use crate::extract::AppJson;
use crate::models::user::{User, UserProfile};
use crate::state::AppState;
use crate::validation;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 150;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

fn validate_registration(req: &RegisterRequest) -> Result<(String, String), AppError> {
    let mut errors = FieldErrors::new();
    let username =
        validation::required_text(&mut errors, "username", &req.username, MAX_USERNAME_LEN);
    if !username.is_empty() && !USERNAME_RE.is_match(&username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    let email = validation::email(&mut errors, "email", &req.email);
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    errors.into_result()?;
    Ok((username, email))
}

fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse, AppError> {
    let pair = state.tokens.issue_pair(user.id)?;
    Ok(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: UserProfile::from(user),
    })
}

/// POST /auth/registration/
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (username, email) = validate_registration(&req)?;

    let password = req.password;
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| AppError::Internal(anyhow!("password hashing task failed: {e}")))?
            .map_err(|e| AppError::Internal(anyhow!("password hashing failed: {e}")))?;

    let user = repository::create_user(&state.db, &username, &email, &password_hash).await?;
    info!(user_id = %user.id, "Registered user {}", user.username);

    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// POST /auth/login/
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = repository::find_by_username(&state.db, req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let password = req.password;
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow!("password check task failed: {e}")))?
        .unwrap_or(false);
    if !valid {
        return Err(AppError::Unauthorized);
    }

    Ok(Json(auth_response(&state, &user)?))
}

/// POST /auth/token/refresh/
pub async fn handle_refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = state.tokens.verify(&req.refresh_token, TokenType::Refresh)?;
    let user = repository::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(auth_response(&state, &user)?))
}

/// GET /auth/user/
pub async fn handle_me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}
