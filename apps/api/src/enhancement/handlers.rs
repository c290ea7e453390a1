use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::enhancement::{EnhanceRequest, EnhanceResponse};
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::permissions;
use crate::state::AppState;

/// POST /enhance-text/
///
/// Premium only. An AI outage still answers 200 with the original text.
pub async fn handle_enhance_text(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(request): AppJson<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, AppError> {
    permissions::require_premium(&user)?;
    let response = state.enhancer.handle(&request).await?;
    Ok(Json(response))
}
