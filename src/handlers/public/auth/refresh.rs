// handlers/public/auth/refresh.rs - POST /api/auth/refresh handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::TokenKind;
use crate::error::{ApiError, ApiResult, STAFF_ONLY};
use crate::middleware::ValidQuery;
use crate::state::AppState;

/// Refresh token, accepted from the JSON body or the query string.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// POST /api/auth/refresh - Mint a new access token from a refresh token
///
/// The user's current staff flag is checked before anything is issued, so
/// revoking staff also stops outstanding refresh tokens. No new refresh token
/// is returned.
pub async fn refresh(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<RefreshRequest>,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<RefreshResponse> {
    let token = body
        .and_then(|Json(body)| body.refresh_token)
        .or(query.refresh_token)
        .filter(|token| !token.trim().is_empty())
        .ok_or(ApiError::Unauthenticated)?;

    let claims = state
        .tokens
        .verify(token.trim())
        .filter(|claims| claims.kind == TokenKind::Refresh)
        .ok_or(ApiError::Unauthenticated)?;

    let user = state
        .store
        .find_user_by_id(claims.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !user.is_staff {
        tracing::warn!("Refresh refused for non-staff user '{}'", user.email);
        return Err(ApiError::forbidden(STAFF_ONLY));
    }

    let access_token = state.tokens.issue(&claims.subject(), TokenKind::Access)?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "bearer",
    }))
}
