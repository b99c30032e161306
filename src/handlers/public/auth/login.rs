// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{verify_absent_user, verify_password, TokenKind, TokenSubject};
use crate::database::models::UserSummary;
use crate::error::{ApiError, ApiResult, INVALID_CREDENTIALS};
use crate::middleware::{Validate, ValidJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Blank values fall through to the uniform credential failure
impl Validate for LoginRequest {}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: UserSummary,
}

/// POST /api/auth/login - Staff-only login
///
/// Unknown email and wrong password produce the same 401 body after the same
/// bcrypt work. A correct
/// password for a non-staff account produces 403 with the same message text.
///
/// ```json
/// { "email": "alice@example.com", "password": "..." }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let found = state.store.find_user_by_email(body.email.trim()).await?;
    let verified = match &found {
        Some(user) => verify_password(&body.password, &user.hashed_password),
        None => verify_absent_user(&body.password),
    };

    let user = found
        .filter(|_| verified)
        .ok_or_else(|| {
            tracing::info!("Failed login attempt for '{}'", body.email);
            ApiError::InvalidCredentials
        })?;

    if !user.is_staff {
        tracing::warn!("Non-staff user '{}' attempted staff login", user.email);
        return Err(ApiError::forbidden(INVALID_CREDENTIALS));
    }

    let subject = TokenSubject {
        email: user.email.clone(),
        user_id: user.id,
        is_staff: user.is_staff,
    };

    let access_token = state.tokens.issue(&subject, TokenKind::Access)?;
    let refresh_token = state.tokens.issue(&subject, TokenKind::Refresh)?;

    tracing::info!("Staff user '{}' logged in", user.email);

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
        user: UserSummary::from(&user),
    }))
}
