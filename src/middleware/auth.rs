use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Claims, TokenKind};
use crate::error::{ApiError, STAFF_ONLY};
use crate::state::AppState;

/// Staff identity injected into request extensions by the auth gate
#[derive(Clone, Debug)]
pub struct StaffUser {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    pub claims: Claims,
}

/// Gate for every `/staff` route: bearer token, access kind, live staff flag.
pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let staff = authorize(&state, request.headers()).await?;
    request.extensions_mut().insert(staff);
    Ok(next.run(request).await)
}

/// Run the three gate checks against the request headers.
///
/// Header and token problems all produce `Unauthenticated`; only a known user
/// without the staff flag produces `Forbidden`.
pub async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<StaffUser, ApiError> {
    let token = extract_bearer(headers).ok_or_else(|| {
        tracing::debug!("Rejected request without a usable bearer token");
        ApiError::Unauthenticated
    })?;

    let claims = state
        .tokens
        .verify(token)
        .filter(|claims| claims.kind == TokenKind::Access)
        .ok_or(ApiError::Unauthenticated)?;

    // Staff status is read from the store every time; the token claim may be stale
    let user = state
        .store
        .find_user_by_id(claims.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Token for unknown user id {} rejected", claims.user_id);
            ApiError::Unauthenticated
        })?;

    if !user.is_staff {
        tracing::warn!("Non-staff user '{}' denied staff access", user.email);
        return Err(ApiError::forbidden(STAFF_ONLY));
    }

    Ok(StaffUser {
        user_id: user.id,
        email: user.email,
        username: user.username,
        claims,
    })
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
