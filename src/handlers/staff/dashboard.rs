use axum::{extract::State, Json};

use crate::database::models::DashboardStats;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /staff/dashboard - Ticket and article counts
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = state.store.dashboard_stats().await?;
    Ok(Json(stats))
}
