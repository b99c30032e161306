use axum::{
    extract::State,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::TicketWithMessages;
use crate::error::{ApiError, ApiResult};
use crate::middleware::json::require_text;
use crate::middleware::{StaffUser, Validate, ValidJson, ValidPath, ValidQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
}

impl TicketQuery {
    /// `None` for no filter; absent, blank and `all` all mean every status.
    pub fn status_filter(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "all")
    }
}

#[derive(Debug, Deserialize)]
pub struct TicketUpdate {
    pub status: String,
}

impl Validate for TicketUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("status", &self.status)
    }
}

#[derive(Debug, Deserialize)]
pub struct NoteCreate {
    pub content: String,
}

impl Validate for NoteCreate {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("content", &self.content)
    }
}

/// GET /staff/tickets?status= - Tickets newest first, each with its messages
pub async fn list_tickets(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<TicketQuery>,
) -> ApiResult<Vec<TicketWithMessages>> {
    let tickets = state.store.list_tickets(query.status_filter()).await?;
    Ok(Json(tickets))
}

/// PUT /staff/tickets/:id - Set a ticket's status
pub async fn update_ticket(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i32>,
    Extension(staff): Extension<StaffUser>,
    ValidJson(body): ValidJson<TicketUpdate>,
) -> ApiResult<Value> {
    let status = body.status.trim();
    state.store.update_ticket_status(id, status).await?;

    tracing::info!("Ticket {} set to '{}' by {}", id, status, staff.email);
    Ok(Json(json!({ "status": "success" })))
}

/// POST /staff/tickets/:id/messages - Append a staff message to a ticket
pub async fn add_message(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i32>,
    Extension(staff): Extension<StaffUser>,
    ValidJson(body): ValidJson<NoteCreate>,
) -> ApiResult<Value> {
    state
        .store
        .add_ticket_message(id, staff.user_id, &body.content)
        .await?;

    tracing::debug!("Message added to ticket {} by {}", id, staff.email);
    Ok(Json(json!({ "status": "success" })))
}
