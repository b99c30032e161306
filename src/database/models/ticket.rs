use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// Ticket row joined with its owner's email.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ticket {
    pub id: i32,
    pub user_id: i32,
    pub user_email: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketMessage {
    pub id: i32,
    pub ticket_id: i32,
    pub user_id: i32,
    pub author: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketWithMessages {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
pub struct DashboardStats {
    pub open_tickets: i64,
    pub in_progress_tickets: i64,
    pub closed_today: i64,
    pub total_articles: i64,
}
