use async_trait::async_trait;
use thiserror::Error;

use super::models::{
    ArticleChanges, DashboardStats, KbArticle, NewArticle, NewUser, TicketWithMessages, User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Everything the handlers and the auth gate need from persistence.
///
/// Mutations that match no row return `StoreError::NotFound`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    // Users
    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn set_staff(&self, email: &str, is_staff: bool) -> Result<User, StoreError>;

    // Tickets
    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError>;
    async fn list_tickets(&self, status: Option<&str>) -> Result<Vec<TicketWithMessages>, StoreError>;
    async fn update_ticket_status(&self, id: i32, status: &str) -> Result<(), StoreError>;
    async fn add_ticket_message(&self, ticket_id: i32, user_id: i32, message: &str) -> Result<(), StoreError>;

    // Knowledge base
    async fn list_articles(&self) -> Result<Vec<KbArticle>, StoreError>;
    async fn get_article(&self, id: i32) -> Result<KbArticle, StoreError>;
    async fn create_article(&self, article: NewArticle) -> Result<KbArticle, StoreError>;
    async fn update_article(&self, id: i32, changes: ArticleChanges) -> Result<KbArticle, StoreError>;
    async fn publish_article(&self, id: i32) -> Result<KbArticle, StoreError>;
    async fn delete_article(&self, id: i32) -> Result<(), StoreError>;
}
