use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{
    ArticleChanges, DashboardStats, KbArticle, NewArticle, NewUser, Ticket, TicketMessage,
    TicketWithMessages, User,
};
use super::store::{Store, StoreError};

const USER_COLUMNS: &str =
    "id, email, username, hashed_password, is_staff, created_at, updated_at";

const TICKET_SELECT: &str = r#"
    SELECT t.id, t.user_id, u.email AS user_email, t.title, t.description,
           t.status, t.priority, t.created_at, t.updated_at
    FROM tickets t
    JOIN users u ON t.user_id = u.id
"#;

const TICKET_MESSAGES: &str = r#"
    SELECT m.id, m.ticket_id, m.user_id, u.username AS author, m.message, m.created_at
    FROM ticket_messages m
    JOIN users u ON m.user_id = u.id
    WHERE m.ticket_id = $1
    ORDER BY m.created_at ASC, m.id ASC
"#;

const ARTICLE_COLUMNS: &str =
    "id, title, content, category, is_published, created_at, updated_at";

/// PostgreSQL-backed store. Each call borrows a pooled connection and
/// releases it on drop, error paths included.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conflict_or(err: sqlx::Error, what: &str) -> StoreError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::Conflict(format!("{} already exists", what)),
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (email, username, hashed_password, is_staff) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.hashed_password)
            .bind(user.is_staff)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "user"))
    }

    async fn set_staff(&self, email: &str, is_staff: bool) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET is_staff = $1, updated_at = NOW() WHERE email = $2 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(is_staff)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", email)))
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tickets WHERE status = 'open') AS open_tickets,
                (SELECT COUNT(*) FROM tickets WHERE status = 'in_progress') AS in_progress_tickets,
                (SELECT COUNT(*) FROM tickets WHERE status = 'closed' AND updated_at > CURRENT_DATE) AS closed_today,
                (SELECT COUNT(*) FROM kb_articles) AS total_articles
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn list_tickets(&self, status: Option<&str>) -> Result<Vec<TicketWithMessages>, StoreError> {
        let mut conn = self.pool.acquire().await?;

        let tickets = match status {
            Some(status) => {
                let sql = format!("{} WHERE t.status = $1 ORDER BY t.created_at DESC, t.id DESC", TICKET_SELECT);
                sqlx::query_as::<_, Ticket>(&sql)
                    .bind(status)
                    .fetch_all(&mut *conn)
                    .await?
            }
            None => {
                let sql = format!("{} ORDER BY t.created_at DESC, t.id DESC", TICKET_SELECT);
                sqlx::query_as::<_, Ticket>(&sql).fetch_all(&mut *conn).await?
            }
        };

        let mut result = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let messages = sqlx::query_as::<_, TicketMessage>(TICKET_MESSAGES)
                .bind(ticket.id)
                .fetch_all(&mut *conn)
                .await?;
            result.push(TicketWithMessages { ticket, messages });
        }

        Ok(result)
    }

    async fn update_ticket_status(&self, id: i32, status: &str) -> Result<(), StoreError> {
        let done = sqlx::query("UPDATE tickets SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("ticket {}", id)));
        }
        Ok(())
    }

    async fn add_ticket_message(&self, ticket_id: i32, user_id: i32, message: &str) -> Result<(), StoreError> {
        // Inserts nothing when the ticket is missing instead of tripping the FK
        let done = sqlx::query(
            r#"
            INSERT INTO ticket_messages (ticket_id, user_id, message)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM tickets WHERE id = $1)
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(message)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("ticket {}", ticket_id)));
        }
        Ok(())
    }

    async fn list_articles(&self) -> Result<Vec<KbArticle>, StoreError> {
        let sql = format!(
            "SELECT {} FROM kb_articles ORDER BY created_at DESC, id DESC",
            ARTICLE_COLUMNS
        );
        let articles = sqlx::query_as::<_, KbArticle>(&sql).fetch_all(&self.pool).await?;
        Ok(articles)
    }

    async fn get_article(&self, id: i32) -> Result<KbArticle, StoreError> {
        let sql = format!("SELECT {} FROM kb_articles WHERE id = $1", ARTICLE_COLUMNS);
        sqlx::query_as::<_, KbArticle>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("article {}", id)))
    }

    async fn create_article(&self, article: NewArticle) -> Result<KbArticle, StoreError> {
        let sql = format!(
            "INSERT INTO kb_articles (title, content, category, is_published) VALUES ($1, $2, $3, $4) RETURNING {}",
            ARTICLE_COLUMNS
        );
        let created = sqlx::query_as::<_, KbArticle>(&sql)
            .bind(&article.title)
            .bind(&article.content)
            .bind(&article.category)
            .bind(article.is_published)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_article(&self, id: i32, changes: ArticleChanges) -> Result<KbArticle, StoreError> {
        let sql = format!(
            r#"
            UPDATE kb_articles SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                category = CASE WHEN $4 THEN $3 ELSE category END,
                is_published = COALESCE($5, is_published),
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        );
        sqlx::query_as::<_, KbArticle>(&sql)
            .bind(&changes.title)
            .bind(&changes.content)
            .bind(changes.category.clone().flatten())
            .bind(changes.category.is_some())
            .bind(changes.is_published)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("article {}", id)))
    }

    async fn publish_article(&self, id: i32) -> Result<KbArticle, StoreError> {
        let sql = format!(
            "UPDATE kb_articles SET is_published = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ARTICLE_COLUMNS
        );
        sqlx::query_as::<_, KbArticle>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("article {}", id)))
    }

    async fn delete_article(&self, id: i32) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM kb_articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("article {}", id)));
        }
        Ok(())
    }
}
