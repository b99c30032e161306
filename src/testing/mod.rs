//! In-memory `Store` and fixtures for router and gate tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};

use crate::auth::password::hash_password_with_cost;
use crate::config::AppConfig;
use crate::database::models::{
    ArticleChanges, DashboardStats, KbArticle, NewArticle, NewUser, Ticket, TicketMessage,
    TicketWithMessages, User,
};
use crate::database::{Store, StoreError};
use crate::state::AppState;

pub const ALICE_PASSWORD: &str = "wonderland";
pub const BOB_PASSWORD: &str = "builder";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tickets: Vec<TicketRow>,
    messages: Vec<MessageRow>,
    articles: Vec<KbArticle>,
}

#[derive(Clone)]
struct TicketRow {
    id: i32,
    user_id: i32,
    title: String,
    description: String,
    status: String,
    priority: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(Clone)]
struct MessageRow {
    id: i32,
    ticket_id: i32,
    user_id: i32,
    message: String,
    created_at: NaiveDateTime,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl MemoryStore {
    /// alice (id 1, staff), bob (id 2, customer), two tickets owned by bob,
    /// one draft article.
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut t = store.tables.lock().unwrap();
            let created = now();
            for (id, email, username, password, is_staff) in [
                (1, "alice@example.com", "alice", ALICE_PASSWORD, true),
                (2, "bob@example.com", "bob", BOB_PASSWORD, false),
            ] {
                t.users.push(User {
                    id,
                    email: email.to_string(),
                    username: username.to_string(),
                    hashed_password: hash_password_with_cost(password, 4).unwrap(),
                    is_staff,
                    created_at: created,
                    updated_at: created,
                });
            }
            for (id, title, status) in [(1, "Cannot log in", "open"), (2, "Billing question", "in_progress")] {
                t.tickets.push(TicketRow {
                    id,
                    user_id: 2,
                    title: title.to_string(),
                    description: format!("{} - details", title),
                    status: status.to_string(),
                    priority: "medium".to_string(),
                    created_at: created,
                    updated_at: created,
                });
            }
            t.articles.push(KbArticle {
                id: 1,
                title: "Resetting your password".to_string(),
                content: "Use the reset link on the login page.".to_string(),
                category: Some("accounts".to_string()),
                is_published: false,
                created_at: created,
                updated_at: created,
            });
        }
        store
    }

    /// Make `ping` fail as if the database were unreachable.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn revoke_staff(&self, email: &str) {
        let mut t = self.tables.lock().unwrap();
        if let Some(user) = t.users.iter_mut().find(|u| u.email == email) {
            user.is_staff = false;
        }
    }

    pub fn ticket_status(&self, id: i32) -> Option<String> {
        let t = self.tables.lock().unwrap();
        t.tickets.iter().find(|row| row.id == id).map(|row| row.status.clone())
    }

    pub fn message_count(&self) -> usize {
        self.tables.lock().unwrap().messages.len()
    }
}

fn next_id<T>(rows: &[T], id: impl Fn(&T) -> i32) -> i32 {
    rows.iter().map(id).max().unwrap_or(0) + 1
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.email == user.email || u.username == user.username) {
            return Err(StoreError::Conflict("user already exists".to_string()));
        }
        let created = now();
        let row = User {
            id: next_id(&t.users, |u| u.id),
            email: user.email,
            username: user.username,
            hashed_password: user.hashed_password,
            is_staff: user.is_staff,
            created_at: created,
            updated_at: created,
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn set_staff(&self, email: &str, is_staff: bool) -> Result<User, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", email)))?;
        user.is_staff = is_staff;
        user.updated_at = now();
        Ok(user.clone())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let t = self.tables.lock().unwrap();
        let today = Utc::now().date_naive().and_hms_opt(0, 0, 0).expect("midnight");
        let count = |status: &str| t.tickets.iter().filter(|row| row.status == status).count() as i64;

        Ok(DashboardStats {
            open_tickets: count("open"),
            in_progress_tickets: count("in_progress"),
            closed_today: t
                .tickets
                .iter()
                .filter(|row| row.status == "closed" && row.updated_at > today)
                .count() as i64,
            total_articles: t.articles.len() as i64,
        })
    }

    async fn list_tickets(&self, status: Option<&str>) -> Result<Vec<TicketWithMessages>, StoreError> {
        let t = self.tables.lock().unwrap();
        let names_of = |id: i32| {
            t.users
                .iter()
                .find(|u| u.id == id)
                .map(|u| (u.email.clone(), u.username.clone()))
                .unwrap_or_default()
        };

        let mut rows: Vec<&TicketRow> = t
            .tickets
            .iter()
            .filter(|row| status.map_or(true, |s| row.status == s))
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(rows
            .into_iter()
            .map(|row| TicketWithMessages {
                ticket: Ticket {
                    id: row.id,
                    user_id: row.user_id,
                    user_email: names_of(row.user_id).0,
                    title: row.title.clone(),
                    description: row.description.clone(),
                    status: row.status.clone(),
                    priority: row.priority.clone(),
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
                messages: t
                    .messages
                    .iter()
                    .filter(|m| m.ticket_id == row.id)
                    .map(|m| TicketMessage {
                        id: m.id,
                        ticket_id: m.ticket_id,
                        user_id: m.user_id,
                        author: names_of(m.user_id).1,
                        message: m.message.clone(),
                        created_at: m.created_at,
                    })
                    .collect(),
            })
            .collect())
    }

    async fn update_ticket_status(&self, id: i32, status: &str) -> Result<(), StoreError> {
        let mut t = self.tables.lock().unwrap();
        let row = t
            .tickets
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("ticket {}", id)))?;
        row.status = status.to_string();
        row.updated_at = now();
        Ok(())
    }

    async fn add_ticket_message(&self, ticket_id: i32, user_id: i32, message: &str) -> Result<(), StoreError> {
        let mut t = self.tables.lock().unwrap();
        if !t.tickets.iter().any(|row| row.id == ticket_id) {
            return Err(StoreError::NotFound(format!("ticket {}", ticket_id)));
        }
        let id = next_id(&t.messages, |m| m.id);
        t.messages.push(MessageRow {
            id,
            ticket_id,
            user_id,
            message: message.to_string(),
            created_at: now(),
        });
        Ok(())
    }

    async fn list_articles(&self) -> Result<Vec<KbArticle>, StoreError> {
        let t = self.tables.lock().unwrap();
        let mut articles = t.articles.clone();
        articles.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(articles)
    }

    async fn get_article(&self, id: i32) -> Result<KbArticle, StoreError> {
        let t = self.tables.lock().unwrap();
        t.articles
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("article {}", id)))
    }

    async fn create_article(&self, article: NewArticle) -> Result<KbArticle, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let created = now();
        let row = KbArticle {
            id: next_id(&t.articles, |a| a.id),
            title: article.title,
            content: article.content,
            category: article.category,
            is_published: article.is_published,
            created_at: created,
            updated_at: created,
        };
        t.articles.push(row.clone());
        Ok(row)
    }

    async fn update_article(&self, id: i32, changes: ArticleChanges) -> Result<KbArticle, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let article = t
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("article {}", id)))?;

        if let Some(title) = changes.title {
            article.title = title;
        }
        if let Some(content) = changes.content {
            article.content = content;
        }
        if let Some(category) = changes.category {
            article.category = category;
        }
        if let Some(is_published) = changes.is_published {
            article.is_published = is_published;
        }
        article.updated_at = now();
        Ok(article.clone())
    }

    async fn publish_article(&self, id: i32) -> Result<KbArticle, StoreError> {
        self.update_article(
            id,
            ArticleChanges {
                is_published: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    async fn delete_article(&self, id: i32) -> Result<(), StoreError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.articles.len();
        t.articles.retain(|a| a.id != id);
        if t.articles.len() == before {
            return Err(StoreError::NotFound(format!("article {}", id)));
        }
        Ok(())
    }
}

pub fn test_state(store: MemoryStore) -> AppState {
    AppState::new(AppConfig::for_tests(), Arc::new(store)).unwrap()
}
