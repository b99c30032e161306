use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::database::models::{ArticleChanges, KbArticle, NewArticle};
use crate::error::{ApiError, ApiResult};
use crate::middleware::json::require_text;
use crate::middleware::{Validate, ValidJson, ValidPath};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ArticleCreate {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

impl Validate for ArticleCreate {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)
    }
}

impl From<ArticleCreate> for NewArticle {
    fn from(body: ArticleCreate) -> Self {
        Self {
            title: body.title,
            content: body.content,
            category: body.category,
            is_published: body.is_published,
        }
    }
}

/// Partial update; omitted fields keep their stored value.
/// `"category": null` clears the category.
#[derive(Debug, Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    pub is_published: Option<bool>,
}

impl Validate for ArticleUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(content) = &self.content {
            require_text("content", content)?;
        }
        Ok(())
    }
}

// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<ArticleUpdate> for ArticleChanges {
    fn from(body: ArticleUpdate) -> Self {
        Self {
            title: body.title,
            content: body.content,
            category: body.category,
            is_published: body.is_published,
        }
    }
}

/// GET /staff/kb/articles
pub async fn list_articles(State(state): State<AppState>) -> ApiResult<Vec<KbArticle>> {
    Ok(Json(state.store.list_articles().await?))
}

/// GET /staff/kb/articles/:id
pub async fn get_article(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i32>,
) -> ApiResult<KbArticle> {
    Ok(Json(state.store.get_article(id).await?))
}

/// POST /staff/kb/articles - 201 with the stored article
pub async fn create_article(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ArticleCreate>,
) -> Result<(StatusCode, Json<KbArticle>), ApiError> {
    let article = state.store.create_article(body.into()).await?;
    tracing::info!("KB article {} created", article.id);
    Ok((StatusCode::CREATED, Json(article)))
}

/// PUT /staff/kb/articles/:id
pub async fn update_article(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i32>,
    ValidJson(body): ValidJson<ArticleUpdate>,
) -> ApiResult<KbArticle> {
    Ok(Json(state.store.update_article(id, body.into()).await?))
}

/// POST /staff/kb/articles/:id/publish
pub async fn publish_article(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i32>,
) -> ApiResult<KbArticle> {
    let article = state.store.publish_article(id).await?;
    tracing::info!("KB article {} published", id);
    Ok(Json(article))
}

/// DELETE /staff/kb/articles/:id
pub async fn delete_article(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i32>,
) -> ApiResult<Value> {
    state.store.delete_article(id).await?;
    tracing::info!("KB article {} deleted", id);
    Ok(Json(json!({ "status": "success" })))
}
