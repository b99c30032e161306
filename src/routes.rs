use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{public, staff};
use crate::middleware::staff_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        // Staff only
        .merge(staff_routes(state.clone()))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
}

fn staff_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/staff/dashboard", get(staff::dashboard))
        // Tickets
        .route("/staff/tickets", get(staff::list_tickets))
        .route("/staff/tickets/:id", put(staff::update_ticket))
        .route("/staff/tickets/:id/messages", post(staff::add_message))
        // Knowledge base
        .route(
            "/staff/kb/articles",
            get(staff::list_articles).post(staff::create_article),
        )
        .route(
            "/staff/kb/articles/:id",
            get(staff::get_article)
                .put(staff::update_article)
                .delete(staff::delete_article),
        )
        .route("/staff/kb/articles/:id/publish", post(staff::publish_article))
        // route_layer keeps unknown paths at 404 rather than 401
        .route_layer(middleware::from_fn_with_state(state, staff_auth_middleware))
}

/// `*` allows any origin without credentials; explicit origins allow credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Staff Portal API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth/login, /api/auth/refresh (public)",
            "dashboard": "/staff/dashboard (staff)",
            "tickets": "/staff/tickets[/:id[/messages]] (staff)",
            "kb": "/staff/kb/articles[/:id[/publish]] (staff)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
