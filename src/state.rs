use std::sync::Arc;

use crate::auth::{TokenCodec, TokenError};
use crate::config::AppConfig;
use crate::database::Store;

/// Shared handles passed to every handler through axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenCodec>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, TokenError> {
        let tokens = TokenCodec::from_config(&config.security)?;
        Ok(Self {
            store,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        })
    }
}
