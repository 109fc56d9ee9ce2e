use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Store;

/// Shared, immutable per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(config: AppConfig, tokens: TokenService, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            tokens,
            store,
        }
    }
}
