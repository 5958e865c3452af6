use std::sync::Arc;

use crate::auth::TokenService;
use crate::cache::CacheClient;
use crate::config::AppConfig;
use crate::database::{MemoryStore, Store};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub cache: Option<CacheClient>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, cache: Option<CacheClient>, config: AppConfig) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenService::from_config(&config.security)),
            cache,
            config: Arc::new(config),
        }
    }

    /// State backed by an empty in-memory store.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), None, config)
    }
}
