use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::feed::FeedClient;
use crate::services::SyncLocks;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub feed: Arc<dyn FeedClient>,
    pub sync_locks: Arc<SyncLocks>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: SqlitePool, feed: Arc<dyn FeedClient>, config: AppConfig) -> Self {
        Self {
            db,
            feed,
            sync_locks: Arc::new(SyncLocks::default()),
            config: Arc::new(config),
        }
    }
}
