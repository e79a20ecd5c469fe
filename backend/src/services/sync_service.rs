use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use crate::db::{repository, users};
use crate::error::AppError;
use crate::feed::{self, CourseFetchError, FeedClient};
use crate::models::{SourceKind, SyncState, User};
use crate::state::AppState;

const DEFAULT_CONCURRENCY: usize = 4;

/// One async mutex per user so enable/disable/refresh for the same user
/// never interleave their delete and insert steps.
#[derive(Default)]
pub struct SyncLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SyncLocks {
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            locks.entry(user_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Debug, Serialize)]
pub struct SyncResult {
    pub tasks_imported: usize,
    pub events_imported: usize,
    pub tasks_removed: u64,
    pub events_removed: u64,
    pub partial: bool,
    pub course_errors: Vec<CourseFetchError>,
    pub last_sync_at: DateTime<Utc>,
}

pub struct SyncService {
    db: SqlitePool,
    feed: Arc<dyn FeedClient>,
    locks: Arc<SyncLocks>,
    concurrency: usize,
}

impl SyncService {
    pub fn new(db: SqlitePool, feed: Arc<dyn FeedClient>, locks: Arc<SyncLocks>) -> Self {
        Self {
            db,
            feed,
            locks,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.db.clone(), state.feed.clone(), state.sync_locks.clone())
            .with_concurrency(state.config.fetch_concurrency)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Validates and stores the token, then imports the upstream records.
    ///
    /// The enabled flag stays set even when the import afterwards fails;
    /// the caller gets the import error and can retry with `refresh`.
    pub async fn enable(&self, user_id: &str, token: &str) -> Result<SyncResult, AppError> {
        let _guard = self.locks.acquire(user_id).await;
        let user = self.load_user(user_id).await?;

        if !user.account_type.can_sync() {
            return Err(AppError::IneligibleAccount);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::InvalidToken);
        }

        if !self.feed.validate_token(token).await {
            warn!("rejected TECSUP token for user {}", user.id);
            return Err(AppError::InvalidToken);
        }

        users::save_sync_state(
            &self.db,
            &user.id,
            &SyncState::enabled_with(token.to_string(), Utc::now()),
        )
        .await?;
        info!("TECSUP sync enabled for user {}", user.id);

        self.import_locked(&user.id, token).await
    }

    /// Removes every imported record and forgets the token. Idempotent.
    pub async fn disable(&self, user_id: &str) -> Result<(), AppError> {
        let _guard = self.locks.acquire(user_id).await;
        let user = self.load_user(user_id).await?;

        let mut tx = self.db.begin().await?;
        let tasks_removed =
            repository::delete_tasks_by_source(&mut *tx, &user.id, SourceKind::Tecsup).await?;
        let events_removed =
            repository::delete_events_by_source(&mut *tx, &user.id, SourceKind::Tecsup).await?;
        users::save_sync_state(&mut *tx, &user.id, &SyncState::default()).await?;
        tx.commit().await?;

        info!(
            "TECSUP sync disabled for user {} - removed {} tasks, {} events",
            user.id, tasks_removed, events_removed
        );
        Ok(())
    }

    /// Replaces the imported records with the current upstream state using the stored token.
    pub async fn refresh(&self, user_id: &str) -> Result<SyncResult, AppError> {
        let _guard = self.locks.acquire(user_id).await;
        let user = self.load_user(user_id).await?;

        let token = match (&user.sync.enabled, &user.sync.token) {
            (true, Some(token)) => token.clone(),
            _ => return Err(AppError::NoStoredToken),
        };

        self.import_locked(&user.id, &token).await
    }

    /// Caller must hold the user's sync lock.
    ///
    /// Fetch first, then swap. The old imported set is only deleted once the
    /// new one is in hand, and the delete plus insert run in one transaction.
    async fn import_locked(&self, user_id: &str, token: &str) -> Result<SyncResult, AppError> {
        info!("Starting TECSUP import for user {}", user_id);
        let snapshot = feed::fetch_all(self.feed.clone(), token, self.concurrency).await?;

        if snapshot.all_courses_failed() {
            warn!(
                "all {} TECSUP courses failed for user {}, keeping previous records",
                snapshot.courses_total, user_id
            );
            return Err(AppError::UpstreamUnavailable(format!(
                "all {} courses failed to load",
                snapshot.courses_total
            )));
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let tasks_removed =
            repository::delete_tasks_by_source(&mut *tx, user_id, SourceKind::Tecsup).await?;
        let events_removed =
            repository::delete_events_by_source(&mut *tx, user_id, SourceKind::Tecsup).await?;
        let tasks = repository::insert_tasks(&mut *tx, user_id, &snapshot.tasks).await?;
        let events = repository::insert_events(&mut *tx, user_id, &snapshot.events).await?;
        users::touch_last_sync(&mut *tx, user_id, now).await?;

        tx.commit().await?;

        if !snapshot.errors.is_empty() {
            warn!(
                "TECSUP import for user {} finished with {} course errors",
                user_id,
                snapshot.errors.len()
            );
        }

        let result = SyncResult {
            tasks_imported: tasks.len(),
            events_imported: events.len(),
            tasks_removed,
            events_removed,
            partial: !snapshot.errors.is_empty(),
            course_errors: snapshot.errors,
            last_sync_at: now,
        };

        info!(
            "TECSUP import for user {} completed - {} tasks, {} events (replaced {} / {})",
            user_id,
            result.tasks_imported,
            result.events_imported,
            result.tasks_removed,
            result.events_removed
        );
        Ok(result)
    }

    async fn load_user(&self, user_id: &str) -> Result<User, AppError> {
        users::find_user_by_id(&self.db, user_id)
            .await?
            .ok_or(AppError::NotFound)
    }
}
