use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{DailySummary, Event, HabitWithProgress, Task};
use crate::services::SummaryService;
use crate::services::calendar::habits_with_progress;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub pending_tasks: Vec<Task>,
    pub events_today: Vec<Event>,
    pub habits_today: Vec<HabitWithProgress>,
    pub summary_today: DailySummary,
}

pub struct DashboardService {
    db: SqlitePool,
    summaries: SummaryService,
}

impl DashboardService {
    pub fn new(db: SqlitePool, summaries: SummaryService) -> Self {
        Self { db, summaries }
    }

    pub async fn dashboard(&self, user_id: &str) -> Result<Dashboard, AppError> {
        let today = self.summaries.today();

        Ok(Dashboard {
            pending_tasks: repository::find_pending_tasks(&self.db, user_id, today).await?,
            events_today: repository::find_events_in_range(&self.db, user_id, today, today).await?,
            habits_today: habits_with_progress(&self.db, user_id, today).await?,
            summary_today: self.summaries.compute(user_id, today).await?,
        })
    }
}
