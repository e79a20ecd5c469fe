use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::db::{habits, repository};
use crate::error::AppError;
use crate::models::{DayDetails, HabitWithProgress, MonthView};
use crate::services::SummaryService;

pub struct CalendarService {
    db: SqlitePool,
    summaries: SummaryService,
}

impl CalendarService {
    pub fn new(db: SqlitePool, summaries: SummaryService) -> Self {
        Self { db, summaries }
    }

    pub async fn month_view(&self, user_id: &str, year: i32, month: u32) -> Result<MonthView, AppError> {
        self.summaries.monthly_view(user_id, year, month).await
    }

    pub async fn day_details(&self, user_id: &str, date: NaiveDate) -> Result<DayDetails, AppError> {
        let tasks = repository::find_tasks_in_range(&self.db, user_id, date, date).await?;
        let events = repository::find_events_in_range(&self.db, user_id, date, date).await?;
        let habits = habits_with_progress(&self.db, user_id, date).await?;
        let summary = self.summaries.get_or_compute(user_id, date).await?;

        Ok(DayDetails {
            date,
            tasks,
            events,
            habits,
            summary,
        })
    }
}

pub(crate) async fn habits_with_progress(
    db: &SqlitePool,
    user_id: &str,
    date: NaiveDate,
) -> Result<Vec<HabitWithProgress>, AppError> {
    let active = habits::find_active_habits(db, user_id).await?;
    let logs: HashMap<String, _> = habits::find_logs_on(db, user_id, date)
        .await?
        .into_iter()
        .map(|log| (log.habit_id.clone(), log))
        .collect();

    Ok(active
        .into_iter()
        .map(|habit| {
            let log = logs.get(&habit.id);
            HabitWithProgress::new(habit, log)
        })
        .collect())
}
