use std::collections::{BTreeMap, HashMap};

use chrono::{Days, Local, Months, NaiveDate};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db::{habits, repository, summaries, users};
use crate::error::AppError;
use crate::models::{DailySummary, DayInfo, MonthView};

/// Daily progress rollups.
///
/// Today is always computed live. A past day returns its snapshot when one
/// exists; snapshots are written once and never touched again.
#[derive(Clone)]
pub struct SummaryService {
    db: SqlitePool,
    today: Option<NaiveDate>,
}

impl SummaryService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db, today: None }
    }

    /// Pins "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn ensure_past(&self, date: NaiveDate) -> Result<(), AppError> {
        let today = self.today();
        if date >= today {
            return Err(AppError::BadRequest(format!(
                "cannot snapshot {}: only days before {} can be stored",
                date, today
            )));
        }
        Ok(())
    }

    /// Counts the day from live data without persisting anything.
    pub async fn compute(&self, user_id: &str, date: NaiveDate) -> Result<DailySummary, AppError> {
        let tasks = repository::count_tasks_due(&self.db, user_id, date).await?;
        let habits = habits::count_habits_on(&self.db, user_id, date).await?;
        Ok(DailySummary::computed(user_id, date, tasks, habits))
    }

    pub async fn get_or_compute(&self, user_id: &str, date: NaiveDate) -> Result<DailySummary, AppError> {
        if date < self.today() {
            if let Some(existing) = summaries::find_summary(&self.db, user_id, date).await? {
                debug!("using stored summary for {} on {}", user_id, date);
                return Ok(existing);
            }
        }

        debug!("computing live summary for {} on {}", user_id, date);
        self.compute(user_id, date).await
    }

    /// Write-once: a second snapshot for the same day returns the stored row.
    /// Only finished days can be frozen; today and later are refused.
    pub async fn snapshot(&self, user_id: &str, date: NaiveDate) -> Result<DailySummary, AppError> {
        self.ensure_past(date)?;
        if let Some(existing) = summaries::find_summary(&self.db, user_id, date).await? {
            warn!("summary for {} on {} already exists", user_id, date);
            return Ok(existing);
        }

        let computed = self.compute(user_id, date).await?;
        if !summaries::insert_summary_if_absent(&self.db, &computed).await? {
            warn!("summary for {} on {} was written concurrently", user_id, date);
        }

        let stored = summaries::find_summary(&self.db, user_id, date)
            .await?
            .ok_or(AppError::InternalServerError)?;
        info!(
            "summary stored for {} on {} - progress {}%",
            user_id, date, stored.progress_percentage
        );
        Ok(stored)
    }

    /// Snapshots `date` for every user. Returns how many rows were newly written.
    pub async fn snapshot_all_users(&self, date: NaiveDate) -> Result<usize, AppError> {
        self.ensure_past(date)?;
        let mut written = 0;
        for user_id in users::list_user_ids(&self.db).await? {
            let computed = self.compute(&user_id, date).await?;
            if summaries::insert_summary_if_absent(&self.db, &computed).await? {
                written += 1;
            }
        }
        Ok(written)
    }

    pub async fn monthly_view(&self, user_id: &str, year: i32, month: u32) -> Result<MonthView, AppError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::BadRequest(format!("invalid month {}-{}", year, month)))?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.checked_sub_days(Days::new(1)))
            .ok_or_else(|| AppError::BadRequest(format!("invalid month {}-{}", year, month)))?;
        let today = self.today();

        info!("building month view {}-{:02} for {}", year, month, user_id);

        let tasks = repository::find_tasks_in_range(&self.db, user_id, start, end).await?;
        let events = repository::find_events_in_range(&self.db, user_id, start, end).await?;
        let stored: HashMap<NaiveDate, i64> =
            summaries::find_summaries_in_range(&self.db, user_id, start, end)
                .await?
                .into_iter()
                .map(|s| (s.date, s.progress_percentage))
                .collect();

        let mut task_counts: HashMap<NaiveDate, i64> = HashMap::new();
        for date in tasks.iter().filter_map(|t| t.due_date) {
            *task_counts.entry(date).or_default() += 1;
        }
        let mut event_counts: HashMap<NaiveDate, i64> = HashMap::new();
        for event in &events {
            *event_counts.entry(event.date).or_default() += 1;
        }

        let mut days = BTreeMap::new();
        for date in start.iter_days().take_while(|d| *d <= end) {
            let task_count = task_counts.get(&date).copied().unwrap_or(0);
            let event_count = event_counts.get(&date).copied().unwrap_or(0);
            let has_activity = task_count > 0 || event_count > 0;

            let progress = if date < today {
                match stored.get(&date) {
                    Some(progress) => Some(*progress),
                    None if has_activity => {
                        Some(self.compute(user_id, date).await?.progress_percentage)
                    }
                    None => None,
                }
            } else if date == today {
                Some(self.compute(user_id, date).await?.progress_percentage)
            } else {
                None
            };

            days.insert(
                date,
                DayInfo {
                    date,
                    has_activity,
                    task_count,
                    event_count,
                    progress,
                    is_today: date == today,
                    is_past: date < today,
                },
            );
        }

        Ok(MonthView { year, month, days })
    }

    pub async fn recent_summaries(&self, user_id: &str, limit: i64) -> Result<Vec<DailySummary>, AppError> {
        Ok(summaries::find_recent_summaries(&self.db, user_id, limit.max(0)).await?)
    }

    /// Drops snapshots older than `days_to_keep` days.
    pub async fn clean_old_summaries(&self, days_to_keep: u64) -> Result<u64, AppError> {
        let cutoff = self
            .today()
            .checked_sub_days(Days::new(days_to_keep))
            .ok_or_else(|| AppError::BadRequest(format!("invalid retention {}", days_to_keep)))?;
        let removed = summaries::delete_summaries_before(&self.db, cutoff).await?;
        info!("removed {} summaries older than {}", removed, cutoff);
        Ok(removed)
    }
}
