use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{Event, HabitWithProgress, Task};

/// Per-user, per-day completion rollup.
///
/// `id` and `created_at` are only set for persisted snapshots; a summary
/// computed on the fly leaves them empty.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DailySummary {
    pub id: Option<String>,
    pub user_id: String,
    pub date: NaiveDate,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub total_habits: i64,
    pub completed_habits: i64,
    pub progress_percentage: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl DailySummary {
    pub fn computed(
        user_id: &str,
        date: NaiveDate,
        (total_tasks, completed_tasks): (i64, i64),
        (total_habits, completed_habits): (i64, i64),
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            date,
            total_tasks,
            completed_tasks,
            total_habits,
            completed_habits,
            progress_percentage: progress_percentage(
                completed_tasks + completed_habits,
                total_tasks + total_habits,
            ),
            created_at: None,
        }
    }

    pub fn total(&self) -> i64 {
        self.total_tasks + self.total_habits
    }

    pub fn completed(&self) -> i64 {
        self.completed_tasks + self.completed_habits
    }

    pub fn is_snapshot(&self) -> bool {
        self.id.is_some()
    }
}

/// `round(100 * completed / total)` with halves rounded up; 0 when there is nothing to do.
pub fn progress_percentage(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed * 200 + total) / (2 * total)
}

#[derive(Debug, Clone, Serialize)]
pub struct DayInfo {
    pub date: NaiveDate,
    pub has_activity: bool,
    pub task_count: i64,
    pub event_count: i64,
    pub progress: Option<i64>,
    pub is_today: bool,
    pub is_past: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub days: BTreeMap<NaiveDate, DayInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayDetails {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
    pub events: Vec<Event>,
    pub habits: Vec<HabitWithProgress>,
    pub summary: DailySummary,
}
