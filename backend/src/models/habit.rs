use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub kind: String,
    pub is_meal: bool,
    pub daily_goal: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HabitLog {
    pub id: String,
    pub habit_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    pub value: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabitRequest {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub is_meal: bool,
    pub daily_goal: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub is_meal: Option<bool>,
    pub daily_goal: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogHabitRequest {
    pub habit_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    pub value: Option<i64>,
}

/// A habit with its logs over the last `days` days, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct HabitHistory {
    pub habit: Habit,
    pub days: u32,
    pub logs: Vec<HabitLog>,
}

/// A habit paired with the log (if any) for one particular day.
#[derive(Debug, Clone, Serialize)]
pub struct HabitWithProgress {
    #[serde(flatten)]
    pub habit: Habit,
    pub completed: bool,
    pub current_value: i64,
    pub progress: i64,
}

impl HabitWithProgress {
    pub fn new(habit: Habit, log: Option<&HabitLog>) -> Self {
        let progress = habit_progress(&habit, log);
        Self {
            completed: log.is_some_and(|l| l.completed),
            current_value: log.and_then(|l| l.value).unwrap_or(0),
            progress,
            habit,
        }
    }
}

/// Percentage of the daily goal reached, capped at 100.
pub fn habit_progress(habit: &Habit, log: Option<&HabitLog>) -> i64 {
    let Some(log) = log else { return 0 };
    let Some(value) = log.value else { return 0 };

    if habit.is_meal {
        return if log.completed { 100 } else { 0 };
    }

    match habit.daily_goal {
        Some(goal) if goal > 0 => ((value * 200 + goal) / (2 * goal)).min(100),
        _ => 0,
    }
}
