use chrono::{Days, Local, NaiveDate};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::habits;
use crate::error::AppError;
use crate::models::{
    Habit, HabitHistory, HabitLog, LogHabitRequest, NewHabitRequest, UpdateHabitRequest,
};

const MAX_HISTORY_DAYS: u32 = 366;

/// Owner-scoped habit management and daily logging.
pub struct HabitService {
    db: SqlitePool,
    today: Option<NaiveDate>,
}

impl HabitService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db, today: None }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub async fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>, AppError> {
        Ok(habits::find_habits(&self.db, user_id).await?)
    }

    pub async fn get_habit(&self, user_id: &str, id: &str) -> Result<Habit, AppError> {
        self.owned_habit(user_id, id).await
    }

    pub async fn create_habit(&self, user_id: &str, mut req: NewHabitRequest) -> Result<Habit, AppError> {
        req.name = required_name(&req.name)?;
        check_goal(req.daily_goal)?;
        let habit = habits::insert_habit(&self.db, user_id, &req).await?;
        info!("habit {} created by {}", habit.id, user_id);
        Ok(habit)
    }

    /// Setting `active: false` pauses the habit; it then drops out of daily summaries.
    pub async fn update_habit(&self, user_id: &str, id: &str, req: UpdateHabitRequest) -> Result<Habit, AppError> {
        let mut habit = self.owned_habit(user_id, id).await?;

        if let Some(name) = req.name.filter(|n| !n.trim().is_empty()) {
            habit.name = name.trim().to_string();
        }
        if let Some(kind) = req.kind {
            habit.kind = kind;
        }
        if let Some(is_meal) = req.is_meal {
            habit.is_meal = is_meal;
        }
        if req.daily_goal.is_some() {
            check_goal(req.daily_goal)?;
            habit.daily_goal = req.daily_goal;
        }
        if let Some(active) = req.active {
            habit.active = active;
        }

        habits::update_habit(&self.db, &habit).await?;
        Ok(habit)
    }

    pub async fn delete_habit(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let habit = self.owned_habit(user_id, id).await?;
        habits::delete_habit(&self.db, &habit.id).await?;
        info!("habit {} deleted by {}", habit.id, user_id);
        Ok(())
    }

    /// Records the day's state; logging the same day again overwrites it.
    pub async fn log_habit(&self, user_id: &str, req: LogHabitRequest) -> Result<HabitLog, AppError> {
        let habit = self.owned_habit(user_id, &req.habit_id).await?;
        if req.value.is_some_and(|v| v < 0) {
            return Err(AppError::BadRequest("value must not be negative".to_string()));
        }
        Ok(habits::upsert_habit_log(&self.db, &habit.id, req.date, req.completed, req.value).await?)
    }

    /// Logs from `days - 1` days ago through today.
    pub async fn habit_history(&self, user_id: &str, id: &str, days: u32) -> Result<HabitHistory, AppError> {
        if days == 0 || days > MAX_HISTORY_DAYS {
            return Err(AppError::BadRequest(format!(
                "days must be between 1 and {}",
                MAX_HISTORY_DAYS
            )));
        }
        let habit = self.owned_habit(user_id, id).await?;

        let end = self.today();
        let start = end
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or(AppError::InternalServerError)?;
        let logs = habits::find_logs_in_range(&self.db, &habit.id, start, end).await?;

        Ok(HabitHistory { habit, days, logs })
    }

    async fn owned_habit(&self, user_id: &str, id: &str) -> Result<Habit, AppError> {
        let habit = habits::find_habit_by_id(&self.db, id)
            .await?
            .ok_or(AppError::NotFound)?;
        if habit.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(habit)
    }
}

fn required_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be blank".to_string()));
    }
    Ok(name.to_string())
}

fn check_goal(goal: Option<i64>) -> Result<(), AppError> {
    match goal {
        Some(g) if g < 0 => Err(AppError::BadRequest("daily_goal must not be negative".to_string())),
        _ => Ok(()),
    }
}
