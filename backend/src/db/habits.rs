use chrono::{NaiveDate, Utc};
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::models::{Habit, HabitLog, NewHabitRequest};

pub async fn insert_habit<'e, E>(db: E, user_id: &str, req: &NewHabitRequest) -> Result<Habit, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO habits (id, user_id, name, kind, is_meal, daily_goal, active, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&req.name)
    .bind(&req.kind)
    .bind(req.is_meal)
    .bind(req.daily_goal)
    .bind(now)
    .execute(db)
    .await?;

    Ok(Habit {
        id,
        user_id: user_id.to_string(),
        name: req.name.clone(),
        kind: req.kind.clone(),
        is_meal: req.is_meal,
        daily_goal: req.daily_goal,
        active: true,
        created_at: now,
    })
}

const HABIT_COLUMNS: &str = "id, user_id, name, kind, is_meal, daily_goal, active, created_at";

pub async fn find_habit_by_id<'e, E>(db: E, id: &str) -> Result<Option<Habit>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Habit>(&format!("SELECT {} FROM habits WHERE id = ?", HABIT_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Every habit of the user, paused ones included, newest first.
pub async fn find_habits<'e, E>(db: E, user_id: &str) -> Result<Vec<Habit>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Habit>(&format!(
        "SELECT {} FROM habits WHERE user_id = ? ORDER BY created_at DESC",
        HABIT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn update_habit<'e, E>(db: E, habit: &Habit) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE habits
        SET name = ?1, kind = ?2, is_meal = ?3, daily_goal = ?4, active = ?5
        WHERE id = ?6
        "#,
    )
    .bind(&habit.name)
    .bind(&habit.kind)
    .bind(habit.is_meal)
    .bind(habit.daily_goal)
    .bind(habit.active)
    .bind(&habit.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

/// Logs go with the habit through `ON DELETE CASCADE`.
pub async fn delete_habit<'e, E>(db: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM habits WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn find_active_habits<'e, E>(db: E, user_id: &str) -> Result<Vec<Habit>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Habit>(&format!(
        "SELECT {} FROM habits WHERE user_id = ? AND active = 1 ORDER BY created_at DESC",
        HABIT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// One log per habit per day; logging again overwrites the day's values.
pub async fn upsert_habit_log<'e, E>(
    db: E,
    habit_id: &str,
    date: NaiveDate,
    completed: bool,
    value: Option<i64>,
) -> Result<HabitLog, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, HabitLog>(
        r#"
        INSERT INTO habit_logs (id, habit_id, date, completed, value, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(habit_id, date) DO UPDATE
            SET completed = excluded.completed,
                value = excluded.value
        RETURNING id, habit_id, date, completed, value, created_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(habit_id)
    .bind(date)
    .bind(completed)
    .bind(value)
    .bind(Utc::now())
    .fetch_one(db)
    .await
}

pub async fn find_logs_on<'e, E>(db: E, user_id: &str, date: NaiveDate) -> Result<Vec<HabitLog>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, HabitLog>(
        r#"
        SELECT l.id, l.habit_id, l.date, l.completed, l.value, l.created_at
        FROM habit_logs l
        JOIN habits h ON h.id = l.habit_id
        WHERE h.user_id = ? AND l.date = ?
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await
}

pub async fn find_logs_in_range<'e, E>(
    db: E,
    habit_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<HabitLog>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, HabitLog>(
        r#"
        SELECT id, habit_id, date, completed, value, created_at
        FROM habit_logs
        WHERE habit_id = ? AND date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(habit_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}

/// `(active habits, active habits logged as completed on date)`.
pub async fn count_habits_on<'e, E>(db: E, user_id: &str, date: NaiveDate) -> Result<(i64, i64), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN l.completed = 1 THEN 1 ELSE 0 END), 0)
        FROM habits h
        LEFT JOIN habit_logs l ON l.habit_id = h.id AND l.date = ?2
        WHERE h.user_id = ?1 AND h.active = 1
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(db)
    .await
}
