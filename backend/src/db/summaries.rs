use chrono::{NaiveDate, Utc};
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::models::DailySummary;

const SUMMARY_COLUMNS: &str = "id, user_id, date, total_tasks, completed_tasks, total_habits, \
     completed_habits, progress_percentage, created_at";

pub async fn find_summary<'e, E>(db: E, user_id: &str, date: NaiveDate) -> Result<Option<DailySummary>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, DailySummary>(&format!(
        "SELECT {} FROM daily_summaries WHERE user_id = ? AND date = ?",
        SUMMARY_COLUMNS
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(db)
    .await
}

/// Persists `summary` unless a row for (user, date) exists. Returns whether it was written.
pub async fn insert_summary_if_absent<'e, E>(db: E, summary: &DailySummary) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO daily_summaries
            (id, user_id, date, total_tasks, completed_tasks, total_habits,
            completed_habits, progress_percentage, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(user_id, date) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&summary.user_id)
    .bind(summary.date)
    .bind(summary.total_tasks)
    .bind(summary.completed_tasks)
    .bind(summary.total_habits)
    .bind(summary.completed_habits)
    .bind(summary.progress_percentage)
    .bind(Utc::now())
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn find_summaries_in_range<'e, E>(
    db: E,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailySummary>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, DailySummary>(&format!(
        r#"
        SELECT {}
        FROM daily_summaries
        WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
        ORDER BY date DESC
        "#,
        SUMMARY_COLUMNS
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}

pub async fn find_recent_summaries<'e, E>(db: E, user_id: &str, limit: i64) -> Result<Vec<DailySummary>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, DailySummary>(&format!(
        "SELECT {} FROM daily_summaries WHERE user_id = ? ORDER BY date DESC LIMIT ?",
        SUMMARY_COLUMNS
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn delete_summaries_before<'e, E>(db: E, cutoff: NaiveDate) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(sqlx::query("DELETE FROM daily_summaries WHERE date < ?")
        .bind(cutoff)
        .execute(db)
        .await?
        .rows_affected())
}
