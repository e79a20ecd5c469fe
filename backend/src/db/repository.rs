use chrono::{NaiveDate, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::models::{
    Event, EventCategory, NewEvent, NewTask, Priority, SourceKind, Task,
};

const TASK_COLUMNS: &str = "id, user_id, title, description, priority, due_date, completed, \
     source, tecsup_external_id, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, user_id, title, date, time, category, description, course_name, \
     source, tecsup_external_id, created_at, updated_at";

const PRIORITY_ORDER: &str = "CASE priority WHEN 'HIGH' THEN 1 WHEN 'MEDIUM' THEN 2 ELSE 3 END";

// ---------------------------------------------------------------------------
// tasks
// ---------------------------------------------------------------------------

pub async fn find_task_by_id<'e, E>(db: E, id: &str) -> Result<Option<Task>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// All tasks of a user, optionally narrowed by completion state and priority.
pub async fn find_tasks<'e, E>(
    db: E,
    user_id: &str,
    completed: Option<bool>,
    priority: Option<Priority>,
) -> Result<Vec<Task>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {}
        FROM tasks
        WHERE user_id = ?1
          AND (?2 IS NULL OR completed = ?2)
          AND (?3 IS NULL OR priority = ?3)
        ORDER BY {}, created_at DESC
        "#,
        TASK_COLUMNS, PRIORITY_ORDER
    ))
    .bind(user_id)
    .bind(completed)
    .bind(priority.map(|p| p.as_str()))
    .fetch_all(db)
    .await
}

pub async fn find_tasks_by_source<'e, E>(db: E, user_id: &str, source: SourceKind) -> Result<Vec<Task>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE user_id = ? AND source = ? ORDER BY due_date, created_at",
        TASK_COLUMNS
    ))
    .bind(user_id)
    .bind(source.as_str())
    .fetch_all(db)
    .await
}

/// Tasks due between `start` and `end`, both inclusive.
pub async fn find_tasks_in_range<'e, E>(
    db: E,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Task>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {}
        FROM tasks
        WHERE user_id = ?1 AND due_date BETWEEN ?2 AND ?3
        ORDER BY due_date, {}
        "#,
        TASK_COLUMNS, PRIORITY_ORDER
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}

/// Incomplete tasks that are undated or due on/after `today`.
pub async fn find_pending_tasks<'e, E>(db: E, user_id: &str, today: NaiveDate) -> Result<Vec<Task>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {}
        FROM tasks
        WHERE user_id = ?1
          AND completed = 0
          AND (due_date IS NULL OR due_date >= ?2)
        ORDER BY {}, due_date IS NULL, due_date
        "#,
        TASK_COLUMNS, PRIORITY_ORDER
    ))
    .bind(user_id)
    .bind(today)
    .fetch_all(db)
    .await
}

/// `(total, completed)` for tasks due on `date`.
pub async fn count_tasks_due<'e, E>(db: E, user_id: &str, date: NaiveDate) -> Result<(i64, i64), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), COALESCE(SUM(completed), 0)
        FROM tasks
        WHERE user_id = ? AND due_date = ?
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(db)
    .await
}

pub async fn count_tasks_by_source<'e, E>(db: E, user_id: &str, source: SourceKind) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE user_id = ? AND source = ?")
        .bind(user_id)
        .bind(source.as_str())
        .fetch_one(db)
        .await
}

pub async fn insert_task<'e, E>(db: E, user_id: &str, new: &NewTask) -> Result<Task, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO tasks
            (id, user_id, title, description, priority, due_date, completed,
            source, tecsup_external_id, synced_tecsup, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?10, ?10)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.priority.as_str())
    .bind(new.due_date)
    .bind(new.source.kind().as_str())
    .bind(new.source.external_id())
    .bind(new.source.is_imported())
    .bind(now)
    .execute(db)
    .await?;

    Ok(Task {
        id,
        user_id: user_id.to_string(),
        title: new.title.clone(),
        description: new.description.clone(),
        priority: new.priority,
        due_date: new.due_date,
        completed: false,
        source: new.source.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn insert_tasks(conn: &mut SqliteConnection, user_id: &str, tasks: &[NewTask]) -> Result<Vec<Task>, sqlx::Error> {
    let mut saved = Vec::with_capacity(tasks.len());
    for task in tasks {
        saved.push(insert_task(&mut *conn, user_id, task).await?);
    }
    Ok(saved)
}

/// Writes back every locally editable column of `task`.
pub async fn update_task<'e, E>(db: E, task: &Task) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?1,
            description = ?2,
            priority = ?3,
            due_date = ?4,
            completed = ?5,
            updated_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority.as_str())
    .bind(task.due_date)
    .bind(task.completed)
    .bind(task.updated_at)
    .bind(&task.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn delete_task<'e, E>(db: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

/// Bulk delete used only by the sync replace step.
pub async fn delete_tasks_by_source<'e, E>(db: E, user_id: &str, source: SourceKind) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(sqlx::query("DELETE FROM tasks WHERE user_id = ? AND source = ?")
        .bind(user_id)
        .bind(source.as_str())
        .execute(db)
        .await?
        .rows_affected())
}

// ---------------------------------------------------------------------------
// events
// ---------------------------------------------------------------------------

pub async fn find_event_by_id<'e, E>(db: E, id: &str) -> Result<Option<Event>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_events<'e, E>(
    db: E,
    user_id: &str,
    date: Option<NaiveDate>,
    category: Option<EventCategory>,
) -> Result<Vec<Event>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Event>(&format!(
        r#"
        SELECT {}
        FROM events
        WHERE user_id = ?1
          AND (?2 IS NULL OR date = ?2)
          AND (?3 IS NULL OR category = ?3)
        ORDER BY date, time
        "#,
        EVENT_COLUMNS
    ))
    .bind(user_id)
    .bind(date)
    .bind(category.map(|c| c.as_str()))
    .fetch_all(db)
    .await
}

pub async fn find_events_by_source<'e, E>(db: E, user_id: &str, source: SourceKind) -> Result<Vec<Event>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events WHERE user_id = ? AND source = ? ORDER BY date, time",
        EVENT_COLUMNS
    ))
    .bind(user_id)
    .bind(source.as_str())
    .fetch_all(db)
    .await
}

pub async fn find_events_in_range<'e, E>(
    db: E,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Event>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Event>(&format!(
        r#"
        SELECT {}
        FROM events
        WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
        ORDER BY date, time
        "#,
        EVENT_COLUMNS
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}

pub async fn count_events_by_source<'e, E>(db: E, user_id: &str, source: SourceKind) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE user_id = ? AND source = ?")
        .bind(user_id)
        .bind(source.as_str())
        .fetch_one(db)
        .await
}

pub async fn insert_event<'e, E>(db: E, user_id: &str, new: &NewEvent) -> Result<Event, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO events
            (id, user_id, title, date, time, category, description, course_name,
            source, tecsup_external_id, synced_tecsup, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&new.title)
    .bind(new.date)
    .bind(new.time)
    .bind(new.category.as_str())
    .bind(&new.description)
    .bind(&new.course_name)
    .bind(new.source.kind().as_str())
    .bind(new.source.external_id())
    .bind(new.source.is_imported())
    .bind(now)
    .execute(db)
    .await?;

    Ok(Event {
        id,
        user_id: user_id.to_string(),
        title: new.title.clone(),
        date: new.date,
        time: new.time,
        category: new.category,
        description: new.description.clone(),
        course_name: new.course_name.clone(),
        source: new.source.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn insert_events(conn: &mut SqliteConnection, user_id: &str, events: &[NewEvent]) -> Result<Vec<Event>, sqlx::Error> {
    let mut saved = Vec::with_capacity(events.len());
    for event in events {
        saved.push(insert_event(&mut *conn, user_id, event).await?);
    }
    Ok(saved)
}

pub async fn update_event<'e, E>(db: E, event: &Event) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE events
        SET title = ?1,
            date = ?2,
            time = ?3,
            category = ?4,
            description = ?5,
            course_name = ?6,
            updated_at = ?7
        WHERE id = ?8
        "#,
    )
    .bind(&event.title)
    .bind(event.date)
    .bind(event.time)
    .bind(event.category.as_str())
    .bind(&event.description)
    .bind(&event.course_name)
    .bind(event.updated_at)
    .bind(&event.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn delete_event<'e, E>(db: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn delete_events_by_source<'e, E>(db: E, user_id: &str, source: SourceKind) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(sqlx::query("DELETE FROM events WHERE user_id = ? AND source = ?")
        .bind(user_id)
        .bind(source.as_str())
        .execute(db)
        .await?
        .rows_affected())
}
