use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::models::{AccountType, SyncState, User};

const USER_COLUMNS: &str =
    "id, email, name, account_type, sync_enabled, tecsup_token, last_sync_at, created_at";

pub async fn find_user_by_id<'e, E>(db: E, id: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_user<'e, E>(
    db: E,
    email: &str,
    name: &str,
    account_type: AccountType,
) -> Result<User, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, account_type, sync_enabled, created_at)
        VALUES (?1, ?2, ?3, ?4, 0, ?5)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(name)
    .bind(account_type.as_str())
    .bind(now)
    .execute(db)
    .await?;

    Ok(User {
        id,
        email: email.to_string(),
        name: name.to_string(),
        account_type,
        sync: SyncState::default(),
        created_at: now,
    })
}

pub async fn list_user_ids<'e, E>(db: E) -> Result<Vec<String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>("SELECT id FROM users ORDER BY created_at")
        .fetch_all(db)
        .await
}

pub async fn save_sync_state<'e, E>(db: E, user_id: &str, state: &SyncState) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE users
        SET sync_enabled = ?1,
            tecsup_token = ?2,
            last_sync_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(state.enabled)
    .bind(&state.token)
    .bind(state.last_sync_at)
    .bind(user_id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn touch_last_sync<'e, E>(db: E, user_id: &str, at: DateTime<Utc>) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE users SET last_sync_at = ? WHERE id = ?")
        .bind(at)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
