use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::{ParseEnumError, decode_err};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Student,
    General,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::General => "GENERAL",
        }
    }

    pub fn can_sync(&self) -> bool {
        matches!(self, Self::Student)
    }
}

impl std::str::FromStr for AccountType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "GENERAL" => Ok(Self::General),
            other => Err(ParseEnumError {
                kind: "account type",
                value: other.to_string(),
            }),
        }
    }
}

/// Upstream sync settings kept on the user profile.
///
/// `enabled == false` implies `token == None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncState {
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl SyncState {
    pub fn enabled_with(token: String, at: DateTime<Utc>) -> Self {
        Self {
            enabled: true,
            token: Some(token),
            last_sync_at: Some(at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub account_type: AccountType,
    pub sync: SyncState,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let account_type: String = row.try_get("account_type")?;

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            account_type: account_type
                .parse()
                .map_err(|e| decode_err("account_type", e))?,
            sync: SyncState {
                enabled: row.try_get("sync_enabled")?,
                token: row.try_get("tecsup_token")?,
                last_sync_at: row.try_get("last_sync_at")?,
            },
            created_at: row.try_get("created_at")?,
        })
    }
}
