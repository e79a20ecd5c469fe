use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::{ParseEnumError, RecordSource, decode_err};

const EXAM_KEYWORDS: [&str; 4] = ["exam", "evaluación", "evaluacion", "evaluation"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventCategory {
    Class,
    Exam,
    Personal,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "CLASS",
            Self::Exam => "EXAM",
            Self::Personal => "PERSONAL",
        }
    }

    /// Category for an upstream calendar entry, judged by its title.
    pub fn classify(title: &str) -> Self {
        let lower = title.to_lowercase();
        if EXAM_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Exam
        } else {
            Self::Class
        }
    }
}

impl std::str::FromStr for EventCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLASS" => Ok(Self::Class),
            "EXAM" => Ok(Self::Exam),
            "PERSONAL" => Ok(Self::Personal),
            other => Err(ParseEnumError {
                kind: "event category",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub category: EventCategory,
    pub description: Option<String>,
    pub course_name: Option<String>,
    #[serde(flatten)]
    pub source: RecordSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_imported(&self) -> bool {
        self.source.is_imported()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Event {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let category: String = row.try_get("category")?;
        let source: String = row.try_get("source")?;
        let external_id: Option<String> = row.try_get("tecsup_external_id")?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            date: row.try_get("date")?,
            time: row.try_get("time")?,
            category: category.parse().map_err(|e| decode_err("category", e))?,
            description: row.try_get("description")?,
            course_name: row.try_get("course_name")?,
            source: RecordSource::from_columns(&source, external_id)
                .map_err(|e| decode_err("source", e))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub category: EventCategory,
    pub description: Option<String>,
    pub course_name: Option<String>,
    pub source: RecordSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEventRequest {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub category: Option<EventCategory>,
    pub description: Option<String>,
    pub course_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub category: Option<EventCategory>,
    pub description: Option<String>,
    pub course_name: Option<String>,
}

impl UpdateEventRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.course_name.is_none()
    }
}
