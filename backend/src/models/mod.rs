pub mod event;
pub mod habit;
pub mod source;
pub mod summary;
pub mod task;
pub mod user;

pub use event::{Event, EventCategory, NewEvent, NewEventRequest, UpdateEventRequest};
pub use habit::{
    Habit, HabitHistory, HabitLog, HabitWithProgress, LogHabitRequest, NewHabitRequest,
    UpdateHabitRequest,
};
pub use source::{RecordSource, SourceKind};
pub use summary::{DailySummary, DayDetails, DayInfo, MonthView};
pub use task::{NewTask, NewTaskRequest, Priority, Task, UpdateTaskRequest};
pub use user::{AccountType, SyncState, User};

use sqlx::error::BoxDynError;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

pub(crate) fn decode_err(column: &str, err: impl Into<BoxDynError>) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: err.into(),
    }
}
