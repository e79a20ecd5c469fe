use chrono::{NaiveDate, NaiveTime};

use crate::models::{EventCategory, NewEvent, NewTask, Priority, RecordSource};

use super::dto;

/// Date part of an upstream timestamp (`YYYY-MM-DD...`).
pub fn date_prefix(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// `HH:MM` slice of an upstream timestamp, midnight when absent or malformed.
pub fn time_slice(raw: &str) -> NaiveTime {
    raw.get(11..16)
        .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
        .unwrap_or(NaiveTime::MIN)
}

/// Assignments without a usable due date have no place in the task list.
pub fn assignment_to_task(assignment: &dto::Assignment) -> Option<NewTask> {
    let due_date = assignment.due_at.as_deref().and_then(date_prefix)?;

    Some(NewTask {
        title: assignment
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Assignment {}", assignment.id)),
        description: assignment.description.clone(),
        priority: Priority::Medium,
        due_date: Some(due_date),
        source: RecordSource::tecsup(assignment.id.clone()),
    })
}

pub fn calendar_event_to_event(event: &dto::CalendarEvent, course: &dto::Course) -> Option<NewEvent> {
    let start_at = event.start_at.as_deref()?;
    let date = date_prefix(start_at)?;
    let title = event
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| course.display_name());

    Some(NewEvent {
        category: EventCategory::classify(&title),
        title,
        date,
        time: Some(time_slice(start_at)),
        description: event.description.clone(),
        course_name: course.name.clone(),
        source: RecordSource::tecsup(event.id.clone()),
    })
}
