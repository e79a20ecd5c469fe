use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    Event, EventCategory, NewEvent, NewEventRequest, NewTask, NewTaskRequest, Priority,
    RecordSource, Task, UpdateEventRequest, UpdateTaskRequest,
};

/// Owner-scoped task and event mutations.
///
/// Imported (TECSUP) tasks only accept completion and priority changes;
/// imported events accept nothing. Both refuse deletion.
pub struct RecordService {
    db: SqlitePool,
}

impl RecordService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list_tasks(
        &self,
        user_id: &str,
        completed: Option<bool>,
        priority: Option<Priority>,
    ) -> Result<Vec<Task>, AppError> {
        Ok(repository::find_tasks(&self.db, user_id, completed, priority).await?)
    }

    pub async fn get_task(&self, user_id: &str, id: &str) -> Result<Task, AppError> {
        self.owned_task(user_id, id).await
    }

    pub async fn create_task(&self, user_id: &str, req: NewTaskRequest) -> Result<Task, AppError> {
        let title = required_title(&req.title)?;
        let new = NewTask {
            title,
            description: req.description,
            priority: req.priority.unwrap_or(Priority::Medium),
            due_date: req.due_date,
            source: RecordSource::User,
        };
        Ok(repository::insert_task(&self.db, user_id, &new).await?)
    }

    pub async fn update_task(&self, user_id: &str, id: &str, req: UpdateTaskRequest) -> Result<Task, AppError> {
        let mut task = self.owned_task(user_id, id).await?;

        if task.is_imported() && req.touches_upstream_fields() {
            return Err(AppError::ProtectedRecord(
                "title, description and due date of TECSUP tasks are managed by TECSUP".to_string(),
            ));
        }

        if let Some(title) = req.title.filter(|t| !t.trim().is_empty()) {
            task.title = title.trim().to_string();
        }
        if let Some(description) = req.description {
            task.description = Some(description.trim().to_string());
        }
        if let Some(due_date) = req.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(priority) = req.priority {
            task.priority = priority;
        }
        if let Some(completed) = req.completed {
            task.completed = completed;
        }
        task.updated_at = Utc::now();

        repository::update_task(&self.db, &task).await?;
        Ok(task)
    }

    /// Completion is local state, so this works for imported tasks too.
    pub async fn toggle_task(&self, user_id: &str, id: &str) -> Result<Task, AppError> {
        let mut task = self.owned_task(user_id, id).await?;
        task.completed = !task.completed;
        task.updated_at = Utc::now();
        repository::update_task(&self.db, &task).await?;
        Ok(task)
    }

    pub async fn delete_task(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let task = self.owned_task(user_id, id).await?;
        if task.is_imported() {
            return Err(AppError::ProtectedRecord(
                "TECSUP tasks are removed by disabling sync".to_string(),
            ));
        }
        repository::delete_task(&self.db, &task.id).await?;
        info!("task {} deleted by {}", task.id, user_id);
        Ok(())
    }

    pub async fn list_events(
        &self,
        user_id: &str,
        date: Option<NaiveDate>,
        category: Option<EventCategory>,
    ) -> Result<Vec<Event>, AppError> {
        Ok(repository::find_events(&self.db, user_id, date, category).await?)
    }

    pub async fn get_event(&self, user_id: &str, id: &str) -> Result<Event, AppError> {
        self.owned_event(user_id, id).await
    }

    pub async fn create_event(&self, user_id: &str, req: NewEventRequest) -> Result<Event, AppError> {
        let title = required_title(&req.title)?;
        let new = NewEvent {
            title,
            date: req.date,
            time: req.time,
            category: req.category.unwrap_or(EventCategory::Personal),
            description: req.description,
            course_name: req.course_name,
            source: RecordSource::User,
        };
        Ok(repository::insert_event(&self.db, user_id, &new).await?)
    }

    pub async fn update_event(&self, user_id: &str, id: &str, req: UpdateEventRequest) -> Result<Event, AppError> {
        let mut event = self.owned_event(user_id, id).await?;

        if event.is_imported() {
            return Err(AppError::ProtectedRecord(
                "TECSUP events cannot be edited".to_string(),
            ));
        }
        if req.is_empty() {
            return Ok(event);
        }

        if let Some(title) = req.title.filter(|t| !t.trim().is_empty()) {
            event.title = title.trim().to_string();
        }
        if let Some(date) = req.date {
            event.date = date;
        }
        if let Some(time) = req.time {
            event.time = Some(time);
        }
        if let Some(category) = req.category {
            event.category = category;
        }
        if let Some(description) = req.description {
            event.description = Some(description.trim().to_string());
        }
        if let Some(course_name) = req.course_name {
            event.course_name = Some(course_name);
        }
        event.updated_at = Utc::now();

        repository::update_event(&self.db, &event).await?;
        Ok(event)
    }

    pub async fn delete_event(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let event = self.owned_event(user_id, id).await?;
        if event.is_imported() {
            return Err(AppError::ProtectedRecord(
                "TECSUP events are removed by disabling sync".to_string(),
            ));
        }
        repository::delete_event(&self.db, &event.id).await?;
        info!("event {} deleted by {}", event.id, user_id);
        Ok(())
    }

    async fn owned_task(&self, user_id: &str, id: &str) -> Result<Task, AppError> {
        let task = repository::find_task_by_id(&self.db, id)
            .await?
            .ok_or(AppError::NotFound)?;
        if task.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(task)
    }

    async fn owned_event(&self, user_id: &str, id: &str) -> Result<Event, AppError> {
        let event = repository::find_event_by_id(&self.db, id)
            .await?
            .ok_or(AppError::NotFound)?;
        if event.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(event)
    }
}

fn required_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title must not be blank".to_string()));
    }
    Ok(title.to_string())
}
