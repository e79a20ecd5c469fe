mod extract;

pub use extract::{CurrentUser, USER_HEADER};

use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::*;
use crate::services::{
    CalendarService, Dashboard, DashboardService, HabitService, RecordService, SummaryService,
    SyncResult, SyncService,
};
use crate::state::AppState;

const DEFAULT_RECENT_DAYS: i64 = 7;
const DEFAULT_HISTORY_DAYS: u32 = 7;

#[derive(Deserialize)]
struct EnableSyncRequest {
    token: String,
}

#[derive(Deserialize)]
struct TaskQueryParams {
    completed: Option<bool>,
    priority: Option<Priority>,
}

#[derive(Deserialize)]
struct EventQueryParams {
    date: Option<NaiveDate>,
    category: Option<EventCategory>,
}

#[derive(Deserialize)]
struct RecentQueryParams {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct HistoryQueryParams {
    days: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sync/tecsup", post(enable_sync).delete(disable_sync))
        .route("/sync/tecsup/refresh", post(refresh_sync))
        .route("/summary/recent", get(recent_summaries))
        .route("/summary/{date}", get(get_summary))
        .route("/summary/{date}/snapshot", post(snapshot_summary))
        .route("/calendar/day/{date}", get(day_details))
        .route("/calendar/{year}/{month}", get(month_view))
        .route("/dashboard", get(dashboard))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", get(get_task).patch(update_task).delete(delete_task))
        .route("/tasks/{id}/toggle", patch(toggle_task))
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event).patch(update_event).delete(delete_event))
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/log", post(log_habit))
        .route("/habits/{id}", get(get_habit).patch(update_habit).delete(delete_habit))
        .route("/habits/{id}/progress", get(habit_history))
        .with_state(state)
}

fn summaries(state: &AppState) -> SummaryService {
    SummaryService::new(state.db.clone())
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn enable_sync(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<EnableSyncRequest>,
) -> Result<Json<SyncResult>, AppError> {
    let result = SyncService::from_state(&state).enable(&user.id, &req.token).await?;
    Ok(Json(result))
}

async fn disable_sync(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, AppError> {
    SyncService::from_state(&state).disable(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_sync(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SyncResult>, AppError> {
    let result = SyncService::from_state(&state).refresh(&user.id).await?;
    Ok(Json(result))
}

async fn get_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DailySummary>, AppError> {
    Ok(Json(summaries(&state).get_or_compute(&user.id, date).await?))
}

async fn snapshot_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DailySummary>, AppError> {
    Ok(Json(summaries(&state).snapshot(&user.id, date).await?))
}

async fn recent_summaries(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<RecentQueryParams>,
) -> Result<Json<Vec<DailySummary>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_DAYS);
    Ok(Json(summaries(&state).recent_summaries(&user.id, limit).await?))
}

async fn month_view(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthView>, AppError> {
    let calendar = CalendarService::new(state.db.clone(), summaries(&state));
    Ok(Json(calendar.month_view(&user.id, year, month).await?))
}

async fn day_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayDetails>, AppError> {
    let calendar = CalendarService::new(state.db.clone(), summaries(&state));
    Ok(Json(calendar.day_details(&user.id, date).await?))
}

async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Dashboard>, AppError> {
    let service = DashboardService::new(state.db.clone(), summaries(&state));
    Ok(Json(service.dashboard(&user.id).await?))
}

async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<TaskQueryParams>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = RecordService::new(state.db.clone())
        .list_tasks(&user.id, params.completed, params.priority)
        .await?;
    Ok(Json(tasks))
}

async fn get_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(RecordService::new(state.db.clone()).get_task(&user.id, &id).await?))
}

async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = RecordService::new(state.db.clone()).create_task(&user.id, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let task = RecordService::new(state.db.clone())
        .update_task(&user.id, &id, req)
        .await?;
    Ok(Json(task))
}

async fn toggle_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = RecordService::new(state.db.clone()).toggle_task(&user.id, &id).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    RecordService::new(state.db.clone()).delete_task(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<EventQueryParams>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = RecordService::new(state.db.clone())
        .list_events(&user.id, params.date, params.category)
        .await?;
    Ok(Json(events))
}

async fn get_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(RecordService::new(state.db.clone()).get_event(&user.id, &id).await?))
}

async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = RecordService::new(state.db.clone()).create_event(&user.id, req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    let event = RecordService::new(state.db.clone())
        .update_event(&user.id, &id, req)
        .await?;
    Ok(Json(event))
}

async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    RecordService::new(state.db.clone()).delete_event(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_habits(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Habit>>, AppError> {
    Ok(Json(HabitService::new(state.db.clone()).list_habits(&user.id).await?))
}

async fn get_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Habit>, AppError> {
    Ok(Json(HabitService::new(state.db.clone()).get_habit(&user.id, &id).await?))
}

async fn create_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let habit = HabitService::new(state.db.clone()).create_habit(&user.id, req).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

async fn update_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateHabitRequest>,
) -> Result<Json<Habit>, AppError> {
    let habit = HabitService::new(state.db.clone())
        .update_habit(&user.id, &id, req)
        .await?;
    Ok(Json(habit))
}

async fn delete_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    HabitService::new(state.db.clone()).delete_habit(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn log_habit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<LogHabitRequest>,
) -> Result<Json<HabitLog>, AppError> {
    Ok(Json(HabitService::new(state.db.clone()).log_habit(&user.id, req).await?))
}

async fn habit_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<HabitHistory>, AppError> {
    let days = params.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let history = HabitService::new(state.db.clone())
        .habit_history(&user.id, &id, days)
        .await?;
    Ok(Json(history))
}
