mod common;

use chrono::NaiveDate;
use sqlx::SqlitePool;

use common::*;
use productivity_backend::db::habits;
use productivity_backend::error::AppError;
use productivity_backend::models::{
    NewEventRequest, NewHabitRequest, NewTaskRequest, Task, UpdateHabitRequest,
};
use productivity_backend::services::{
    CalendarService, DashboardService, HabitService, RecordService, SummaryService,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn task_due(db: &SqlitePool, user_id: &str, title: &str, due: NaiveDate, done: bool) -> Task {
    let records = RecordService::new(db.clone());
    let task = records
        .create_task(
            user_id,
            NewTaskRequest {
                title: title.to_string(),
                description: None,
                priority: None,
                due_date: Some(due),
            },
        )
        .await
        .unwrap();
    if done {
        records.toggle_task(user_id, &task.id).await.unwrap()
    } else {
        task
    }
}

async fn habit_logged(db: &SqlitePool, user_id: &str, name: &str, date: NaiveDate, done: bool) {
    let habit = habits::insert_habit(
        db,
        user_id,
        &NewHabitRequest {
            name: name.to_string(),
            kind: "GENERAL".to_string(),
            is_meal: false,
            daily_goal: Some(1),
        },
    )
    .await
    .unwrap();
    habits::upsert_habit_log(db, &habit.id, date, done, Some(if done { 1 } else { 0 }))
        .await
        .unwrap();
}

#[tokio::test]
async fn computes_mixed_task_and_habit_progress() {
    let db = setup_db().await;
    let user = student(&db).await;
    let date = day(2025, 3, 10);

    for (i, done) in [true, true, true, false].into_iter().enumerate() {
        task_due(&db, &user.id, &format!("Tarea {}", i), date, done).await;
    }
    habit_logged(&db, &user.id, "Leer", date, true).await;
    habit_logged(&db, &user.id, "Correr", date, false).await;
    // due on another day, must not count
    task_due(&db, &user.id, "Otra", day(2025, 3, 11), true).await;

    let summaries = SummaryService::new(db.clone()).with_today(date);
    let summary = summaries.get_or_compute(&user.id, date).await.unwrap();

    assert_eq!(summary.total(), 6);
    assert_eq!(summary.completed(), 4);
    assert_eq!(summary.total_tasks, 4);
    assert_eq!(summary.completed_habits, 1);
    assert_eq!(summary.progress_percentage, 67);
    assert!(!summary.is_snapshot());
}

#[tokio::test]
async fn empty_day_has_zero_progress() {
    let db = setup_db().await;
    let user = student(&db).await;
    let summaries = SummaryService::new(db.clone()).with_today(day(2025, 3, 10));

    let summary = summaries.get_or_compute(&user.id, day(2025, 3, 1)).await.unwrap();
    assert_eq!(summary.total(), 0);
    assert_eq!(summary.progress_percentage, 0);

    let stored = summaries.snapshot(&user.id, day(2025, 3, 1)).await.unwrap();
    assert_eq!(stored.progress_percentage, 0);
}

#[tokio::test]
async fn inactive_habits_are_not_counted() {
    let db = setup_db().await;
    let user = student(&db).await;
    let date = day(2025, 3, 10);

    habit_logged(&db, &user.id, "Leer", date, true).await;
    let paused = habits::insert_habit(
        &db,
        &user.id,
        &NewHabitRequest {
            name: "Meditar".to_string(),
            kind: "GENERAL".to_string(),
            is_meal: false,
            daily_goal: Some(1),
        },
    )
    .await
    .unwrap();
    habits::upsert_habit_log(&db, &paused.id, date, true, Some(1)).await.unwrap();
    HabitService::new(db.clone())
        .update_habit(
            &user.id,
            &paused.id,
            UpdateHabitRequest {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let summary = SummaryService::new(db.clone())
        .with_today(date)
        .compute(&user.id, date)
        .await
        .unwrap();

    assert_eq!(summary.total_habits, 1);
    assert_eq!(summary.completed_habits, 1);
    assert_eq!(summary.progress_percentage, 100);
}

#[tokio::test]
async fn past_snapshot_is_never_rewritten() {
    let db = setup_db().await;
    let user = student(&db).await;
    let past = day(2025, 3, 10);
    let summaries = SummaryService::new(db.clone()).with_today(day(2025, 3, 11));

    task_due(&db, &user.id, "Hecha", past, true).await;
    let pending = task_due(&db, &user.id, "Pendiente", past, false).await;

    let first = summaries.snapshot(&user.id, past).await.unwrap();
    assert_eq!(first.progress_percentage, 50);
    assert!(first.is_snapshot());

    RecordService::new(db.clone())
        .toggle_task(&user.id, &pending.id)
        .await
        .unwrap();

    let second = summaries.snapshot(&user.id, past).await.unwrap();
    assert_eq!(second, first);
    let read = summaries.get_or_compute(&user.id, past).await.unwrap();
    assert_eq!(read, first);

    // a live recount does see the change
    let live = summaries.compute(&user.id, past).await.unwrap();
    assert_eq!(live.progress_percentage, 100);
}

#[tokio::test]
async fn today_is_always_recomputed() {
    let db = setup_db().await;
    let user = student(&db).await;
    let today = day(2025, 3, 10);
    let summaries = SummaryService::new(db.clone()).with_today(today);

    task_due(&db, &user.id, "Hecha", today, true).await;
    let pending = task_due(&db, &user.id, "Pendiente", today, false).await;
    assert_eq!(summaries.get_or_compute(&user.id, today).await.unwrap().progress_percentage, 50);

    RecordService::new(db.clone())
        .toggle_task(&user.id, &pending.id)
        .await
        .unwrap();

    let summary = summaries.get_or_compute(&user.id, today).await.unwrap();
    assert_eq!(summary.progress_percentage, 100);
    assert!(!summary.is_snapshot());
}

#[tokio::test]
async fn unfinished_days_cannot_be_snapshotted() {
    let db = setup_db().await;
    let user = student(&db).await;
    let today = day(2025, 3, 10);
    let summaries = SummaryService::new(db.clone()).with_today(today);
    let pending = task_due(&db, &user.id, "Pendiente", today, false).await;

    for date in [today, day(2025, 3, 11)] {
        let err = summaries.snapshot(&user.id, date).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
    let err = summaries.snapshot_all_users(today).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // the day finishes with the task done; tomorrow's snapshot sees the final state
    RecordService::new(db.clone())
        .toggle_task(&user.id, &pending.id)
        .await
        .unwrap();
    let tomorrow = SummaryService::new(db.clone()).with_today(day(2025, 3, 11));
    assert_eq!(tomorrow.snapshot_all_users(today).await.unwrap(), 1);
    let stored = tomorrow.get_or_compute(&user.id, today).await.unwrap();
    assert!(stored.is_snapshot());
    assert_eq!(stored.progress_percentage, 100);
}

#[tokio::test]
async fn snapshot_all_users_writes_each_user_once() {
    let db = setup_db().await;
    let a = student(&db).await;
    let b = general_user(&db).await;
    let date = day(2025, 3, 10);
    task_due(&db, &a.id, "Tarea", date, true).await;

    let summaries = SummaryService::new(db.clone()).with_today(day(2025, 3, 11));
    assert_eq!(summaries.snapshot_all_users(date).await.unwrap(), 2);
    assert_eq!(summaries.snapshot_all_users(date).await.unwrap(), 0);

    let stored = summaries.get_or_compute(&a.id, date).await.unwrap();
    assert!(stored.is_snapshot());
    assert_eq!(stored.progress_percentage, 100);
    let other = summaries.get_or_compute(&b.id, date).await.unwrap();
    assert_eq!(other.total(), 0);
}

#[tokio::test]
async fn recent_and_clean_summaries() {
    let db = setup_db().await;
    let user = student(&db).await;
    let summaries = SummaryService::new(db.clone()).with_today(day(2025, 3, 15));

    for date in [day(2025, 1, 1), day(2025, 3, 1), day(2025, 3, 10)] {
        summaries.snapshot(&user.id, date).await.unwrap();
    }

    let recent = summaries.recent_summaries(&user.id, 2).await.unwrap();
    let dates: Vec<_> = recent.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![day(2025, 3, 10), day(2025, 3, 1)]);

    assert_eq!(summaries.clean_old_summaries(30).await.unwrap(), 1);
    assert_eq!(summaries.recent_summaries(&user.id, 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn month_view_marks_activity_and_progress() {
    let db = setup_db().await;
    let user = student(&db).await;
    let summaries = SummaryService::new(db.clone()).with_today(day(2025, 3, 15));

    task_due(&db, &user.id, "Entrega", day(2025, 3, 10), true).await;
    RecordService::new(db.clone())
        .create_event(
            &user.id,
            NewEventRequest {
                title: "Cumpleaños".to_string(),
                date: day(2025, 3, 20),
                time: None,
                category: None,
                description: None,
                course_name: None,
            },
        )
        .await
        .unwrap();
    summaries.snapshot(&user.id, day(2025, 3, 5)).await.unwrap();

    let view = summaries.monthly_view(&user.id, 2025, 3).await.unwrap();

    assert_eq!(view.days.len(), 31);
    let tenth = &view.days[&day(2025, 3, 10)];
    assert!(tenth.has_activity && tenth.is_past);
    assert_eq!(tenth.task_count, 1);
    assert_eq!(tenth.progress, Some(100));

    assert_eq!(view.days[&day(2025, 3, 5)].progress, Some(0));
    assert_eq!(view.days[&day(2025, 3, 1)].progress, None);

    let today = &view.days[&day(2025, 3, 15)];
    assert!(today.is_today);
    assert_eq!(today.progress, Some(0));

    let future = &view.days[&day(2025, 3, 20)];
    assert!(future.has_activity);
    assert_eq!(future.event_count, 1);
    assert_eq!(future.progress, None);

    let err = summaries.monthly_view(&user.id, 2025, 13).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn day_details_and_dashboard() {
    let db = setup_db().await;
    let user = student(&db).await;
    let today = day(2025, 3, 10);
    let summaries = SummaryService::new(db.clone()).with_today(today);

    task_due(&db, &user.id, "Hoy", today, false).await;
    task_due(&db, &user.id, "Ayer", day(2025, 3, 9), false).await;
    task_due(&db, &user.id, "Lista", day(2025, 3, 12), true).await;
    habit_logged(&db, &user.id, "Leer", today, true).await;

    let details = CalendarService::new(db.clone(), summaries.clone())
        .day_details(&user.id, today)
        .await
        .unwrap();
    assert_eq!(details.tasks.len(), 1);
    assert_eq!(details.habits.len(), 1);
    assert_eq!(details.habits[0].progress, 100);
    assert_eq!(details.summary.progress_percentage, 50);

    let dashboard = DashboardService::new(db.clone(), summaries)
        .dashboard(&user.id)
        .await
        .unwrap();
    let pending: Vec<_> = dashboard.pending_tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(pending, vec!["Hoy"]);
    assert_eq!(dashboard.summary_today.progress_percentage, 50);
    assert!(dashboard.events_today.is_empty());
}
