mod common;

use chrono::NaiveDate;
use sqlx::SqlitePool;

use common::*;
use productivity_backend::db::repository;
use productivity_backend::error::AppError;
use productivity_backend::models::{
    Event, EventCategory, LogHabitRequest, NewEvent, NewEventRequest, NewHabitRequest, NewTask,
    NewTaskRequest, Priority, RecordSource, Task, UpdateEventRequest, UpdateHabitRequest,
    UpdateTaskRequest,
};
use productivity_backend::services::{HabitService, RecordService};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

async fn imported_task(db: &SqlitePool, user_id: &str) -> Task {
    repository::insert_task(
        db,
        user_id,
        &NewTask {
            title: "Laboratorio 3".to_string(),
            description: Some("Subir informe".to_string()),
            priority: Priority::Medium,
            due_date: Some(day(10)),
            source: RecordSource::tecsup("a1"),
        },
    )
    .await
    .unwrap()
}

async fn imported_event(db: &SqlitePool, user_id: &str) -> Event {
    repository::insert_event(
        db,
        user_id,
        &NewEvent {
            title: "Examen parcial".to_string(),
            date: day(12),
            time: None,
            category: EventCategory::Exam,
            description: None,
            course_name: Some("Redes".to_string()),
            source: RecordSource::tecsup("e1"),
        },
    )
    .await
    .unwrap()
}

fn new_task(title: &str) -> NewTaskRequest {
    NewTaskRequest {
        title: title.to_string(),
        description: None,
        priority: None,
        due_date: Some(day(10)),
    }
}

#[tokio::test]
async fn user_tasks_are_fully_editable() {
    let db = setup_db().await;
    let user = student(&db).await;
    let records = RecordService::new(db.clone());

    let task = records.create_task(&user.id, new_task("  Estudiar  ")).await.unwrap();
    assert_eq!(task.title, "Estudiar");
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.source, RecordSource::User);

    let updated = records
        .update_task(
            &user.id,
            &task.id,
            UpdateTaskRequest {
                title: Some("Estudiar cálculo".to_string()),
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Estudiar cálculo");
    assert_eq!(updated.priority, Priority::High);

    records.delete_task(&user.id, &task.id).await.unwrap();
    let err = records.get_task(&user.id, &task.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let db = setup_db().await;
    let user = student(&db).await;

    let err = RecordService::new(db.clone())
        .create_task(&user.id, new_task("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn imported_task_content_is_protected() {
    let db = setup_db().await;
    let user = student(&db).await;
    let task = imported_task(&db, &user.id).await;
    let records = RecordService::new(db.clone());

    let err = records
        .update_task(
            &user.id,
            &task.id,
            UpdateTaskRequest {
                title: Some("Renombrada".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ProtectedRecord(_)));

    let err = records.delete_task(&user.id, &task.id).await.unwrap_err();
    assert!(matches!(err, AppError::ProtectedRecord(_)));

    let stored = records.get_task(&user.id, &task.id).await.unwrap();
    assert_eq!(stored.title, "Laboratorio 3");
}

#[tokio::test]
async fn imported_task_completion_and_priority_are_local() {
    let db = setup_db().await;
    let user = student(&db).await;
    let task = imported_task(&db, &user.id).await;
    let records = RecordService::new(db.clone());

    let toggled = records.toggle_task(&user.id, &task.id).await.unwrap();
    assert!(toggled.completed);

    let updated = records
        .update_task(
            &user.id,
            &task.id,
            UpdateTaskRequest {
                priority: Some(Priority::High),
                completed: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.completed);
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.source.external_id(), Some("a1"));
}

#[tokio::test]
async fn imported_events_are_read_only() {
    let db = setup_db().await;
    let user = student(&db).await;
    let event = imported_event(&db, &user.id).await;
    let records = RecordService::new(db.clone());

    let err = records
        .update_event(
            &user.id,
            &event.id,
            UpdateEventRequest {
                category: Some(EventCategory::Personal),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ProtectedRecord(_)));

    let err = records.delete_event(&user.id, &event.id).await.unwrap_err();
    assert!(matches!(err, AppError::ProtectedRecord(_)));
}

#[tokio::test]
async fn user_events_default_to_personal_and_filter_by_date() {
    let db = setup_db().await;
    let user = student(&db).await;
    let records = RecordService::new(db.clone());
    imported_event(&db, &user.id).await;

    let own = records
        .create_event(
            &user.id,
            NewEventRequest {
                title: "Cena familiar".to_string(),
                date: day(12),
                time: None,
                category: None,
                description: None,
                course_name: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(own.category, EventCategory::Personal);

    let on_day = records.list_events(&user.id, Some(day(12)), None).await.unwrap();
    assert_eq!(on_day.len(), 2);
    let exams = records
        .list_events(&user.id, None, Some(EventCategory::Exam))
        .await
        .unwrap();
    assert_eq!(exams.len(), 1);

    let moved = records
        .update_event(
            &user.id,
            &own.id,
            UpdateEventRequest {
                date: Some(day(13)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.date, day(13));
}

#[tokio::test]
async fn records_of_other_users_are_forbidden() {
    let db = setup_db().await;
    let owner = student(&db).await;
    let other = general_user(&db).await;
    let records = RecordService::new(db.clone());

    let task = records.create_task(&owner.id, new_task("Privada")).await.unwrap();

    let err = records.get_task(&other.id, &task.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let err = records.toggle_task(&other.id, &task.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let err = records.delete_task(&other.id, &task.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn task_filters() {
    let db = setup_db().await;
    let user = student(&db).await;
    let records = RecordService::new(db.clone());

    let done = records.create_task(&user.id, new_task("Hecha")).await.unwrap();
    records.toggle_task(&user.id, &done.id).await.unwrap();
    records
        .create_task(
            &user.id,
            NewTaskRequest {
                priority: Some(Priority::High),
                ..new_task("Urgente")
            },
        )
        .await
        .unwrap();
    records.create_task(&user.id, new_task("Normal")).await.unwrap();

    let open = records.list_tasks(&user.id, Some(false), None).await.unwrap();
    let titles: Vec<_> = open.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Urgente", "Normal"]);

    let high = records
        .list_tasks(&user.id, None, Some(Priority::High))
        .await
        .unwrap();
    assert_eq!(high.len(), 1);
}

fn water_habit() -> NewHabitRequest {
    NewHabitRequest {
        name: " Agua ".to_string(),
        kind: "HYDRATION".to_string(),
        is_meal: false,
        daily_goal: Some(8),
    }
}

#[tokio::test]
async fn habit_lifecycle() {
    let db = setup_db().await;
    let user = student(&db).await;
    let service = HabitService::new(db.clone());

    let habit = service.create_habit(&user.id, water_habit()).await.unwrap();
    assert_eq!(habit.name, "Agua");
    assert!(habit.active);

    let paused = service
        .update_habit(
            &user.id,
            &habit.id,
            UpdateHabitRequest {
                daily_goal: Some(6),
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paused.daily_goal, Some(6));
    assert!(!paused.active);

    // paused habits are still listed
    let listed = service.list_habits(&user.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].active);

    service.delete_habit(&user.id, &habit.id).await.unwrap();
    let err = service.get_habit(&user.id, &habit.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn habit_validation() {
    let db = setup_db().await;
    let user = student(&db).await;
    let service = HabitService::new(db.clone());

    let err = service
        .create_habit(
            &user.id,
            NewHabitRequest {
                name: "  ".to_string(),
                ..water_habit()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = service
        .create_habit(
            &user.id,
            NewHabitRequest {
                daily_goal: Some(-1),
                ..water_habit()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn logging_a_day_twice_overwrites_it() {
    let db = setup_db().await;
    let user = student(&db).await;
    let service = HabitService::new(db.clone()).with_today(day(12));
    let habit = service.create_habit(&user.id, water_habit()).await.unwrap();

    let log = |date, completed, value| LogHabitRequest {
        habit_id: habit.id.clone(),
        date,
        completed,
        value,
    };

    service.log_habit(&user.id, log(day(10), false, Some(3))).await.unwrap();
    let second = service.log_habit(&user.id, log(day(10), true, Some(8))).await.unwrap();
    assert!(second.completed);
    assert_eq!(second.value, Some(8));
    service.log_habit(&user.id, log(day(12), false, Some(2))).await.unwrap();
    service.log_habit(&user.id, log(day(1), true, Some(8))).await.unwrap();

    let history = service.habit_history(&user.id, &habit.id, 3).await.unwrap();
    let dates: Vec<_> = history.logs.iter().map(|l| l.date).collect();
    assert_eq!(dates, vec![day(10), day(12)]);
    assert!(history.logs[0].completed);

    let err = service.habit_history(&user.id, &habit.id, 0).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    let err = service
        .log_habit(&user.id, log(day(11), true, Some(-2)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn habits_of_other_users_are_forbidden() {
    let db = setup_db().await;
    let owner = student(&db).await;
    let other = general_user(&db).await;
    let service = HabitService::new(db.clone());
    let habit = service.create_habit(&owner.id, water_habit()).await.unwrap();

    let err = service
        .log_habit(
            &other.id,
            LogHabitRequest {
                habit_id: habit.id.clone(),
                date: day(10),
                completed: true,
                value: Some(8),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let err = service.delete_habit(&other.id, &habit.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}
