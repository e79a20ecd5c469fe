#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use productivity_backend::db::{self, users};
use productivity_backend::error::AppError;
use productivity_backend::feed::FeedClient;
use productivity_backend::feed::dto::{Assignment, CalendarEvent, Course};
use productivity_backend::models::{AccountType, User};

pub const VALID_TOKEN: &str = "valid-token";

/// A single connection, otherwise every pooled connection opens its own empty memory database.
pub async fn setup_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

pub async fn student(db: &SqlitePool) -> User {
    users::insert_user(db, "alumno@tecsup.edu.pe", "Alumno", AccountType::Student)
        .await
        .expect("Failed to insert student")
}

pub async fn general_user(db: &SqlitePool) -> User {
    users::insert_user(db, "persona@example.com", "Persona", AccountType::General)
        .await
        .expect("Failed to insert general user")
}

pub fn course(id: &str, name: &str) -> Course {
    Course {
        id: id.to_string(),
        name: Some(name.to_string()),
    }
}

pub fn assignment(id: &str, name: &str, due_at: Option<&str>) -> Assignment {
    Assignment {
        id: id.to_string(),
        name: Some(name.to_string()),
        due_at: due_at.map(str::to_string),
        description: None,
    }
}

pub fn calendar_event(id: &str, title: &str, start_at: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        title: Some(title.to_string()),
        start_at: Some(start_at.to_string()),
        description: None,
    }
}

#[derive(Clone)]
pub struct FakeCourse {
    pub course: Course,
    pub assignments: Result<Vec<Assignment>, String>,
    pub events: Result<Vec<CalendarEvent>, String>,
}

impl FakeCourse {
    pub fn new(course: Course, assignments: Vec<Assignment>, events: Vec<CalendarEvent>) -> Self {
        Self {
            course,
            assignments: Ok(assignments),
            events: Ok(events),
        }
    }

    pub fn failing(course: Course) -> Self {
        Self {
            course,
            assignments: Err("500 Internal Server Error".to_string()),
            events: Err("500 Internal Server Error".to_string()),
        }
    }
}

/// Scripted upstream. Courses can be swapped between imports and
/// `fetch_courses` records how many imports overlap.
#[derive(Default)]
pub struct FakeFeed {
    courses: Mutex<Vec<FakeCourse>>,
    course_list_fails: AtomicBool,
    delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    validations: AtomicUsize,
}

impl FakeFeed {
    pub fn with_courses(courses: Vec<FakeCourse>) -> Self {
        let feed = Self::default();
        feed.set_courses(courses);
        feed
    }

    pub fn set_courses(&self, courses: Vec<FakeCourse>) {
        *self.courses.lock().unwrap() = courses;
    }

    pub fn fail_course_list(&self, fail: bool) {
        self.course_list_fails.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }

    fn find(&self, course_id: &str) -> Option<FakeCourse> {
        self.courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.course.id == course_id)
            .cloned()
    }
}

#[async_trait]
impl FeedClient for FakeFeed {
    async fn validate_token(&self, token: &str) -> bool {
        self.validations.fetch_add(1, Ordering::SeqCst);
        token == VALID_TOKEN
    }

    async fn fetch_courses(&self, _token: &str) -> Result<Vec<Course>, AppError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.course_list_fails.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamUnavailable("course list down".to_string()));
        }
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.course.clone())
            .collect())
    }

    async fn fetch_assignments(&self, _token: &str, course_id: &str) -> Result<Vec<Assignment>, AppError> {
        match self.find(course_id) {
            Some(c) => c.assignments.map_err(AppError::UpstreamUnavailable),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_calendar_events(&self, _token: &str, course_id: &str) -> Result<Vec<CalendarEvent>, AppError> {
        match self.find(course_id) {
            Some(c) => c.events.map_err(AppError::UpstreamUnavailable),
            None => Ok(Vec::new()),
        }
    }
}
